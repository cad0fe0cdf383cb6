// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session queries.

use chrono::{DateTime, Utc};
use concierge_core::{CaseType, ConciergeError, Platform, Scope, Session};
use rusqlite::{Row, params};

use super::{decode_enum, decode_opt_time, decode_time, encode_time};
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, channel_id, user_id, platform, active_case_id, active_case_type,
     last_admin_message_at, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let active_case_type: Option<String> = row.get(5)?;
    Ok(Session {
        id: row.get(0)?,
        scope: Scope::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
        platform: decode_enum::<Platform>(3, &row.get::<_, String>(3)?)?,
        active_case_id: row.get(4)?,
        active_case_type: active_case_type
            .map(|t| decode_enum::<CaseType>(5, &t))
            .transpose()?,
        last_admin_message_at: decode_opt_time(6, row.get(6)?)?,
        created_at: decode_time(7, &row.get::<_, String>(7)?)?,
        updated_at: decode_time(8, &row.get::<_, String>(8)?)?,
    })
}

/// Touches the session for `scope`, inserting a new one on first contact.
pub async fn get_or_create(
    db: &Database,
    scope: &Scope,
    platform: Platform,
    now: DateTime<Utc>,
) -> Result<Session, ConciergeError> {
    let channel = scope.channel.0.clone();
    let user = scope.user.0.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let platform = platform.to_string();
    let now = encode_time(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let touched = tx.execute(
                "UPDATE sessions SET updated_at = ?3 WHERE channel_id = ?1 AND user_id = ?2",
                params![channel, user, now],
            )?;
            if touched == 0 {
                tx.execute(
                    "INSERT INTO sessions (id, channel_id, user_id, platform, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![id, channel, user, platform, now],
                )?;
            }
            let session = tx.query_row(
                &format!("SELECT {COLUMNS} FROM sessions WHERE channel_id = ?1 AND user_id = ?2"),
                params![channel, user],
                from_row,
            )?;
            tx.commit()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn record_admin_message(
    db: &Database,
    id: &str,
    at: DateTime<Utc>,
) -> Result<(), ConciergeError> {
    let id = id.to_string();
    let at = encode_time(at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET last_admin_message_at = ?2, updated_at = ?2 WHERE id = ?1",
                params![id, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_active_case(
    db: &Database,
    id: &str,
    case_id: &str,
    case_type: CaseType,
    now: DateTime<Utc>,
) -> Result<(), ConciergeError> {
    let id = id.to_string();
    let case_id = case_id.to_string();
    let case_type = case_type.to_string();
    let now = encode_time(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET active_case_id = ?2, active_case_type = ?3, updated_at = ?4
                 WHERE id = ?1",
                params![id, case_id, case_type, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::temp_db;
    use chrono::Duration;
    use rusqlite::OptionalExtension;

    async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, ConciergeError> {
        let id = id.to_string();
        db.connection()
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {COLUMNS} FROM sessions WHERE id = ?1"),
                    params![id],
                    from_row,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    fn scope() -> Scope {
        Scope::new("line-main", "U100")
    }

    #[tokio::test]
    async fn first_contact_creates_then_reuses() {
        let (_dir, db) = temp_db().await;
        let t0 = Utc::now();
        let first = get_or_create(&db, &scope(), Platform::Line, t0).await.unwrap();
        assert_eq!(first.scope, scope());
        assert_eq!(first.platform, Platform::Line);
        assert!(first.active_case_id.is_none());

        let later = t0 + Duration::minutes(5);
        let second = get_or_create(&db, &scope(), Platform::Facebook, later).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.platform, Platform::Line);
        assert_eq!(encode_time(second.updated_at), encode_time(later));
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        let a = get_or_create(&db, &scope(), Platform::Line, now).await.unwrap();
        let b = get_or_create(&db, &Scope::new("line-main", "U200"), Platform::Line, now)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn admin_message_and_active_case_are_recorded() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        let session = get_or_create(&db, &scope(), Platform::Web, now).await.unwrap();

        record_admin_message(&db, &session.id, now).await.unwrap();
        set_active_case(&db, &session.id, "case-1", CaseType::Pawn, now)
            .await
            .unwrap();

        let stored = get_session(&db, &session.id).await.unwrap().unwrap();
        assert_eq!(
            stored.last_admin_message_at.map(encode_time),
            Some(encode_time(now))
        );
        assert_eq!(stored.active_case_id.as_deref(), Some("case-1"));
        assert_eq!(stored.active_case_type, Some(CaseType::Pawn));
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let (_dir, db) = temp_db().await;
        assert!(get_session(&db, "nope").await.unwrap().is_none());
    }
}
