// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quick State cell queries. Expiry is compared in Unix milliseconds.

use chrono::{DateTime, Utc};
use concierge_core::{ConciergeError, Scope};
use rusqlite::{OptionalExtension, params};

use super::decode_json;
use crate::database::{Database, map_tr_err};

/// Reads a live cell. An expired cell is deleted and reads as absent.
pub async fn get_cell(
    db: &Database,
    scope: &Scope,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<serde_json::Value>, ConciergeError> {
    let channel = scope.channel.0.clone();
    let user = scope.user.0.clone();
    let key = key.to_string();
    let now = now.timestamp_millis();
    db.connection()
        .call(move |conn| {
            let cell: Option<(String, i64)> = conn
                .query_row(
                    "SELECT value, expires_at FROM quick_state
                     WHERE channel_id = ?1 AND user_id = ?2 AND key = ?3",
                    params![channel, user, key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match cell {
                Some((value, expires_at)) if expires_at > now => decode_json(0, &value).map(Some),
                Some(_) => {
                    conn.execute(
                        "DELETE FROM quick_state WHERE channel_id = ?1 AND user_id = ?2 AND key = ?3",
                        params![channel, user, key],
                    )?;
                    Ok(None)
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_cell(
    db: &Database,
    scope: &Scope,
    key: &str,
    value: &serde_json::Value,
    expires_at: DateTime<Utc>,
) -> Result<(), ConciergeError> {
    let channel = scope.channel.0.clone();
    let user = scope.user.0.clone();
    let key = key.to_string();
    let value = serde_json::to_string(value)?;
    let expires_at = expires_at.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO quick_state (channel_id, user_id, key, value, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (channel_id, user_id, key)
                 DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![channel, user, key, value, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_cell(db: &Database, scope: &Scope, key: &str) -> Result<(), ConciergeError> {
    let channel = scope.channel.0.clone();
    let user = scope.user.0.clone();
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM quick_state WHERE channel_id = ?1 AND user_id = ?2 AND key = ?3",
                params![channel, user, key],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Drops every cell expired at `now`. Returns the number removed.
pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> Result<usize, ConciergeError> {
    let now = now.timestamp_millis();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM quick_state WHERE expires_at <= ?1", params![now])
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::temp_db;
    use chrono::Duration;
    use serde_json::json;

    fn scope() -> Scope {
        Scope::new("line-main", "U1")
    }

    #[tokio::test]
    async fn cell_is_readable_until_it_expires() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        let expires = now + Duration::seconds(300);
        set_cell(&db, &scope(), "pending_intent", &json!({"intent": "deposit"}), expires)
            .await
            .unwrap();

        let live = get_cell(&db, &scope(), "pending_intent", now).await.unwrap();
        assert_eq!(live, Some(json!({"intent": "deposit"})));

        let at_expiry = get_cell(&db, &scope(), "pending_intent", expires).await.unwrap();
        assert!(at_expiry.is_none());
        // The expired read also removed the row.
        assert!(get_cell(&db, &scope(), "pending_intent", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites_value_and_expiry() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        set_cell(&db, &scope(), "last_order", &json!("A"), now + Duration::seconds(1))
            .await
            .unwrap();
        set_cell(&db, &scope(), "last_order", &json!("B"), now + Duration::hours(1))
            .await
            .unwrap();

        let later = now + Duration::minutes(10);
        assert_eq!(
            get_cell(&db, &scope(), "last_order", later).await.unwrap(),
            Some(json!("B"))
        );
    }

    #[tokio::test]
    async fn delete_and_purge() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        let other = Scope::new("line-main", "U2");
        set_cell(&db, &scope(), "a", &json!(1), now + Duration::seconds(5)).await.unwrap();
        set_cell(&db, &scope(), "b", &json!(2), now - Duration::seconds(5)).await.unwrap();
        set_cell(&db, &other, "a", &json!(3), now + Duration::seconds(5)).await.unwrap();

        delete_cell(&db, &scope(), "a").await.unwrap();
        assert!(get_cell(&db, &scope(), "a", now).await.unwrap().is_none());
        assert_eq!(get_cell(&db, &other, "a", now).await.unwrap(), Some(json!(3)));

        assert_eq!(purge_expired(&db, now).await.unwrap(), 1);
    }
}
