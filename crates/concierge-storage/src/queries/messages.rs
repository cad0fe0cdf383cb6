// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation log queries.

use concierge_core::{ChatMessage, ConciergeError, MessageRole};
use rusqlite::params;

use super::{decode_enum, decode_time, encode_time};
use crate::database::{Database, map_tr_err};

pub async fn insert_message(
    db: &Database,
    session_id: &str,
    message: &ChatMessage,
) -> Result<(), ConciergeError> {
    let session_id = session_id.to_string();
    let role = message.role.to_string();
    let content = message.text.clone();
    let at = encode_time(message.at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (session_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, role, content, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The latest `limit` messages of a session, oldest first.
pub async fn recent_messages(
    db: &Database,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>, ConciergeError> {
    let session_id = session_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT role, content, created_at FROM (
                     SELECT seq, role, content, created_at FROM messages
                     WHERE session_id = ?1 ORDER BY seq DESC LIMIT ?2
                 ) ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![session_id, limit], |row| {
                Ok(ChatMessage {
                    role: decode_enum::<MessageRole>(0, &row.get::<_, String>(0)?)?,
                    text: row.get(1)?,
                    at: decode_time(2, &row.get::<_, String>(2)?)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::get_or_create;
    use crate::queries::test_support::temp_db;
    use chrono::{Duration, Utc};
    use concierge_core::{Platform, Scope};

    #[tokio::test]
    async fn recent_messages_keeps_the_tail_in_order() {
        let (_dir, db) = temp_db().await;
        let t0 = Utc::now();
        let session = get_or_create(&db, &Scope::new("c", "u"), Platform::Line, t0)
            .await
            .unwrap();

        for (i, role) in [MessageRole::User, MessageRole::Bot, MessageRole::User, MessageRole::Admin]
            .into_iter()
            .enumerate()
        {
            let message = ChatMessage {
                role,
                text: format!("m{i}"),
                at: t0 + Duration::seconds(i as i64),
            };
            insert_message(&db, &session.id, &message).await.unwrap();
        }

        let tail = recent_messages(&db, &session.id, 3).await.unwrap();
        let texts: Vec<_> = tail.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m1", "m2", "m3"]);
        assert_eq!(tail[2].role, MessageRole::Admin);

        assert!(recent_messages(&db, &session.id, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn messages_need_an_existing_session() {
        let (_dir, db) = temp_db().await;
        let message = ChatMessage {
            role: MessageRole::User,
            text: "hello".into(),
            at: Utc::now(),
        };
        assert!(insert_message(&db, "ghost", &message).await.is_err());
    }
}
