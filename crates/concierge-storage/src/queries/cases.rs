// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case and activity log queries.

use concierge_core::{
    ActivityType, ActorType, Case, CaseActivity, CasePriority, CaseStatus, CaseType,
    ConciergeError, Platform, Scope, SlotBag,
};
use rusqlite::{OptionalExtension, Row, params};
use serde_json::Value;

use super::{decode_enum, decode_json, decode_time, encode_time};
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, case_no, case_type, channel_id, user_id, platform, session_id,
     subject, slots, status, priority, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    let slots = match decode_json(8, &row.get::<_, String>(8)?)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => SlotBag::new(),
    };
    Ok(Case {
        id: row.get(0)?,
        case_no: row.get(1)?,
        case_type: decode_enum::<CaseType>(2, &row.get::<_, String>(2)?)?,
        scope: Scope::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
        platform: decode_enum::<Platform>(5, &row.get::<_, String>(5)?)?,
        session_id: row.get(6)?,
        subject: row.get(7)?,
        slots,
        status: decode_enum::<CaseStatus>(9, &row.get::<_, String>(9)?)?,
        priority: decode_enum::<CasePriority>(10, &row.get::<_, String>(10)?)?,
        created_at: decode_time(11, &row.get::<_, String>(11)?)?,
        updated_at: decode_time(12, &row.get::<_, String>(12)?)?,
    })
}

/// Newest non-terminal case of `case_type` for the scope.
pub async fn find_open(
    db: &Database,
    scope: &Scope,
    case_type: CaseType,
) -> Result<Option<Case>, ConciergeError> {
    let channel = scope.channel.0.clone();
    let user = scope.user.0.clone();
    let case_type = case_type.to_string();
    let resolved = CaseStatus::Resolved.to_string();
    let cancelled = CaseStatus::Cancelled.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM cases
                     WHERE channel_id = ?1 AND user_id = ?2 AND case_type = ?3
                       AND status NOT IN (?4, ?5)
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![channel, user, case_type, resolved, cancelled],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_case(db: &Database, id: &str) -> Result<Option<Case>, ConciergeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM cases WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_case(db: &Database, case: &Case) -> Result<(), ConciergeError> {
    let slots = serde_json::to_string(&case.slots)?;
    let case = case.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO cases (id, case_no, case_type, channel_id, user_id, platform,
                     session_id, subject, slots, status, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    case.id,
                    case.case_no,
                    case.case_type.to_string(),
                    case.scope.channel.0,
                    case.scope.user.0,
                    case.platform.to_string(),
                    case.session_id,
                    case.subject,
                    slots,
                    case.status.to_string(),
                    case.priority.to_string(),
                    encode_time(case.created_at),
                    encode_time(case.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrites the mutable fields of an existing case.
pub async fn update_case(db: &Database, case: &Case) -> Result<(), ConciergeError> {
    let slots = serde_json::to_string(&case.slots)?;
    let id = case.id.clone();
    let session_id = case.session_id.clone();
    let subject = case.subject.clone();
    let status = case.status.to_string();
    let priority = case.priority.to_string();
    let updated_at = encode_time(case.updated_at);
    let changed = db
        .connection()
        .call({
            let id = id.clone();
            move |conn| {
                conn.execute(
                    "UPDATE cases SET session_id = ?2, subject = ?3, slots = ?4, status = ?5,
                         priority = ?6, updated_at = ?7
                     WHERE id = ?1",
                    params![id, session_id, subject, slots, status, priority, updated_at],
                )
            }
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(ConciergeError::Internal(format!("case {id} not found")));
    }
    Ok(())
}

pub async fn insert_activity(db: &Database, activity: &CaseActivity) -> Result<(), ConciergeError> {
    let old_value = activity.old_value.as_ref().map(serde_json::to_string).transpose()?;
    let new_value = activity.new_value.as_ref().map(serde_json::to_string).transpose()?;
    let activity = activity.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO case_activities (case_id, activity_type, old_value, new_value,
                     actor_type, actor_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    activity.case_id,
                    activity.activity_type.to_string(),
                    old_value,
                    new_value,
                    activity.actor_type.to_string(),
                    activity.actor_id,
                    encode_time(activity.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Activity log of one case in insertion order.
pub async fn activities_for(
    db: &Database,
    case_id: &str,
) -> Result<Vec<CaseActivity>, ConciergeError> {
    let case_id = case_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT case_id, activity_type, old_value, new_value, actor_type, actor_id, created_at
                 FROM case_activities WHERE case_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![case_id], |row| {
                let old_value: Option<String> = row.get(2)?;
                let new_value: Option<String> = row.get(3)?;
                Ok(CaseActivity {
                    case_id: row.get(0)?,
                    activity_type: decode_enum::<ActivityType>(1, &row.get::<_, String>(1)?)?,
                    old_value: old_value.map(|v| decode_json(2, &v)).transpose()?,
                    new_value: new_value.map(|v| decode_json(3, &v)).transpose()?,
                    actor_type: decode_enum::<ActorType>(4, &row.get::<_, String>(4)?)?,
                    actor_id: row.get(5)?,
                    created_at: decode_time(6, &row.get::<_, String>(6)?)?,
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
    use crate::queries::test_support::temp_db;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn case(id: &str, case_type: CaseType, created_at: chrono::DateTime<Utc>) -> Case {
        let mut slots = SlotBag::new();
        slots.insert("product_code", "RLX-0012");
        Case {
            id: id.into(),
            case_no: format!("CASE-20260309-{id}"),
            case_type,
            scope: Scope::new("line-main", "U1"),
            platform: Platform::Line,
            session_id: Some("s1".into()),
            subject: case_type.subject().into(),
            slots,
            status: CaseStatus::Open,
            priority: CasePriority::Normal,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn insert_then_get_preserves_fields() {
        let (_dir, db) = temp_db().await;
        let created = case("A1", CaseType::ProductInquiry, Utc::now());
        insert_case(&db, &created).await.unwrap();

        let stored = get_case(&db, "A1").await.unwrap().unwrap();
        assert_eq!(stored.case_no, created.case_no);
        assert_eq!(stored.case_type, CaseType::ProductInquiry);
        assert_eq!(stored.scope, created.scope);
        assert_eq!(stored.slots.get("product_code"), Some(&json!("RLX-0012")));
        assert_eq!(stored.status, CaseStatus::Open);
    }

    #[tokio::test]
    async fn find_open_picks_the_newest_live_case() {
        let (_dir, db) = temp_db().await;
        let t0 = Utc::now();
        insert_case(&db, &case("old", CaseType::Pawn, t0)).await.unwrap();
        insert_case(&db, &case("new", CaseType::Pawn, t0 + Duration::minutes(1)))
            .await
            .unwrap();
        insert_case(&db, &case("other", CaseType::Repair, t0 + Duration::minutes(2)))
            .await
            .unwrap();

        let open = find_open(&db, &Scope::new("line-main", "U1"), CaseType::Pawn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.id, "new");

        let mut closed = open.clone();
        closed.status = CaseStatus::Resolved;
        update_case(&db, &closed).await.unwrap();
        let open = find_open(&db, &Scope::new("line-main", "U1"), CaseType::Pawn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.id, "old");

        assert!(find_open(&db, &Scope::new("line-main", "U2"), CaseType::Pawn)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_of_unknown_case_fails() {
        let (_dir, db) = temp_db().await;
        let ghost = case("ghost", CaseType::Repair, Utc::now());
        let err = update_case(&db, &ghost).await.unwrap_err();
        assert!(matches!(err, ConciergeError::Internal(_)));
    }

    #[tokio::test]
    async fn activities_are_kept_in_order() {
        let (_dir, db) = temp_db().await;
        let now = Utc::now();
        insert_case(&db, &case("A1", CaseType::PaymentFull, now)).await.unwrap();

        for (activity_type, new_value) in [
            (ActivityType::Created, Some(json!({"status": "open"}))),
            (ActivityType::StatusChanged, Some(json!("pending_admin"))),
            (ActivityType::HandoffTriggered, None),
        ] {
            insert_activity(
                &db,
                &CaseActivity {
                    case_id: "A1".into(),
                    activity_type,
                    old_value: None,
                    new_value,
                    actor_type: ActorType::Bot,
                    actor_id: None,
                    created_at: now,
                },
            )
            .await
            .unwrap();
        }

        let log = activities_for(&db, "A1").await.unwrap();
        let kinds: Vec<_> = log.iter().map(|a| a.activity_type).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityType::Created,
                ActivityType::StatusChanged,
                ActivityType::HandoffTriggered
            ]
        );
        assert_eq!(log[1].new_value, Some(json!("pending_admin")));
        assert!(log[2].new_value.is_none());
    }
}
