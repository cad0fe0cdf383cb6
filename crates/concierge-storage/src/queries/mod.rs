// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries over the Concierge schema, plus the column codecs they share.
//!
//! Timestamps are stored as RFC 3339 text with millisecond precision so
//! they sort lexicographically. Enums are stored by their snake_case name.

pub mod cases;
pub mod messages;
pub mod quick_state;
pub mod sessions;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;

pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decode_opt_time(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|r| decode_time(idx, &r)).transpose()
}

pub(crate) fn decode_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decode_json(idx: usize, raw: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Database;

    /// Opens a migrated database in a temporary directory.
    ///
    /// The directory guard must outlive the database.
    pub async fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::CaseStatus;

    #[test]
    fn times_round_trip_at_millisecond_precision() {
        let at = DateTime::parse_from_rfc3339("2026-03-09T10:15:30.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let encoded = encode_time(at);
        assert_eq!(encoded, "2026-03-09T10:15:30.123Z");
        assert_eq!(decode_time(0, &encoded).unwrap(), at);
    }

    #[test]
    fn bad_enum_text_is_a_conversion_failure() {
        assert_eq!(
            decode_enum::<CaseStatus>(3, "pending_admin").unwrap(),
            CaseStatus::PendingAdmin
        );
        let err = decode_enum::<CaseStatus>(3, "archived").unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(3, _, _)));
    }
}
