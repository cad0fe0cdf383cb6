// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup, PRAGMAs and lifecycle.
//!
//! Every query goes through the one `tokio_rusqlite::Connection` held here.
//! Do not open further connections for writes.

use std::path::Path;

use concierge_core::ConciergeError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Converts a background-thread failure into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ConciergeError {
    ConciergeError::storage(e)
}

/// Handle to the SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// Migrations run on a blocking thread over a short-lived connection
    /// before the query connection is opened.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ConciergeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ConciergeError::storage)?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), ConciergeError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(ConciergeError::storage)?;
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(ConciergeError::storage)?;
                debug!(mode, "journal mode set");
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| ConciergeError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(ConciergeError::storage)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Runs `SELECT 1` through the query thread.
    pub async fn ping(&self) -> Result<(), ConciergeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)
    }

    /// Folds the WAL back into the main file.
    pub async fn checkpoint(&self) -> Result<(), ConciergeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_the_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("concierge.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let tables = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                     ORDER BY name",
                )?;
                let names = stmt.query_map([], |row| row.get(0))?;
                names.collect()
            })
            .await
            .unwrap();

        for table in ["case_activities", "cases", "messages", "quick_state", "sessions"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}: {tables:?}");
        }
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("again.db");
        let path = path.to_str().unwrap();
        Database::open(path, true).await.unwrap();
        let db = Database::open(path, true).await.unwrap();
        db.ping().await.unwrap();
        db.checkpoint().await.unwrap();
    }
}
