// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the session, case and Quick State stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use concierge_config::model::StorageConfig;
use concierge_core::traits::{CaseStore, QuickStateStore, SessionStore};
use concierge_core::{
    Case, CaseActivity, CaseType, ChatMessage, ConciergeError, Platform, Scope, Session,
};
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// One database serving all three store traits.
///
/// Share it behind an `Arc` and hand the same handle to each consumer.
#[derive(Debug)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Opens and migrates the configured database.
    pub async fn open(config: &StorageConfig) -> Result<Self, ConciergeError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store ready");
        Ok(Self { db })
    }

    pub async fn health_check(&self) -> Result<(), ConciergeError> {
        self.db.ping().await
    }

    /// Removes expired Quick State cells.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ConciergeError> {
        queries::quick_state::purge_expired(&self.db, now).await
    }

    /// Checkpoints the WAL before shutdown.
    pub async fn close(&self) -> Result<(), ConciergeError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_or_create(
        &self,
        scope: &Scope,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<Session, ConciergeError> {
        queries::sessions::get_or_create(&self.db, scope, platform, now).await
    }

    async fn record_admin_message(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        queries::sessions::record_admin_message(&self.db, session_id, at).await
    }

    async fn set_active_case(
        &self,
        session_id: &str,
        case_id: &str,
        case_type: CaseType,
        now: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        queries::sessions::set_active_case(&self.db, session_id, case_id, case_type, now).await
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), ConciergeError> {
        queries::messages::insert_message(&self.db, session_id, message).await
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ConciergeError> {
        queries::messages::recent_messages(&self.db, session_id, limit).await
    }
}

#[async_trait]
impl CaseStore for SqliteStore {
    async fn find_open(
        &self,
        scope: &Scope,
        case_type: CaseType,
    ) -> Result<Option<Case>, ConciergeError> {
        queries::cases::find_open(&self.db, scope, case_type).await
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>, ConciergeError> {
        queries::cases::get_case(&self.db, case_id).await
    }

    async fn insert(&self, case: &Case) -> Result<(), ConciergeError> {
        queries::cases::insert_case(&self.db, case).await
    }

    async fn update(&self, case: &Case) -> Result<(), ConciergeError> {
        queries::cases::update_case(&self.db, case).await
    }

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), ConciergeError> {
        queries::cases::insert_activity(&self.db, activity).await
    }

    async fn activities(&self, case_id: &str) -> Result<Vec<CaseActivity>, ConciergeError> {
        queries::cases::activities_for(&self.db, case_id).await
    }
}

#[async_trait]
impl QuickStateStore for SqliteStore {
    async fn get(
        &self,
        scope: &Scope,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>, ConciergeError> {
        queries::quick_state::get_cell(&self.db, scope, key, now).await
    }

    async fn set(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        queries::quick_state::set_cell(&self.db, scope, key, &value, expires_at).await
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), ConciergeError> {
        queries::quick_state::delete_cell(&self.db, scope, key).await
    }
}
