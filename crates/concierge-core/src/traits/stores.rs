// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for sessions, cases, and Quick State.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::case::{Case, CaseActivity, CaseType};
use crate::error::ConciergeError;
use crate::types::{ChatMessage, Platform, Scope, Session};

/// Conversation sessions and their message log.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for `scope`, creating it on first contact.
    async fn get_or_create(
        &self,
        scope: &Scope,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<Session, ConciergeError>;

    async fn record_admin_message(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ConciergeError>;

    async fn set_active_case(
        &self,
        session_id: &str,
        case_id: &str,
        case_type: CaseType,
        now: DateTime<Utc>,
    ) -> Result<(), ConciergeError>;

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), ConciergeError>;

    /// The most recent `limit` messages, oldest first.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ConciergeError>;
}

/// Cases and their append-only activity log.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Most recently created non-terminal case of `case_type` for `scope`.
    async fn find_open(
        &self,
        scope: &Scope,
        case_type: CaseType,
    ) -> Result<Option<Case>, ConciergeError>;

    async fn get(&self, case_id: &str) -> Result<Option<Case>, ConciergeError>;

    async fn insert(&self, case: &Case) -> Result<(), ConciergeError>;

    async fn update(&self, case: &Case) -> Result<(), ConciergeError>;

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), ConciergeError>;

    /// Activities for a case in insertion order.
    async fn activities(&self, case_id: &str) -> Result<Vec<CaseActivity>, ConciergeError>;
}

/// Raw TTL key-value cells. Reads at or after `expires_at` must return `None`.
#[async_trait]
pub trait QuickStateStore: Send + Sync {
    async fn get(
        &self,
        scope: &Scope,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>, ConciergeError>;

    async fn set(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ConciergeError>;

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), ConciergeError>;
}
