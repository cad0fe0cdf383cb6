// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use concierge_core::traits::{CaseStore, QuickStateStore, SessionStore};
use concierge_core::{
    Case, CaseActivity, CaseType, ChatMessage, ConciergeError, Platform, Scope, Session,
};

/// Quick State cells in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryQuickState {
    cells: DashMap<(Scope, String), (serde_json::Value, DateTime<Utc>)>,
}

impl MemoryQuickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw cell value regardless of expiry, for assertions.
    pub fn peek(&self, scope: &Scope, key: &str) -> Option<serde_json::Value> {
        self.cells
            .get(&(scope.clone(), key.to_string()))
            .map(|entry| entry.value().0.clone())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[async_trait]
impl QuickStateStore for MemoryQuickState {
    async fn get(
        &self,
        scope: &Scope,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>, ConciergeError> {
        let entry_key = (scope.clone(), key.to_string());
        let value = self
            .cells
            .get(&entry_key)
            .map(|entry| entry.value().clone());
        match value {
            Some((value, expires_at)) if expires_at > now => Ok(Some(value)),
            Some(_) => {
                self.cells.remove(&entry_key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        self.cells
            .insert((scope.clone(), key.to_string()), (value, expires_at));
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), ConciergeError> {
        self.cells.remove(&(scope.clone(), key.to_string()));
        Ok(())
    }
}

/// Sessions and message logs in memory.
#[derive(Debug, Default)]
pub struct MemorySessions {
    sessions: DashMap<String, Session>,
    by_scope: DashMap<Scope, String>,
    messages: DashMap<String, Vec<ChatMessage>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_for(&self, scope: &Scope) -> Option<Session> {
        let id = self.by_scope.get(scope)?.value().clone();
        self.sessions.get(&id).map(|s| s.value().clone())
    }

    pub fn messages_for(&self, scope: &Scope) -> Vec<ChatMessage> {
        self.by_scope
            .get(scope)
            .and_then(|id| self.messages.get(id.value()).map(|m| m.value().clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn get_or_create(
        &self,
        scope: &Scope,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<Session, ConciergeError> {
        if let Some(id) = self.by_scope.get(scope).map(|id| id.value().clone())
            && let Some(mut session) = self.sessions.get_mut(&id)
        {
            session.updated_at = now;
            return Ok(session.clone());
        }
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            scope: scope.clone(),
            platform,
            active_case_id: None,
            active_case_type: None,
            last_admin_message_at: None,
            created_at: now,
            updated_at: now,
        };
        self.by_scope.insert(scope.clone(), session.id.clone());
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn record_admin_message(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.last_admin_message_at = Some(at);
            session.updated_at = at;
        }
        Ok(())
    }

    async fn set_active_case(
        &self,
        session_id: &str,
        case_id: &str,
        case_type: CaseType,
        now: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.active_case_id = Some(case_id.to_string());
            session.active_case_type = Some(case_type);
            session.updated_at = now;
        }
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), ConciergeError> {
        self.messages
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ConciergeError> {
        let all = self
            .messages
            .get(session_id)
            .map(|m| m.value().clone())
            .unwrap_or_default();
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }
}

/// Cases and activities in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCases {
    cases: Mutex<Vec<Case>>,
    activities: Mutex<Vec<CaseActivity>>,
}

impl MemoryCases {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Case> {
        self.cases.lock().await.clone()
    }

    pub async fn all_activities(&self) -> Vec<CaseActivity> {
        self.activities.lock().await.clone()
    }
}

#[async_trait]
impl CaseStore for MemoryCases {
    async fn find_open(
        &self,
        scope: &Scope,
        case_type: CaseType,
    ) -> Result<Option<Case>, ConciergeError> {
        let cases = self.cases.lock().await;
        Ok(cases
            .iter()
            .filter(|c| &c.scope == scope && c.case_type == case_type && !c.status.is_terminal())
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>, ConciergeError> {
        let cases = self.cases.lock().await;
        Ok(cases.iter().find(|c| c.id == case_id).cloned())
    }

    async fn insert(&self, case: &Case) -> Result<(), ConciergeError> {
        self.cases.lock().await.push(case.clone());
        Ok(())
    }

    async fn update(&self, case: &Case) -> Result<(), ConciergeError> {
        let mut cases = self.cases.lock().await;
        match cases.iter_mut().find(|c| c.id == case.id) {
            Some(existing) => {
                *existing = case.clone();
                Ok(())
            }
            None => Err(ConciergeError::Internal(format!("case {} not found", case.id))),
        }
    }

    async fn append_activity(&self, activity: &CaseActivity) -> Result<(), ConciergeError> {
        self.activities.lock().await.push(activity.clone());
        Ok(())
    }

    async fn activities(&self, case_id: &str) -> Result<Vec<CaseActivity>, ConciergeError> {
        let activities = self.activities.lock().await;
        Ok(activities
            .iter()
            .filter(|a| a.case_id == case_id)
            .cloned()
            .collect())
    }
}
