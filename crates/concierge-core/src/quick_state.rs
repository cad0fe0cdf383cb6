// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed access to short-lived per-(channel, user) state cells.
//!
//! Each cell carries its own expiry. A read after expiry behaves as absent,
//! and a value that no longer deserializes into the requested type is treated
//! the same way.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use strum::{Display, IntoStaticStr};

use crate::clock::Clock;
use crate::error::ConciergeError;
use crate::traits::QuickStateStore;
use crate::types::Scope;

/// Well-known Quick State keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StateKey {
    PendingIntent,
    AwaitingInput,
    LastBotReplyTime,
    LastUserMsg,
    MsgBuffer,
    LastOrder,
    LastPayment,
    LastBotAction,
    RecentInbound,
}

impl StateKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Marker for a multi-turn request waiting on the customer's next message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub intent: String,
    pub at: DateTime<Utc>,
}

impl PendingIntent {
    /// The next image is an item photo for a pawn valuation.
    pub const PAWN_ASSESSMENT: &'static str = "pawn_assessment";
    /// A deposit was requested before a product was known.
    pub const DEPOSIT: &'static str = "deposit";

    pub fn new(intent: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            intent: intent.into(),
            at,
        }
    }

    pub fn is(&self, intent: &str) -> bool {
        self.intent == intent
    }
}

/// Quick State bound to one scope.
#[derive(Clone)]
pub struct QuickState {
    store: Arc<dyn QuickStateStore>,
    clock: Arc<dyn Clock>,
    scope: Scope,
}

impl QuickState {
    pub fn new(store: Arc<dyn QuickStateStore>, clock: Arc<dyn Clock>, scope: Scope) -> Self {
        Self {
            store,
            clock,
            scope,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Reads a typed value. Expired, missing, or mistyped cells read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: StateKey) -> Result<Option<T>, ConciergeError> {
        let raw = self
            .store
            .get(&self.scope, key.as_str(), self.clock.now())
            .await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_value(raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(key = key.as_str(), error = %e, "discarding malformed quick state cell");
                Ok(None)
            }
        }
    }

    /// Writes a typed value that expires `ttl` from now.
    pub async fn set<T: Serialize>(
        &self,
        key: StateKey,
        value: &T,
        ttl: Duration,
    ) -> Result<(), ConciergeError> {
        let value = serde_json::to_value(value)?;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        let expires_at = self.clock.now() + ttl;
        self.store
            .set(&self.scope, key.as_str(), value, expires_at)
            .await
    }

    pub async fn delete(&self, key: StateKey) -> Result<(), ConciergeError> {
        self.store.delete(&self.scope, key.as_str()).await
    }

    /// Reads and deletes in one call.
    pub async fn take<T: DeserializeOwned>(&self, key: StateKey) -> Result<Option<T>, ConciergeError> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.delete(key).await?;
        }
        Ok(value)
    }

    /// Stores the current time under `key`.
    pub async fn touch(&self, key: StateKey, ttl: Duration) -> Result<(), ConciergeError> {
        let now = self.clock.now();
        self.set(key, &now, ttl).await
    }

    /// Seconds elapsed since the timestamp stored under `key`, `None` when absent.
    pub async fn seconds_since(&self, key: StateKey) -> Result<Option<f64>, ConciergeError> {
        let at: Option<DateTime<Utc>> = self.get(key).await?;
        Ok(at.map(|at| {
            let elapsed = self.clock.now() - at;
            (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
        }))
    }
}

impl std::fmt::Debug for QuickState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickState")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn advance(&self, secs: i64) {
            let mut now = self.0.lock().unwrap();
            *now += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, (serde_json::Value, DateTime<Utc>)>>);

    #[async_trait]
    impl QuickStateStore for MapStore {
        async fn get(
            &self,
            _scope: &Scope,
            key: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<serde_json::Value>, ConciergeError> {
            let map = self.0.lock().unwrap();
            Ok(map
                .get(key)
                .filter(|(_, exp)| *exp > now)
                .map(|(v, _)| v.clone()))
        }

        async fn set(
            &self,
            _scope: &Scope,
            key: &str,
            value: serde_json::Value,
            expires_at: DateTime<Utc>,
        ) -> Result<(), ConciergeError> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), (value, expires_at));
            Ok(())
        }

        async fn delete(&self, _scope: &Scope, key: &str) -> Result<(), ConciergeError> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn state() -> (QuickState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock(Mutex::new(Utc::now())));
        let state = QuickState::new(
            Arc::new(MapStore::default()),
            clock.clone(),
            Scope::new("c", "u"),
        );
        (state, clock)
    }

    #[tokio::test]
    async fn expired_cells_read_as_absent() {
        let (state, clock) = state();
        state
            .set(StateKey::PendingIntent, &"deposit", Duration::from_secs(300))
            .await
            .unwrap();
        clock.advance(299);
        let v: Option<String> = state.get(StateKey::PendingIntent).await.unwrap();
        assert_eq!(v.as_deref(), Some("deposit"));
        clock.advance(2);
        let v: Option<String> = state.get(StateKey::PendingIntent).await.unwrap();
        assert_eq!(v, None);
    }

    #[tokio::test]
    async fn mistyped_cells_read_as_absent() {
        let (state, _) = state();
        state
            .set(StateKey::LastOrder, &"not a number", Duration::from_secs(60))
            .await
            .unwrap();
        let v: Option<u64> = state.get(StateKey::LastOrder).await.unwrap();
        assert_eq!(v, None);
    }

    #[tokio::test]
    async fn take_clears_the_cell() {
        let (state, _) = state();
        state
            .set(StateKey::MsgBuffer, &vec!["a"], Duration::from_secs(30))
            .await
            .unwrap();
        let first: Option<Vec<String>> = state.take(StateKey::MsgBuffer).await.unwrap();
        let second: Option<Vec<String>> = state.take(StateKey::MsgBuffer).await.unwrap();
        assert_eq!(first, Some(vec!["a".to_string()]));
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn seconds_since_measures_from_touch() {
        let (state, clock) = state();
        assert_eq!(state.seconds_since(StateKey::LastBotReplyTime).await.unwrap(), None);
        state
            .touch(StateKey::LastBotReplyTime, Duration::from_secs(300))
            .await
            .unwrap();
        clock.advance(12);
        let elapsed = state.seconds_since(StateKey::LastBotReplyTime).await.unwrap();
        assert_eq!(elapsed, Some(12.0));
    }
}
