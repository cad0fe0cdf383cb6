// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-(channel, user) mutual exclusion.
//!
//! The admission heuristics, the message buffer and checkout state are all
//! read-modify-write sequences over Quick State. Two turns from the same user
//! must not interleave, so each scope gets its own async mutex.

use std::sync::Arc;

use concierge_core::Scope;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created lock per scope.
#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: DashMap<Scope, Arc<Mutex<()>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn holds `scope`.
    pub async fn acquire(&self, scope: &Scope) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops the entry for `scope` when nobody holds or waits on it.
    pub fn release(&self, scope: &Scope) {
        self.locks
            .remove_if(scope, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of scopes with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
