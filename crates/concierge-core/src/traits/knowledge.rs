// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConciergeError;

/// One ranked knowledge-base answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbHit {
    pub answer: String,
    pub score: f64,
}

/// FAQ and shop-policy knowledge base.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Answer for a shop-policy question (returns, warranty, authenticity), if `text` is one.
    async fn policy_answer(&self, text: &str) -> Result<Option<String>, ConciergeError>;

    /// Free-text search, best hit first.
    async fn search(&self, text: &str) -> Result<Vec<KbHit>, ConciergeError>;
}
