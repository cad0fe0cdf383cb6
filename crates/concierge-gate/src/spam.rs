// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duplicate-delivery and repeated-message detection.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use concierge_config::SpamAction;
use concierge_config::model::AntiSpamConfig;
use concierge_core::{ConciergeError, QuickState, StateKey};

/// Most recent inbound texts kept per scope.
const MAX_RECENT: usize = 10;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static PARTICLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ครับ|ค่ะ|คะ|นะ|จ้า|ค่า)").expect("valid regex"));

/// Normalized acknowledgements that are never counted as spam.
const ACKNOWLEDGEMENTS: &[&str] = &[
    "ok", "okay", "kk", "k", "thx", "thanks", "ty", "คับ", "โอเค", "yes", "no", "y", "n", "ใช่",
    "ไม่", "ได้", "ตกลง", "ขอบคุณ",
];

/// Result of an anti-spam check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamVerdict {
    Clean,
    /// The same text arrived again within the duplicate window (webhook retry).
    DuplicateDelivery,
    /// The user keeps repeating the same message.
    Repeated(SpamAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct InboundRecord {
    text: String,
    normalized: String,
    at: DateTime<Utc>,
}

/// Anti-spam checks over the recent inbound texts of one scope.
#[derive(Debug, Clone)]
pub struct AntiSpam {
    config: AntiSpamConfig,
}

impl AntiSpam {
    pub fn new(config: &AntiSpamConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn reply(&self) -> &str {
        &self.config.default_reply
    }

    /// Checks `text` and records it as a recent inbound message unless it is a duplicate delivery.
    pub async fn check(&self, state: &QuickState, text: &str) -> Result<SpamVerdict, ConciergeError> {
        let text = text.trim();
        if !self.config.enabled || text.is_empty() {
            return Ok(SpamVerdict::Clean);
        }

        let now = state.now();
        let duplicate_window = chrono::Duration::seconds(self.config.duplicate_window_seconds as i64);
        let repeat_window = chrono::Duration::seconds(self.config.repeat_window_seconds as i64);
        let keep = duplicate_window.max(repeat_window);

        let mut recent: Vec<InboundRecord> = state
            .get(StateKey::RecentInbound)
            .await?
            .unwrap_or_default();
        recent.retain(|r| now - r.at <= keep);

        if recent
            .iter()
            .any(|r| r.text == text && now - r.at < duplicate_window)
        {
            return Ok(SpamVerdict::DuplicateDelivery);
        }

        let normalized = normalize_for_comparison(text);
        let mut verdict = SpamVerdict::Clean;
        if !normalized.is_empty() && !should_bypass(&normalized) {
            let seen = recent
                .iter()
                .filter(|r| r.normalized == normalized && now - r.at < repeat_window)
                .count();
            if seen >= self.config.repeat_threshold {
                tracing::info!(seen, action = ?self.config.action, "repeated message detected");
                verdict = SpamVerdict::Repeated(self.config.action);
            }
        }

        recent.push(InboundRecord {
            text: text.to_string(),
            normalized,
            at: now,
        });
        if recent.len() > MAX_RECENT {
            let excess = recent.len() - MAX_RECENT;
            recent.drain(..excess);
        }
        let ttl = keep.to_std().unwrap_or(Duration::from_secs(60));
        state.set(StateKey::RecentInbound, &recent, ttl).await?;

        Ok(verdict)
    }
}

/// Lower-cases, removes whitespace and Thai polite particles.
pub fn normalize_for_comparison(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let compact = WHITESPACE.replace_all(&lower, "");
    PARTICLES.replace_all(&compact, "").into_owned()
}

fn should_bypass(normalized: &str) -> bool {
    normalized.chars().count() <= 3 || ACKNOWLEDGEMENTS.contains(&normalized)
}
