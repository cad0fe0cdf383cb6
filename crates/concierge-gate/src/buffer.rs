// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-scope accumulator for skipped message fragments.
//!
//! Fragments the gate rejects are kept for a short window and merged into the
//! next processed message, so "ครับ" + "rolex" + "สีเขียว" typed in quick
//! succession still reach the router as one query.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use concierge_config::model::GatekeeperConfig;
use concierge_core::{ConciergeError, QuickState, StateKey};

use crate::keywords::extract_product_keywords;

/// Storage TTL of the buffer cell. Freshness is judged separately from the first fragment.
const CELL_TTL: Duration = Duration::from_secs(60);

static DROPPED_FRAGMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Particles
        Regex::new(r"(?i)^(ครับ|ค่ะ|คะ|คับ|จ้า|โอเค|ok|k)+[!?.\s]*$").expect("valid regex"),
        // Greetings
        Regex::new(r"(?i)^(สวัสดี|หวัดดี|ดี|hello|hi|hey)(ครับ|ค่ะ|คะ|จ้า)?[\s!]*$").expect("valid regex"),
        // General "what do you sell" questions
        Regex::new(r"^(มีอะไร|ขายอะไร|มีไรบ้าง|มีอะไรขาย|ดูสินค้า)[\s?!]*$").expect("valid regex"),
        // Acknowledgements
        Regex::new(r"(?i)^(ได้เลย|ได้|รับทราบ|เข้าใจ|โอเค|ตกลง|ok|okay)+(ครับ|ค่ะ|คะ|จ้า)?[!.\s]*$")
            .expect("valid regex"),
        // Thanks and goodbyes
        Regex::new(
            r"(?i)^(ขอบคุณ|ขอบใจ|thanks|thank\s*you|แล้วเจอกัน|ไว้เจอกัน|บาย|bye)+(ครับ|ค่ะ|คะ|จ้า)?[!.\s]*$",
        )
        .expect("valid regex"),
    ]
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BufferCell {
    messages: Vec<String>,
    first_at: DateTime<Utc>,
    last_at: DateTime<Utc>,
}

/// Message buffer settings resolved from the gatekeeper configuration.
#[derive(Debug, Clone, Copy)]
pub struct MessageBuffer {
    window: chrono::Duration,
    max_fragments: usize,
}

impl MessageBuffer {
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            window: chrono::Duration::seconds(config.buffer_window_seconds as i64),
            max_fragments: config.buffer_max_fragments.max(1),
        }
    }

    /// Appends a fragment. A stale buffer is reset first and the oldest fragment
    /// is evicted once the cap is reached.
    pub async fn append(&self, state: &QuickState, text: &str) -> Result<(), ConciergeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let now = state.now();
        let mut cell = match state.get::<BufferCell>(StateKey::MsgBuffer).await? {
            Some(cell) if now - cell.first_at <= self.window => cell,
            _ => BufferCell {
                messages: Vec::new(),
                first_at: now,
                last_at: now,
            },
        };
        cell.messages.push(text.to_string());
        if cell.messages.len() > self.max_fragments {
            let excess = cell.messages.len() - self.max_fragments;
            cell.messages.drain(..excess);
        }
        cell.last_at = now;
        tracing::debug!(fragments = cell.messages.len(), "buffered skipped message");
        state.set(StateKey::MsgBuffer, &cell, CELL_TTL).await
    }

    /// Empties the buffer and returns the merged fragments, or an empty string.
    pub async fn drain_and_merge(&self, state: &QuickState) -> Result<String, ConciergeError> {
        let cell = state.take::<BufferCell>(StateKey::MsgBuffer).await?;
        Ok(cell.map(|c| merge_fragments(&c.messages)).unwrap_or_default())
    }
}

/// Merges buffered fragments.
///
/// Acknowledgements, greetings and thanks are dropped. When any survivor has a
/// product core, only the distinct cores are joined; otherwise the survivors are.
pub fn merge_fragments(fragments: &[String]) -> String {
    let kept: Vec<&str> = fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty() && !DROPPED_FRAGMENTS.iter().any(|re| re.is_match(f)))
        .collect();

    let mut cores: Vec<String> = Vec::new();
    for fragment in &kept {
        let core = extract_product_keywords(fragment);
        if !core.is_empty() && !cores.contains(&core) {
            cores.push(core);
        }
    }

    if cores.is_empty() {
        kept.join(" ")
    } else {
        cores.join(" ")
    }
}
