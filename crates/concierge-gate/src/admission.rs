// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gate plus buffer: the full admission step for a text message.

use concierge_config::BotConfig;
use concierge_core::{ConciergeError, Platform, QuickState};

use crate::buffer::MessageBuffer;
use crate::gatekeeper::{GateDecision, Gatekeeper};

/// Result of admitting one text message.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub decision: GateDecision,
    /// Text to route: buffered fragments merged in front of the message.
    /// Empty when the message was not admitted.
    pub text: String,
}

/// Runs the admission gate and keeps the message buffer in step with it.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    gatekeeper: Gatekeeper,
    buffer: MessageBuffer,
}

impl AdmissionGate {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            gatekeeper: Gatekeeper::new(&config.gatekeeper),
            buffer: MessageBuffer::new(&config.gatekeeper),
        }
    }

    /// Admits or rejects `text`.
    ///
    /// Rejected messages other than empty and gibberish ones are buffered. An
    /// admitted message drains the buffer and is appended to the merged fragments.
    pub async fn admit(
        &self,
        text: &str,
        state: &QuickState,
        platform: Platform,
    ) -> Result<Admission, ConciergeError> {
        let decision = self.gatekeeper.decide(text, state, platform).await?;
        if !decision.process {
            if decision.should_buffer() {
                self.buffer.append(state, text).await?;
            }
            tracing::debug!(
                reason = %decision.reason,
                score = decision.info_score,
                "message held by admission gate"
            );
            return Ok(Admission {
                decision,
                text: String::new(),
            });
        }

        let buffered = self.buffer.drain_and_merge(state).await?;
        let text = if buffered.is_empty() {
            text.trim().to_string()
        } else {
            format!("{buffered} {}", text.trim())
        };
        Ok(Admission { decision, text })
    }
}
