// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission gate: decides whether a text message is worth full processing.
//!
//! Checks run in a fixed order and the first match wins: empty text,
//! gibberish, an active awaiting-input expectation, the quick-reply
//! whitelist, and finally the information score against timing windows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use concierge_config::model::GatekeeperConfig;
use concierge_core::{ConciergeError, GateReason, Platform, QuickState, StateKey};

use crate::expectation::{AwaitingInput, is_quick_reply};
use crate::gibberish::is_gibberish;
use crate::score::InfoScorer;

/// TTL of the last-user-message timestamp.
const LAST_USER_MSG_TTL: Duration = Duration::from_secs(60);
/// TTL of the last bot reply timestamp and last bot action.
pub const BOT_REPLY_TTL: Duration = Duration::from_secs(300);
/// A question asked this recently makes the gate more lenient.
const QUESTION_LENIENCY_SECS: f64 = 60.0;
const QUESTION_THRESHOLD_DROP: f64 = 0.15;
const MIN_THRESHOLD: f64 = 0.1;

/// Outcome of [`Gatekeeper::decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub process: bool,
    pub reason: GateReason,
    pub info_score: f64,
}

impl GateDecision {
    fn accept(reason: GateReason, info_score: f64) -> Self {
        Self {
            process: true,
            reason,
            info_score,
        }
    }

    fn reject(reason: GateReason, info_score: f64) -> Self {
        Self {
            process: false,
            reason,
            info_score,
        }
    }

    /// Rejected messages other than gibberish and empty text go to the buffer.
    pub fn should_buffer(&self) -> bool {
        !self.process && !matches!(self.reason, GateReason::Gibberish | GateReason::Empty)
    }
}

/// What the bot did in its last reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotActionKind {
    Question,
    List,
    Confirm,
    Info,
    Greeting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastBotAction {
    pub kind: BotActionKind,
    pub at: DateTime<Utc>,
}

/// The admission gate for one bot configuration.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: GatekeeperConfig,
    scorer: InfoScorer,
}

impl Gatekeeper {
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            config: config.clone(),
            scorer: InfoScorer::new(config),
        }
    }

    /// Decides whether `text` should be processed now.
    pub async fn decide(
        &self,
        text: &str,
        state: &QuickState,
        platform: Platform,
    ) -> Result<GateDecision, ConciergeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(GateDecision::reject(GateReason::Empty, 0.0));
        }
        if !self.config.enabled {
            return Ok(GateDecision::accept(GateReason::Ok, 1.0));
        }

        if self.config.gibberish_detection && is_gibberish(text) {
            return Ok(GateDecision::reject(GateReason::Gibberish, 0.0));
        }

        if let Some(awaiting) = state.get::<AwaitingInput>(StateKey::AwaitingInput).await?
            && awaiting.kind.matches(text)
        {
            return Ok(GateDecision::accept(GateReason::ExpectedInput, 1.0));
        }

        if is_quick_reply(text) {
            return Ok(GateDecision::accept(GateReason::QuickReply, 1.0));
        }

        let score = self.scorer.score(text);
        let since_reply = state
            .seconds_since(StateKey::LastBotReplyTime)
            .await?
            .unwrap_or(f64::INFINITY);
        let since_user = state
            .seconds_since(StateKey::LastUserMsg)
            .await?
            .unwrap_or(f64::INFINITY);

        let mut threshold = self.config.skip_threshold;
        if let Some(action) = state.get::<LastBotAction>(StateKey::LastBotAction).await?
            && action.kind == BotActionKind::Question
        {
            let asked_secs = (state.now() - action.at).num_milliseconds() as f64 / 1000.0;
            if asked_secs < QUESTION_LENIENCY_SECS {
                threshold = (threshold - QUESTION_THRESHOLD_DROP).max(MIN_THRESHOLD);
            }
        }

        if score < threshold {
            if since_reply < self.config.reply_window_seconds as f64 {
                return Ok(GateDecision::reject(GateReason::LowInfoAfterReply, score));
            }
            if since_user < self.rapid_window(platform) {
                return Ok(GateDecision::reject(GateReason::LowInfoRapid, score));
            }
        }

        state.touch(StateKey::LastUserMsg, LAST_USER_MSG_TTL).await?;
        Ok(GateDecision::accept(GateReason::Ok, score))
    }

    /// Rapid-typing window for `platform`, one second shorter on fast-typing
    /// platforms but never under two seconds.
    fn rapid_window(&self, platform: Platform) -> f64 {
        let base = self.config.rapid_typing_seconds;
        let name = platform.to_string();
        let fast = self
            .config
            .fast_typing_platforms
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&name));
        let secs = if fast { base.saturating_sub(1).max(2) } else { base };
        secs as f64
    }
}

/// Records that the bot just replied.
pub async fn record_bot_reply(state: &QuickState) -> Result<(), ConciergeError> {
    state.touch(StateKey::LastBotReplyTime, BOT_REPLY_TTL).await
}

/// Records the kind of the bot's last reply.
pub async fn record_bot_action(
    state: &QuickState,
    kind: BotActionKind,
) -> Result<(), ConciergeError> {
    let action = LastBotAction {
        kind,
        at: state.now(),
    };
    state
        .set(StateKey::LastBotAction, &action, BOT_REPLY_TTL)
        .await
}

/// Registers an expectation for the next message.
pub async fn set_awaiting_input(
    state: &QuickState,
    awaiting: &AwaitingInput,
    ttl: Duration,
) -> Result<(), ConciergeError> {
    state.set(StateKey::AwaitingInput, awaiting, ttl).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_test_utils::TestWorld;

    fn gate() -> Gatekeeper {
        Gatekeeper::new(&GatekeeperConfig::default())
    }

    #[tokio::test]
    async fn empty_and_gibberish_are_rejected_first() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());

        let empty = gate().decide("   ", &state, Platform::Line).await.unwrap();
        assert_eq!(empty.reason, GateReason::Empty);
        assert!(!empty.should_buffer());

        let mash = gate().decide("55555555", &state, Platform::Line).await.unwrap();
        assert!(!mash.process);
        assert_eq!(mash.reason, GateReason::Gibberish);
        assert!(!mash.should_buffer());
    }

    #[tokio::test]
    async fn expected_input_wins_over_low_score() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        record_bot_reply(&state).await.unwrap();
        set_awaiting_input(
            &state,
            &AwaitingInput::for_case_slot("case-1", "name").unwrap(),
            Duration::from_secs(120),
        )
        .await
        .unwrap();

        let decision = gate().decide("สมชาย", &state, Platform::Line).await.unwrap();
        assert_eq!(decision, GateDecision::accept(GateReason::ExpectedInput, 1.0));
    }

    #[tokio::test]
    async fn expired_expectation_is_ignored() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        set_awaiting_input(
            &state,
            &AwaitingInput::for_case_slot("case-1", "customer_name").unwrap(),
            Duration::from_secs(120),
        )
        .await
        .unwrap();
        world.clock.advance_secs(121);
        record_bot_reply(&state).await.unwrap();

        let decision = gate().decide("สมชาย", &state, Platform::Line).await.unwrap();
        assert_eq!(decision.reason, GateReason::LowInfoAfterReply);
    }

    #[tokio::test]
    async fn quick_reply_accepted_inside_rapid_window() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        state
            .touch(StateKey::LastUserMsg, Duration::from_secs(60))
            .await
            .unwrap();
        world.clock.advance_secs(1);

        let decision = gate().decide("3", &state, Platform::Line).await.unwrap();
        assert!(decision.process);
        assert_eq!(decision.reason, GateReason::QuickReply);
        assert_eq!(decision.info_score, 1.0);
    }

    #[tokio::test]
    async fn low_info_after_reply_then_rapid_then_accept() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        let gate = gate();

        record_bot_reply(&state).await.unwrap();
        world.clock.advance_secs(5);
        let d = gate.decide("ครับ", &state, Platform::Line).await.unwrap();
        assert_eq!(d.reason, GateReason::LowInfoAfterReply);
        assert!(d.should_buffer());

        world.clock.advance_secs(20);
        state
            .touch(StateKey::LastUserMsg, Duration::from_secs(60))
            .await
            .unwrap();
        world.clock.advance_secs(2);
        let d = gate.decide("ครับ", &state, Platform::Line).await.unwrap();
        assert_eq!(d.reason, GateReason::LowInfoRapid);

        world.clock.advance_secs(10);
        let d = gate.decide("ครับ", &state, Platform::Line).await.unwrap();
        assert_eq!(d.reason, GateReason::Ok);
        assert!(d.process);
    }

    #[tokio::test]
    async fn fast_typing_platform_shortens_rapid_window() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        let gate = gate();
        state
            .touch(StateKey::LastUserMsg, Duration::from_secs(60))
            .await
            .unwrap();
        world.clock.advance_millis(2_500);

        let line = gate.decide("อืม", &state, Platform::Line).await.unwrap();
        assert_eq!(line.reason, GateReason::LowInfoRapid);

        state
            .touch(StateKey::LastUserMsg, Duration::from_secs(60))
            .await
            .unwrap();
        world.clock.advance_millis(2_500);
        let facebook = gate.decide("อืม", &state, Platform::Facebook).await.unwrap();
        assert_eq!(facebook.reason, GateReason::Ok);
    }

    #[tokio::test]
    async fn fast_typing_window_never_drops_below_two_seconds() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        let gate = Gatekeeper::new(&GatekeeperConfig {
            rapid_typing_seconds: 2,
            ..GatekeeperConfig::default()
        });
        state
            .touch(StateKey::LastUserMsg, Duration::from_secs(60))
            .await
            .unwrap();
        world.clock.advance_millis(1_500);

        let d = gate.decide("อืม", &state, Platform::Facebook).await.unwrap();
        assert_eq!(d.reason, GateReason::LowInfoRapid);
    }

    #[tokio::test]
    async fn recent_question_lowers_threshold() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        let gate = gate();
        // "สีดำ" scores 4/40 = 0.1. A recent question drops a 0.2 threshold to the 0.1 floor.
        record_bot_reply(&state).await.unwrap();
        world.clock.advance_secs(3);
        let d = gate.decide("สีดำ", &state, Platform::Line).await.unwrap();
        assert_eq!(d.reason, GateReason::LowInfoAfterReply);

        let config = GatekeeperConfig {
            skip_threshold: 0.2,
            ..GatekeeperConfig::default()
        };
        let lenient = Gatekeeper::new(&config);
        record_bot_action(&state, BotActionKind::Question).await.unwrap();
        let d = lenient.decide("สีดำ", &state, Platform::Line).await.unwrap();
        assert_eq!(d.reason, GateReason::Ok);
    }

    #[tokio::test]
    async fn accept_records_last_user_message() {
        let world = TestWorld::new();
        let scope = TestWorld::scope();
        let state = world.state(&scope);

        let d = gate()
            .decide("สนใจ rolex submariner", &state, Platform::Line)
            .await
            .unwrap();
        assert_eq!(d.reason, GateReason::Ok);
        assert!(world.quick_state.peek(&scope, "last_user_msg").is_some());
    }

    #[tokio::test]
    async fn disabled_gate_admits_everything_but_empty() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        let gate = Gatekeeper::new(&GatekeeperConfig {
            enabled: false,
            ..GatekeeperConfig::default()
        });
        let d = gate.decide("asdfasdf", &state, Platform::Line).await.unwrap();
        assert!(d.process);
        let d = gate.decide("", &state, Platform::Line).await.unwrap();
        assert!(!d.process);
    }
}
