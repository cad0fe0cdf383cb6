// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry point for inbound turns.

use std::sync::Arc;

use concierge_config::{BotConfig, merge_bot_overrides};
use concierge_core::types::new_trace_id;
use concierge_core::{Collaborators, Handled, InboundTurn, ReasonTag, Reply};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::locks::ScopeLocks;
use crate::pipeline::Pipeline;

/// Processes inbound turns, one at a time per (channel, user).
///
/// Every turn yields a [`Reply`]. Failures inside the pipeline are logged
/// with the trace id and answered with the error template.
#[derive(Debug)]
pub struct TurnProcessor {
    collaborators: Collaborators,
    base: Arc<Pipeline>,
    locks: ScopeLocks,
}

impl TurnProcessor {
    pub fn new(collaborators: Collaborators, config: Arc<BotConfig>) -> Self {
        let base = Arc::new(Pipeline::new(collaborators.clone(), config));
        Self {
            collaborators,
            base,
            locks: ScopeLocks::new(),
        }
    }

    /// The process-wide configuration.
    pub fn config(&self) -> &BotConfig {
        self.base.config()
    }

    pub async fn process(&self, turn: InboundTurn) -> Reply {
        let trace_id = turn
            .trace_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(new_trace_id);
        let span = info_span!(
            "turn",
            trace_id = %trace_id,
            channel = turn.channel.as_deref().unwrap_or_default(),
            user = turn.user.as_deref().unwrap_or_default(),
        );
        let handled = self.handle(&turn).instrument(span.clone()).await;
        span.in_scope(|| {
            info!(
                reason = %handled.reason,
                replied = !handled.answer.is_silent(),
                "turn complete"
            );
        });
        handled.into_reply(trace_id)
    }

    async fn handle(&self, turn: &InboundTurn) -> Handled {
        if turn.is_echo {
            debug!("platform echo ignored");
            return Handled::new(Default::default(), ReasonTag::IgnoreEcho);
        }
        let Some(scope) = turn.scope() else {
            warn!(reason = "missing_context", "turn without channel or user identity");
            return Handled::new(Default::default(), ReasonTag::MissingContext);
        };

        let pipeline = self.pipeline_for(turn);
        let guard = self.locks.acquire(&scope).await;
        let result = pipeline.run(turn, &scope).await;
        drop(guard);
        self.locks.release(&scope);

        match result {
            Ok(handled) => handled,
            Err(e) => {
                error!(error = %e, "turn failed, answering with the error template");
                Handled::text(&pipeline.config().templates.error, ReasonTag::Error)
            }
        }
    }

    /// The base pipeline, or one rebuilt over the turn's configuration overrides.
    fn pipeline_for(&self, turn: &InboundTurn) -> Arc<Pipeline> {
        let Some(overrides) = &turn.bot_config else {
            return self.base.clone();
        };
        match merge_bot_overrides(self.base.config(), overrides) {
            Ok(config) if config == **self.base.config() => self.base.clone(),
            Ok(config) => Arc::new(Pipeline::new(self.collaborators.clone(), Arc::new(config))),
            Err(e) => {
                warn!(error = %e, "ignoring invalid per-turn bot configuration");
                self.base.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::Scope;
    use concierge_test_utils::TestWorld;
    use serde_json::json;
    use tracing_test::traced_test;

    fn processor(world: &TestWorld) -> TurnProcessor {
        TurnProcessor::new(world.collaborators(), Arc::new(world.config.clone()))
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_identity_is_logged_and_silent() {
        let world = TestWorld::new();
        let mut turn = InboundTurn::text(&TestWorld::scope(), "สวัสดี");
        turn.user = Some("  ".into());

        let reply = processor(&world).process(turn).await;

        assert_eq!(reply.reason(), ReasonTag::MissingContext);
        assert!(reply.reply_text.is_none());
        assert!(logs_contain("turn without channel or user identity"));
    }

    #[tokio::test]
    async fn caller_trace_id_is_kept() {
        let world = TestWorld::new();
        let mut turn = InboundTurn::text(&TestWorld::scope(), "");
        turn.trace_id = Some("trace-abc".into());

        let reply = processor(&world).process(turn).await;
        assert_eq!(reply.meta.trace_id, "trace-abc");

        let reply = processor(&world)
            .process(InboundTurn::text(&Scope::new("c", "u2"), ""))
            .await;
        assert_eq!(reply.meta.trace_id.len(), 16);
    }

    #[tokio::test]
    async fn overrides_rebuild_the_pipeline() {
        let world = TestWorld::new();
        let processor = processor(&world);

        let mut turn = InboundTurn::text(&TestWorld::scope(), "");
        turn.bot_config = Some(json!({"templates": {"greeting": "ยินดีต้อนรับสู่ร้านเราค่ะ"}}));
        let reply = processor.process(turn).await;
        assert_eq!(reply.reply_text.as_deref(), Some("ยินดีต้อนรับสู่ร้านเราค่ะ"));

        let mut turn = InboundTurn::text(&Scope::new("channel-1", "user-2"), "");
        turn.bot_config = Some(json!({"gatekeeper": "not a table"}));
        let reply = processor.process(turn).await;
        assert_eq!(reply.reply_text.as_deref(), Some(world.config.templates.greeting.as_str()));
    }

    #[tokio::test]
    async fn locks_are_released_after_each_turn() {
        let world = TestWorld::new();
        let processor = processor(&world);
        processor
            .process(InboundTurn::text(&TestWorld::scope(), "สวัสดี"))
            .await;
        assert!(processor.locks.is_empty());
    }
}
