// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ordered checks and handlers one turn passes through.
//!
//! Pre-checks run cheapest first and each may end the turn: admin activity,
//! an active human handoff, duplicate deliveries, repeated messages, echoed
//! bot output and finally the admission gate. Whatever survives is routed by
//! intent, or handed to the image engine for image messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use concierge_config::BotConfig;
use concierge_config::model::SpamAction;
use concierge_core::{
    Answer, ChatMessage, Clock, Collaborators, ConciergeError, Handled, InboundTurn,
    MessagePayload, MessageRole, QuickState, ReasonTag, Scope, Session,
};
use concierge_gate::{AdmissionGate, AntiSpam, EchoFilter, SpamVerdict, record_bot_reply};
use concierge_reconcile::{ImageEngine, ImageTurn};
use concierge_router::{IntentRouter, RouteTurn};
use tracing::{debug, info, warn};

/// Components built for one effective configuration.
#[derive(Debug)]
pub(crate) struct Pipeline {
    config: Arc<BotConfig>,
    collaborators: Collaborators,
    admission: AdmissionGate,
    spam: AntiSpam,
    echo: EchoFilter,
    router: IntentRouter,
    images: ImageEngine,
}

fn silent(reason: ReasonTag) -> Handled {
    Handled::new(Answer::silent(), reason)
}

impl Pipeline {
    pub(crate) fn new(collaborators: Collaborators, config: Arc<BotConfig>) -> Self {
        Self {
            admission: AdmissionGate::new(&config),
            spam: AntiSpam::new(&config.anti_spam),
            echo: EchoFilter::new(&config.echo_filter),
            router: IntentRouter::new(collaborators.clone(), &config),
            images: ImageEngine::new(collaborators.clone(), &config),
            collaborators,
            config,
        }
    }

    pub(crate) fn config(&self) -> &Arc<BotConfig> {
        &self.config
    }

    /// Runs every stage after identity has been established.
    pub(crate) async fn run(
        &self,
        turn: &InboundTurn,
        scope: &Scope,
    ) -> Result<Handled, ConciergeError> {
        let now = self.collaborators.clock.now();
        let sessions = &self.collaborators.sessions;
        let session = sessions.get_or_create(scope, turn.platform, now).await?;

        if turn.from_admin || turn.sender_is_page {
            sessions.record_admin_message(&session.id, now).await?;
            let text = turn.message.text();
            if !text.is_empty() {
                let message = ChatMessage {
                    role: MessageRole::Admin,
                    text: text.to_string(),
                    at: now,
                };
                sessions.append_message(&session.id, &message).await?;
            }
            debug!(session_id = %session.id, "admin message recorded");
            return Ok(silent(ReasonTag::AdminMessage));
        }

        if self.handoff_active(&session, now) {
            debug!(session_id = %session.id, "human handoff active, staying quiet");
            return Ok(silent(ReasonTag::AdminHandoffActive));
        }

        let state = self.collaborators.state_for(scope);
        match &turn.message {
            MessagePayload::Image { url } => {
                let handled = self
                    .images
                    .handle(ImageTurn {
                        scope,
                        session_id: Some(&session.id),
                        image_url: url.as_deref(),
                    })
                    .await?;
                self.finish(&state, &session.id, None, &handled, true).await;
                Ok(handled)
            }
            MessagePayload::Text { .. } => self.text_turn(turn, scope, &session, &state, now).await,
        }
    }

    async fn text_turn(
        &self,
        turn: &InboundTurn,
        scope: &Scope,
        session: &Session,
        state: &QuickState,
        now: DateTime<Utc>,
    ) -> Result<Handled, ConciergeError> {
        let text = turn.message.text();

        match self.spam.check(state, text).await? {
            SpamVerdict::Clean => {}
            SpamVerdict::DuplicateDelivery => return Ok(silent(ReasonTag::DuplicateDelivery)),
            SpamVerdict::Repeated(SpamAction::Silent) => return Ok(silent(ReasonTag::SpamSilent)),
            SpamVerdict::Repeated(SpamAction::Template) => {
                let handled = Handled::text(self.spam.reply(), ReasonTag::SpamWarning);
                self.finish(state, &session.id, None, &handled, true).await;
                return Ok(handled);
            }
            SpamVerdict::Repeated(SpamAction::Handoff) => {
                self.hand_over_for_spam(session, now).await?;
                return Ok(silent(ReasonTag::SpamSilent));
            }
        }

        if self.echo.is_bot_output(text) {
            debug!("inbound text looks like our own output");
            return Ok(silent(ReasonTag::EchoFilterBotOutput));
        }

        if text.is_empty() {
            let handled = Handled::text(&self.config.templates.greeting, ReasonTag::Greeting);
            self.finish(state, &session.id, None, &handled, true).await;
            return Ok(handled);
        }

        let admission = self.admission.admit(text, state, turn.platform).await?;
        if !admission.decision.process {
            return Ok(silent(ReasonTag::Gatekeeper(admission.decision.reason)));
        }
        let merged = admission.text;
        if merged.trim().is_empty() {
            let handled = Handled::text(&self.config.templates.greeting, ReasonTag::Greeting);
            self.finish(state, &session.id, None, &handled, true).await;
            return Ok(handled);
        }

        let history = self
            .collaborators
            .sessions
            .recent_messages(&session.id, self.config.bot.history_limit)
            .await?;
        let handled = self
            .router
            .route(&RouteTurn {
                scope,
                platform: turn.platform,
                session_id: Some(&session.id),
                text: &merged,
                history: &history,
            })
            .await?;
        // The router stamps the reply time itself.
        self.finish(state, &session.id, Some(&merged), &handled, false)
            .await;
        Ok(handled)
    }

    fn handoff_active(&self, session: &Session, now: DateTime<Utc>) -> bool {
        let window = chrono::Duration::seconds(self.config.handoff.timeout_seconds as i64);
        session
            .last_admin_message_at
            .is_some_and(|at| now - at < window)
    }

    /// Silences the bot for the handoff window and escalates the active case.
    async fn hand_over_for_spam(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<(), ConciergeError> {
        self.collaborators
            .sessions
            .record_admin_message(&session.id, now)
            .await?;
        if let Some(case_id) = &session.active_case_id
            && let Err(e) = self.router.cases().trigger_handoff(case_id, "spam").await
        {
            warn!(case_id = %case_id, error = %e, "could not escalate case for spam handoff");
        }
        info!(session_id = %session.id, "repeated messages handed to a human");
        Ok(())
    }

    /// Logs the exchange and stamps the reply time. Failures here never fail the turn.
    async fn finish(
        &self,
        state: &QuickState,
        session_id: &str,
        user_text: Option<&str>,
        handled: &Handled,
        stamp_reply: bool,
    ) {
        let sessions = &self.collaborators.sessions;
        let now = self.collaborators.clock.now();

        if let Some(text) = user_text {
            let message = ChatMessage {
                role: MessageRole::User,
                text: text.to_string(),
                at: now,
            };
            if let Err(e) = sessions.append_message(session_id, &message).await {
                warn!(error = %e, "failed to log user message");
            }
        }

        if handled.answer.is_silent() {
            return;
        }
        if let Some(text) = handled.answer.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let message = ChatMessage {
                role: MessageRole::Bot,
                text: text.to_string(),
                at: now,
            };
            if let Err(e) = sessions.append_message(session_id, &message).await {
                warn!(error = %e, "failed to log bot reply");
            }
        }
        if stamp_reply && let Err(e) = record_bot_reply(state).await {
            warn!(error = %e, "failed to record bot reply time");
        }
    }
}
