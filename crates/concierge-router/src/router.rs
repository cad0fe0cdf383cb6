// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent routing for admitted text turns.
//!
//! Precedence: menu reset > active checkout > awaited slot answer > policy
//! answer > early checkout > classification. A classified turn opens or
//! updates its case. When that case still lacks a required slot the bot asks
//! for it; otherwise the turn goes to exactly one handler chosen by an
//! exhaustive match on [`Intent`].

use std::time::Duration;

use concierge_cases::{CaseContext, CaseManager};
use concierge_config::BotConfig;
use concierge_config::model::{FeaturesConfig, LlmConfig, StoreConfig, TemplatesConfig};
use concierge_core::traits::{AccountKind, PaymentType, STEP_ASK_ADDRESS};
use concierge_core::{
    Case, CaseStatus, ChatMessage, Collaborators, ConciergeError, Handled, Intent, IntentResult,
    Platform, ReasonTag, Scope, SlotBag, StateKey,
};
use concierge_gate::{
    AwaitingInput, BotActionKind, record_bot_action, record_bot_reply, set_awaiting_input,
};
use tracing::{debug, info, warn};

use crate::heuristics::{is_early_checkout_phrase, is_menu_reset};
use crate::rewrite::QueryRewriter;

/// How long a slot question waits for its answer.
const SLOT_ANSWER_TTL: Duration = Duration::from_secs(120);

/// One admitted text turn.
#[derive(Debug, Clone, Copy)]
pub struct RouteTurn<'a> {
    pub scope: &'a Scope,
    pub platform: Platform,
    pub session_id: Option<&'a str>,
    /// Admitted text, already merged with any buffered fragments.
    pub text: &'a str,
    /// Recent conversation, oldest first.
    pub history: &'a [ChatMessage],
}

impl RouteTurn<'_> {
    pub(crate) fn case_context(&self) -> CaseContext {
        let ctx = CaseContext::new(self.scope.clone(), self.platform);
        match self.session_id {
            Some(id) => ctx.with_session(id),
            None => ctx,
        }
    }
}

/// Routes admitted text turns to their handlers.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    pub(crate) collaborators: Collaborators,
    pub(crate) cases: CaseManager,
    pub(crate) rewriter: QueryRewriter,
    pub(crate) templates: TemplatesConfig,
    pub(crate) features: FeaturesConfig,
    pub(crate) store: StoreConfig,
    pub(crate) llm: LlmConfig,
    menu_reset_triggers: Vec<String>,
    /// Case management on: product views and pawn inquiries update cases.
    pub(crate) track_cases: bool,
}

impl IntentRouter {
    pub fn new(collaborators: Collaborators, config: &BotConfig) -> Self {
        let cases = CaseManager::from_collaborators(&collaborators, config);
        let rewriter = QueryRewriter::new(collaborators.text.clone(), &config.llm);
        Self {
            collaborators,
            cases,
            rewriter,
            templates: config.templates.clone(),
            features: config.features.clone(),
            store: config.store.clone(),
            llm: config.llm.clone(),
            menu_reset_triggers: config.bot.menu_reset_triggers.clone(),
            track_cases: config.case_management.enabled,
        }
    }

    pub fn cases(&self) -> &CaseManager {
        &self.cases
    }

    /// Routes one turn. Every non-silent reply stamps the bot reply time.
    pub async fn route(&self, turn: &RouteTurn<'_>) -> Result<Handled, ConciergeError> {
        let handled = self.select(turn).await?;
        if !handled.answer.is_silent() {
            record_bot_reply(&self.collaborators.state_for(turn.scope)).await?;
        }
        Ok(handled)
    }

    async fn select(&self, turn: &RouteTurn<'_>) -> Result<Handled, ConciergeError> {
        let scope = turn.scope;
        let text = turn.text.trim();
        let checkout = &self.collaborators.checkout;

        if is_menu_reset(text, &self.menu_reset_triggers) && checkout.state(scope).await?.is_some() {
            checkout.clear(scope).await?;
            info!(trigger = text, "checkout cleared on menu reset");
        }

        if let Some(handled) = self.offer_to_checkout(scope, text).await? {
            return Ok(handled);
        }

        if let Some(handled) = self.fill_awaited_slot(turn).await? {
            return Ok(handled);
        }

        match self.collaborators.knowledge.policy_answer(text).await {
            Ok(Some(answer)) => return Ok(Handled::text(answer, ReasonTag::KnowledgeBase)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "policy lookup failed"),
        }

        if let Some(handled) = self.early_checkout(scope, text).await? {
            return Ok(handled);
        }

        let result = match self.collaborators.classifier.classify(text, turn.history).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "intent classification failed");
                return Ok(Handled::text(
                    &self.templates.fallback,
                    ReasonTag::Routed(Intent::Fallback),
                ));
            }
        };
        info!(
            intent = %result.intent,
            confidence = result.confidence,
            method = %result.method,
            "intent classified"
        );

        if let Some(case) = self.record_case(turn, &result).await
            && let Some(handled) = self.ask_missing_slot(scope, &case).await?
        {
            return Ok(handled);
        }
        self.dispatch(turn, &result).await
    }

    /// Gives an active checkout the first look at the turn.
    ///
    /// A declined turn releases the checkout, except while it waits for an
    /// address: the text may be a partial address the flow could not parse.
    async fn offer_to_checkout(
        &self,
        scope: &Scope,
        text: &str,
    ) -> Result<Option<Handled>, ConciergeError> {
        let checkout = &self.collaborators.checkout;
        let Some(state) = checkout.state(scope).await? else {
            return Ok(None);
        };

        match checkout.handle(scope, text).await? {
            Some(answer) if !answer.is_silent() => {
                debug!(step = %state.step, "checkout consumed the turn");
                return Ok(Some(Handled::new(answer, ReasonTag::CheckoutFlow)));
            }
            _ => {}
        }

        if state.step == STEP_ASK_ADDRESS {
            warn!("checkout declined text while asking for an address, keeping state");
        } else {
            info!(step = %state.step, "off-topic message, releasing checkout");
            checkout.clear(scope).await?;
        }
        Ok(None)
    }

    /// "I'll take it" right after looking at a product starts its checkout.
    async fn early_checkout(
        &self,
        scope: &Scope,
        text: &str,
    ) -> Result<Option<Handled>, ConciergeError> {
        if !self.features.early_checkout || !is_early_checkout_phrase(text) {
            return Ok(None);
        }
        let recent = match self.collaborators.catalog.recently_viewed(scope).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(error = %e, "recently viewed lookup failed");
                None
            }
        };
        let Some(product) = recent else {
            return Ok(None);
        };
        info!(product_code = ?product.code, "early checkout from recently viewed product");
        let answer = self
            .collaborators
            .checkout
            .start(scope, &product, PaymentType::Full)
            .await?;
        Ok(Some(Handled::new(answer, ReasonTag::EarlyCheckout)))
    }

    /// Opens or updates the case a caseable intent belongs to. Failures are logged only.
    ///
    /// Returns the case unless it was just escalated to an admin.
    async fn record_case(&self, turn: &RouteTurn<'_>, result: &IntentResult) -> Option<Case> {
        if !self.cases.auto_create() {
            return None;
        }
        let case_type = self.cases.detect_case_type(result.intent)?;
        let slots = SlotBag::from(result.slots.clone());
        let case = match self
            .cases
            .get_or_create(&turn.case_context(), case_type, &slots)
            .await
        {
            Ok(case) => case,
            Err(e) => {
                warn!(error = %e, case_type = %case_type, "case update failed");
                return None;
            }
        };
        debug!(case_no = %case.case_no, case_type = %case_type, "case updated from intent");

        if self.cases.should_handoff_to_admin(turn.text, &case.slots) {
            match self.cases.trigger_handoff(&case.id, "handoff_trigger").await {
                Ok(_) => info!(case_no = %case.case_no, "case escalated to admin"),
                Err(e) => warn!(error = %e, "case escalation failed"),
            }
            return None;
        }
        Some(case)
    }

    /// Asks for the first required slot the case lacks that has a configured question.
    ///
    /// A text slot is registered as the awaited input so the gate admits a
    /// terse answer and the next turn can store it.
    async fn ask_missing_slot(
        &self,
        scope: &Scope,
        case: &Case,
    ) -> Result<Option<Handled>, ConciergeError> {
        let next = self
            .cases
            .missing_slots(case)
            .into_iter()
            .find_map(|slot| self.cases.slot_question(&slot).map(|q| (slot, q.to_string())));
        let Some((slot, question)) = next else {
            return Ok(None);
        };

        if case.status == CaseStatus::Open {
            self.cases
                .update_status(&case.id, CaseStatus::PendingCustomer)
                .await?;
        }
        let state = self.collaborators.state_for(scope);
        match AwaitingInput::for_case_slot(&case.id, &slot) {
            Some(awaiting) => set_awaiting_input(&state, &awaiting, SLOT_ANSWER_TTL).await?,
            None => state.delete(StateKey::AwaitingInput).await?,
        }
        record_bot_action(&state, BotActionKind::Question).await?;
        debug!(case_no = %case.case_no, slot = %slot, "asking for missing slot");
        Ok(Some(Handled::text(question, ReasonTag::SlotFilling)))
    }

    /// Stores an answer to the slot question asked last turn.
    ///
    /// Asks the next question while slots remain, then moves the case to
    /// `in_progress`. Text that does not fit the awaited shape is routed normally.
    async fn fill_awaited_slot(
        &self,
        turn: &RouteTurn<'_>,
    ) -> Result<Option<Handled>, ConciergeError> {
        let state = self.collaborators.state_for(turn.scope);
        let Some(awaiting) = state.get::<AwaitingInput>(StateKey::AwaitingInput).await? else {
            return Ok(None);
        };
        let (Some(slot), Some(case_id)) = (awaiting.slot.as_deref(), awaiting.case_id.as_deref())
        else {
            return Ok(None);
        };
        let text = turn.text.trim();
        if !awaiting.kind.matches(text) {
            return Ok(None);
        }
        state.delete(StateKey::AwaitingInput).await?;

        let answer: SlotBag = [(slot.to_string(), serde_json::Value::from(text))]
            .into_iter()
            .collect();
        let case = self.cases.update_slots(case_id, &answer).await?;
        info!(case_no = %case.case_no, slot, "slot answered");

        if let Some(handled) = self.ask_missing_slot(turn.scope, &case).await? {
            return Ok(Some(handled));
        }
        if !case.status.is_terminal() {
            self.cases
                .update_status(&case.id, CaseStatus::InProgress)
                .await?;
        }
        Ok(Some(Handled::text(
            &self.templates.slots_complete,
            ReasonTag::SlotFilling,
        )))
    }

    async fn dispatch(
        &self,
        turn: &RouteTurn<'_>,
        result: &IntentResult,
    ) -> Result<Handled, ConciergeError> {
        let intent = result.intent;
        match intent {
            Intent::CheckoutConfirm => self.checkout_confirm(turn, intent).await,
            Intent::CheckoutCancel => {
                let answer = self.collaborators.checkout.cancel(turn.scope).await?;
                Ok(Handled::new(answer, ReasonTag::Routed(intent)))
            }
            Intent::ProductInterest | Intent::PurchaseIntent => {
                self.product_interest(turn, result).await
            }
            Intent::ProductLookupByCode | Intent::ProductSearch | Intent::PriceInquiry => {
                let query = search_query(turn, result);
                let skip_rewrite = result.slot_str("code").is_some()
                    || result.slot_str("product_code").is_some();
                self.product_search(turn, intent, &query, skip_rewrite).await
            }
            Intent::ProductAvailability => self.product_availability(turn, intent).await,
            Intent::ProductLookupByImage => Ok(Handled::text(
                &self.templates.ask_product_code,
                ReasonTag::Routed(intent),
            )),
            Intent::BrowseProducts => self.browse(intent).await,
            Intent::FollowUpInfo => self.follow_up(turn, intent).await,
            Intent::DepositFlow => self.deposit_ask_product(turn, intent).await,
            Intent::DepositNew => self.deposit_with_product(turn, result).await,
            Intent::InstallmentCheck
            | Intent::InstallmentFlow
            | Intent::InstallmentNew
            | Intent::InstallmentPay
            | Intent::InstallmentExtend
            | Intent::InstallmentInquiry => {
                self.desk_status(turn, intent, AccountKind::Installment, None).await
            }
            Intent::PawnCheck | Intent::PawnPayInterest | Intent::PawnRedeem => {
                self.desk_status(turn, intent, AccountKind::Pawn, None).await
            }
            Intent::PawnNew | Intent::PawnInquiry => self.pawn_inquiry(turn, intent).await,
            Intent::RepairCheck | Intent::RepairNew | Intent::RepairInquiry => {
                self.desk_status(turn, intent, AccountKind::Repair, None).await
            }
            Intent::SavingsCheck
            | Intent::SavingsNew
            | Intent::SavingsDeposit
            | Intent::SavingsInquiry => {
                self.desk_status(turn, intent, AccountKind::Savings, None).await
            }
            Intent::OrderCheck | Intent::OrderStatus => {
                let order_no = result.slot_str("order_no");
                self.desk_status(turn, intent, AccountKind::Order, order_no.as_deref())
                    .await
            }
            Intent::ChangePaymentMethod => self.change_payment_method(turn, intent).await,
            Intent::PaymentOptions => self.payment_options(turn, intent).await,
            Intent::AdminHandoff => {
                self.hand_over(turn, intent, &self.templates.handoff, "customer_request")
                    .await
            }
            Intent::RequestVideoCall => {
                self.hand_over(turn, intent, &self.templates.video_call, "video_call")
                    .await
            }
            Intent::PriceNegotiation => {
                self.hand_over(turn, intent, &self.templates.negotiation, "price_negotiation")
                    .await
            }
            Intent::TradeInInquiry | Intent::TradeInCalculate => {
                let calculate = intent == Intent::TradeInCalculate;
                let answer = self
                    .collaborators
                    .desk
                    .trade_in(turn.scope, turn.text, calculate)
                    .await?;
                Ok(Handled::new(answer, ReasonTag::Routed(intent)))
            }
            Intent::Greeting => Ok(Handled::text(&self.templates.greeting, ReasonTag::Routed(intent))),
            Intent::Thanks => Ok(Handled::text(&self.templates.thanks, ReasonTag::Routed(intent))),
            Intent::Goodbye => Ok(Handled::text(&self.templates.goodbye, ReasonTag::Routed(intent))),
            Intent::PaymentSlipVerify
            | Intent::Chitchat
            | Intent::Unknown
            | Intent::Fallback => self.fallback(turn, intent).await,
        }
    }
}

/// Explicit code, then keyword slot, then the product core of the text.
fn search_query(turn: &RouteTurn<'_>, result: &IntentResult) -> String {
    result
        .slot_str("code")
        .or_else(|| result.slot_str("product_code"))
        .or_else(|| result.slot_str("keyword"))
        .unwrap_or_else(|| {
            let core = concierge_gate::extract_product_keywords(turn.text);
            if core.is_empty() {
                turn.text.trim().to_string()
            } else {
                core
            }
        })
}

/// Boolean slot, accepting `true`, `"true"` and `1`.
pub(crate) fn slot_flag(result: &IntentResult, key: &str) -> bool {
    match result.slots.get(key) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => matches!(s.trim(), "true" | "1" | "yes"),
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}
