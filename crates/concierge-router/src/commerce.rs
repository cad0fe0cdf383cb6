// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout, deposit, pawn, account status and admin handover handlers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use concierge_core::traits::{AccountKind, PaymentType};
use concierge_core::{
    CaseType, Clock, ConciergeError, Handled, Intent, IntentResult, PendingIntent, Product, ReasonTag,
    SlotBag, StateKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::heuristics::{confirm_payment_type, payment_type_label, requested_payment_type};
use crate::router::{IntentRouter, RouteTurn};

const LAST_ORDER_TTL: Duration = Duration::from_secs(3600);
const DEPOSIT_PENDING_TTL: Duration = Duration::from_secs(300);
const PAWN_PENDING_TTL: Duration = Duration::from_secs(600);

/// The order most recently confirmed in this conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastOrder {
    pub order_no: String,
    #[serde(default)]
    pub product: Option<Product>,
    pub payment_type: PaymentType,
    pub created_at: DateTime<Utc>,
}

impl IntentRouter {
    pub(crate) async fn checkout_confirm(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let payment_type = confirm_payment_type(turn.text);
        let product = self
            .collaborators
            .checkout
            .state(turn.scope)
            .await?
            .and_then(|s| s.product);
        let confirmation = self
            .collaborators
            .checkout
            .confirm(turn.scope, payment_type)
            .await?;

        if let Some(order_no) = &confirmation.order_no {
            let state = self.collaborators.state_for(turn.scope);
            let last = LastOrder {
                order_no: order_no.clone(),
                product,
                payment_type,
                created_at: state.now(),
            };
            state.set(StateKey::LastOrder, &last, LAST_ORDER_TTL).await?;
            info!(order_no = %order_no, payment_type = %payment_type, "order confirmed");
        }
        Ok(Handled::new(confirmation.answer, ReasonTag::Routed(intent)))
    }

    pub(crate) async fn change_payment_method(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let state = self.collaborators.state_for(turn.scope);
        let Some(mut last) = state.get::<LastOrder>(StateKey::LastOrder).await? else {
            return Ok(Handled::text(
                "ไม่พบออเดอร์ค่ะ รบกวนแจ้งเลขออเดอร์มา หรือเลือกสินค้าใหม่ได้เลยนะคะ",
                ReasonTag::Routed(intent),
            ));
        };

        let requested = requested_payment_type(turn.text);
        if requested == last.payment_type {
            return Ok(Handled::text(
                format!(
                    "ออเดอร์ #{} เป็น{}อยู่แล้วค่ะ",
                    last.order_no,
                    payment_type_label(requested)
                ),
                ReasonTag::Routed(intent),
            ));
        }

        match self
            .collaborators
            .checkout
            .change_payment_type(turn.scope, &last.order_no, requested)
            .await
        {
            Ok(answer) => {
                info!(
                    order_no = %last.order_no,
                    from = %last.payment_type,
                    to = %requested,
                    "payment method changed"
                );
                last.payment_type = requested;
                state.set(StateKey::LastOrder, &last, LAST_ORDER_TTL).await?;
                Ok(Handled::new(answer, ReasonTag::Routed(intent)))
            }
            Err(e) => {
                warn!(error = %e, order_no = %last.order_no, "payment method change failed");
                Ok(Handled::text(
                    "เปลี่ยนวิธีชำระไม่ได้ค่ะ รบกวนติดต่อแอดมินเพื่อช่วยดำเนินการนะคะ",
                    ReasonTag::Routed(intent),
                ))
            }
        }
    }

    pub(crate) async fn payment_options(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let product = self
            .collaborators
            .checkout
            .state(turn.scope)
            .await?
            .and_then(|s| s.product);
        let answer = self
            .collaborators
            .checkout
            .payment_options(turn.scope, product.as_ref())
            .await?;
        Ok(Handled::new(answer, ReasonTag::Routed(intent)))
    }

    /// Deposit on the product just viewed, or remember the request until one is.
    pub(crate) async fn deposit_ask_product(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        if let Some(product) = self.recent_product(turn).await {
            return self.start_deposit(turn, intent, &product).await;
        }
        let state = self.collaborators.state_for(turn.scope);
        let pending = PendingIntent::new(PendingIntent::DEPOSIT, state.now());
        state
            .set(StateKey::PendingIntent, &pending, DEPOSIT_PENDING_TTL)
            .await?;
        debug!("deposit requested before a product, waiting for one");
        Ok(Handled::text(
            &self.templates.deposit_ask_product,
            ReasonTag::Routed(intent),
        ))
    }

    pub(crate) async fn deposit_with_product(
        &self,
        turn: &RouteTurn<'_>,
        result: &IntentResult,
    ) -> Result<Handled, ConciergeError> {
        let intent = result.intent;
        let code = result
            .slot_str("code")
            .or_else(|| result.slot_str("product_code"));

        let mut product = None;
        if let Some(code) = &code {
            product = match self.collaborators.catalog.by_code(code).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(error = %e, code = %code, "product lookup failed");
                    None
                }
            };
        }
        if product.is_none() {
            product = self.recent_product(turn).await;
        }

        match product {
            Some(product) => self.start_deposit(turn, intent, &product).await,
            None => self.deposit_ask_product(turn, intent).await,
        }
    }

    async fn start_deposit(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
        product: &Product,
    ) -> Result<Handled, ConciergeError> {
        info!(product_code = ?product.code, "starting deposit checkout");
        let answer = self
            .collaborators
            .checkout
            .start(turn.scope, product, PaymentType::Deposit)
            .await?;
        Ok(Handled::new(answer, ReasonTag::Routed(intent)))
    }

    /// Pawn valuation: ask for photos and wait for the next image.
    pub(crate) async fn pawn_inquiry(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        if self.track_cases {
            let mut slots = SlotBag::default();
            slots.insert("description", turn.text.trim());
            if let Err(e) = self
                .cases
                .get_or_create(&turn.case_context(), CaseType::Pawn, &slots)
                .await
            {
                warn!(error = %e, "pawn case update failed");
            }
        }

        let state = self.collaborators.state_for(turn.scope);
        let pending = PendingIntent::new(PendingIntent::PAWN_ASSESSMENT, state.now());
        state
            .set(StateKey::PendingIntent, &pending, PAWN_PENDING_TTL)
            .await?;
        Ok(Handled::text(&self.templates.pawn_intro, ReasonTag::Routed(intent)))
    }

    pub(crate) async fn desk_status(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
        kind: AccountKind,
        reference: Option<&str>,
    ) -> Result<Handled, ConciergeError> {
        debug!(kind = %kind, reference, "account status lookup");
        let answer = self
            .collaborators
            .desk
            .status(kind, turn.scope, reference)
            .await?;
        Ok(Handled::new(answer, ReasonTag::Routed(intent)))
    }

    /// Replies with `template` and hands the conversation to a human.
    ///
    /// The session's admin timestamp is set, so automated replies stay off
    /// for the handoff window, and the active case moves to pending admin.
    pub(crate) async fn hand_over(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
        template: &str,
        reason: &str,
    ) -> Result<Handled, ConciergeError> {
        let now = self.collaborators.clock.now();
        let session = self
            .collaborators
            .sessions
            .get_or_create(turn.scope, turn.platform, now)
            .await?;
        self.collaborators
            .sessions
            .record_admin_message(&session.id, now)
            .await?;

        if let Some(case_id) = &session.active_case_id
            && let Err(e) = self.cases.trigger_handoff(case_id, reason).await
        {
            debug!(error = %e, case_id, "active case not escalated");
        }
        info!(reason, "conversation handed over to admin");
        Ok(Handled::text(template, ReasonTag::Routed(intent)))
    }
}
