// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image message state machine.
//!
//! 1. A pending pawn assessment claims the image outright.
//! 2. The vision collaborator classifies it. A failed call asks the user.
//! 3. Payment proofs go to slip recording and reconciliation.
//! 4. Everything else tries image search, then acknowledges receipt.

use std::time::Duration;

use chrono::{DateTime, Utc};
use concierge_cases::CaseManager;
use concierge_config::BotConfig;
use concierge_config::model::{ReconciliationConfig, TemplatesConfig};
use concierge_core::format::{fill, format_price, product_carousel};
use concierge_core::traits::{
    Obligation, ObligationKind, PaymentLink, SlipEvidence, SlipRecord, VisionReport,
};
use concierge_core::{
    Answer, CaseType, Collaborators, ConciergeError, Handled, PendingIntent, QuickReplyItem,
    QuickState, ReasonTag, Scope, StateKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::evidence::{describe, evidence_from_report};
use crate::matcher::{Candidates, MatchOutcome, MatchTier, Tolerances, match_payment};
use crate::routing::{ImageRoute, route_image};

const LAST_PAYMENT_TTL: Duration = Duration::from_secs(3600);

/// Follow-up memory of the last slip the customer sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPayment {
    pub payment_id: String,
    pub payment_no: String,
    pub amount: Option<f64>,
    pub matched_reference: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One inbound image.
#[derive(Debug, Clone, Copy)]
pub struct ImageTurn<'a> {
    pub scope: &'a Scope,
    pub session_id: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

/// Handles image messages against the collaborator bundle.
#[derive(Debug, Clone)]
pub struct ImageEngine {
    collaborators: Collaborators,
    cases: CaseManager,
    reconciliation: ReconciliationConfig,
    templates: TemplatesConfig,
    image_search: bool,
}

impl ImageEngine {
    pub fn new(collaborators: Collaborators, config: &BotConfig) -> Self {
        let cases = CaseManager::from_collaborators(&collaborators, config);
        Self {
            collaborators,
            cases,
            reconciliation: config.reconciliation.clone(),
            templates: config.templates.clone(),
            image_search: config.features.image_search,
        }
    }

    pub async fn handle(&self, turn: ImageTurn<'_>) -> Result<Handled, ConciergeError> {
        let Some(url) = turn.image_url.filter(|u| !u.trim().is_empty()) else {
            return Ok(Handled::text(&self.templates.image_error, ReasonTag::ImageError));
        };
        let state = self.collaborators.state_for(turn.scope);

        let pending: Option<PendingIntent> = state.get(StateKey::PendingIntent).await?;
        if pending.is_some_and(|p| p.is(PendingIntent::PAWN_ASSESSMENT)) {
            state.delete(StateKey::PendingIntent).await?;
            self.hand_off_assessment(turn).await?;
            return Ok(Handled::text(
                &self.templates.pawn_image_received,
                ReasonTag::PawnImageReceived,
            ));
        }

        let payment_pending = self.payment_pending(turn.scope).await;
        let report = match &self.collaborators.vision {
            Some(vision) => match vision.analyze(url).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, payment_pending, "vision analysis failed, asking the user");
                    return Ok(self.clarify());
                }
            },
            None => None,
        };

        let route = report
            .as_ref()
            .map(|r| route_image(r, &self.reconciliation, payment_pending))
            .unwrap_or(ImageRoute::Generic);
        info!(
            route = %route,
            image_type = ?report.as_ref().map(|r| r.image_type),
            confidence = ?report.as_ref().map(|r| r.confidence),
            payment_pending,
            "image routed"
        );

        if route == ImageRoute::Slip {
            return self.handle_slip(turn, &state, url, report.as_ref()).await;
        }

        if self.image_search {
            match self.collaborators.catalog.search_by_image(url).await {
                Ok(found) if !found.products.is_empty() => {
                    return Ok(Handled::new(
                        product_carousel(&found.products),
                        ReasonTag::ImageSearch,
                    ));
                }
                Ok(found) => {
                    let description = found
                        .detected_description
                        .or_else(|| report.as_ref().and_then(|r| r.description.clone()));
                    if let Some(description) = description {
                        return Ok(self.no_result(&description, payment_pending));
                    }
                }
                Err(e) => warn!(error = %e, "image search failed"),
            }
        }

        Ok(Handled::text(
            &self.templates.image_received,
            ReasonTag::ImageReceived,
        ))
    }

    /// Activates the admin handoff window and escalates the open pawn case.
    async fn hand_off_assessment(&self, turn: ImageTurn<'_>) -> Result<(), ConciergeError> {
        let now = self.collaborators.clock.now();
        match turn.session_id {
            Some(session_id) => {
                self.collaborators
                    .sessions
                    .record_admin_message(session_id, now)
                    .await?;
            }
            None => warn!("no session to hand off for pawn assessment"),
        }
        if let Some(case) = self.cases.open_case(turn.scope, CaseType::Pawn).await? {
            self.cases
                .trigger_handoff(&case.id, "pawn_image_received")
                .await?;
        }
        info!("pawn assessment photo received, admin handoff active");
        Ok(())
    }

    /// A checkout in progress or any pending order. Lookup failures count as none.
    async fn payment_pending(&self, scope: &Scope) -> bool {
        match self.collaborators.checkout.state(scope).await {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "checkout state lookup failed"),
        }
        match self
            .collaborators
            .obligations
            .find_pending(ObligationKind::Order, scope)
            .await
        {
            Ok(orders) => !orders.is_empty(),
            Err(e) => {
                warn!(error = %e, "pending order lookup failed");
                false
            }
        }
    }

    fn clarify(&self) -> Handled {
        let answer = Answer::text(&self.templates.image_clarify).with_quick_replies(vec![
            QuickReplyItem::new("ค้นหาสินค้า", "ค้นหา"),
            QuickReplyItem::new("แจ้งโอนเงิน", "สลิป"),
            QuickReplyItem::new("ส่งรูปประเมิน", "แอดมิน"),
        ]);
        Handled::new(answer, ReasonTag::ImageClarify)
    }

    fn no_result(&self, description: &str, payment_pending: bool) -> Handled {
        let detected: String = description.chars().take(100).collect();
        let detected = format!(" (ตรวจพบ: {detected})");
        let mut text = fill(
            &self.templates.image_search_no_result,
            &[("description", detected.as_str())],
        );
        if payment_pending {
            text.push_str("\n\nหากต้องการส่งสลิป พิมพ์ \"สลิป\" หรือ \"แจ้งโอน\" ได้เลยค่ะ");
        }
        Handled::text(text, ReasonTag::ImageSearchNoResult)
    }

    async fn handle_slip(
        &self,
        turn: ImageTurn<'_>,
        state: &QuickState,
        url: &str,
        report: Option<&VisionReport>,
    ) -> Result<Handled, ConciergeError> {
        let evidence = report.map(evidence_from_report).unwrap_or_default();
        let summary = describe(&evidence);

        let record = self
            .collaborators
            .payments
            .record_slip(turn.scope, &evidence, Some(url))
            .await;
        let (payment_id, payment_no) = match record {
            Ok(SlipRecord::Saved {
                payment_id,
                payment_no,
            }) => (payment_id, payment_no),
            Ok(SlipRecord::Duplicate {
                existing_payment_no,
            }) => {
                info!(payment_no = %existing_payment_no, "duplicate slip");
                return Ok(Handled::text(
                    fill(
                        &self.templates.slip_duplicate,
                        &[("payment_no", existing_payment_no.as_str())],
                    ),
                    ReasonTag::SlipDuplicate,
                ));
            }
            Err(e) => {
                warn!(error = %e, "slip could not be recorded");
                return Ok(Handled::text(
                    with_summary(&summary, &self.templates.slip_received),
                    ReasonTag::SlipReceived,
                ));
            }
        };

        let outcome = self
            .reconcile(turn.scope, &payment_id, evidence.amount)
            .await;

        if let Err(e) = self.collaborators.checkout.clear(turn.scope).await {
            warn!(error = %e, "failed to clear checkout after slip");
        }
        let matched_reference = match &outcome {
            MatchOutcome::Linked { obligation, .. } => Some(obligation.reference.clone()),
            MatchOutcome::Unmatched { .. } => None,
        };
        let last = LastPayment {
            payment_id: payment_id.clone(),
            payment_no: payment_no.clone(),
            amount: evidence.amount,
            matched_reference,
            submitted_at: self.collaborators.clock.now(),
        };
        state
            .set(StateKey::LastPayment, &last, LAST_PAYMENT_TTL)
            .await?;

        let text = self.slip_reply(&evidence, &payment_no, &outcome);
        Ok(Handled::text(with_summary(&summary, &text), ReasonTag::SlipSaved))
    }

    /// Finds the obligation this payment settles and links it.
    ///
    /// A failed lookup counts as no candidates of that kind. A failed link
    /// leaves the payment unlinked for manual review.
    async fn reconcile(&self, scope: &Scope, payment_id: &str, amount: Option<f64>) -> MatchOutcome {
        let candidates = Candidates {
            orders: self.pending(ObligationKind::Order, scope).await,
            pawns: self.pending(ObligationKind::Pawn, scope).await,
            installments: self.pending(ObligationKind::Installment, scope).await,
        };
        let outcome = match_payment(
            amount,
            &candidates,
            &Tolerances::from(&self.reconciliation),
        );

        match &outcome {
            MatchOutcome::Linked {
                obligation,
                tier,
                difference,
            } => {
                let link = PaymentLink {
                    kind: obligation.kind,
                    obligation_id: obligation.id.clone(),
                    payment_id: payment_id.to_string(),
                    subtype: tier.subtype().to_string(),
                    amount,
                };
                if let Err(e) = self.collaborators.obligations.link_payment(&link).await {
                    warn!(error = %e, obligation = %obligation.reference, "auto-link failed");
                    return MatchOutcome::Unmatched {
                        orders: candidates.orders.len(),
                        pawns: candidates.pawns.len(),
                        installments: candidates.installments.len(),
                    };
                }
                info!(
                    tier = %tier,
                    kind = %obligation.kind,
                    obligation = %obligation.reference,
                    payment_id,
                    difference = ?difference,
                    "payment auto-linked"
                );
                self.link_case(scope, obligation, payment_id).await;
            }
            MatchOutcome::Unmatched {
                orders,
                pawns,
                installments,
            } => {
                info!(orders, pawns, installments, payment_id, "payment left for manual review");
            }
        }
        outcome
    }

    /// Records the payment, and the order it settled, on the matching open case.
    /// Failures are logged only: the obligation link already stands.
    async fn link_case(&self, scope: &Scope, obligation: &Obligation, payment_id: &str) {
        let case_type = match obligation.kind {
            ObligationKind::Order => CaseType::PaymentFull,
            ObligationKind::Installment => CaseType::PaymentInstallment,
            ObligationKind::Pawn => CaseType::Pawn,
        };
        let case = match self.cases.open_case(scope, case_type).await {
            Ok(Some(case)) => case,
            Ok(None) => {
                debug!(case_type = %case_type, "no open case to link the payment to");
                return;
            }
            Err(e) => {
                warn!(error = %e, "case lookup for payment link failed");
                return;
            }
        };

        if obligation.kind == ObligationKind::Order
            && let Err(e) = self.cases.link_order(&case.id, &obligation.id).await
        {
            warn!(error = %e, case_no = %case.case_no, "failed to link order to case");
        }
        match self.cases.link_payment(&case.id, payment_id).await {
            Ok(_) => debug!(case_no = %case.case_no, payment_id, "payment linked to case"),
            Err(e) => warn!(error = %e, case_no = %case.case_no, "failed to link payment to case"),
        }
    }

    async fn pending(&self, kind: ObligationKind, scope: &Scope) -> Vec<Obligation> {
        match self.collaborators.obligations.find_pending(kind, scope).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, kind = %kind, "obligation lookup failed");
                Vec::new()
            }
        }
    }

    fn slip_reply(&self, evidence: &SlipEvidence, payment_no: &str, outcome: &MatchOutcome) -> String {
        let amount = evidence
            .amount
            .map(format_price)
            .unwrap_or_else(|| "-".to_string());
        match outcome {
            MatchOutcome::Linked {
                obligation, tier, ..
            } => {
                let base = fill(
                    &self.templates.slip_saved,
                    &[
                        ("amount", amount.as_str()),
                        ("payment_no", payment_no),
                        ("reference", obligation.reference.as_str()),
                    ],
                );
                format!("{base}\n\n{}", tier_note(*tier))
            }
            MatchOutcome::Unmatched {
                orders,
                pawns,
                installments,
            } => {
                let base = fill(
                    &self.templates.slip_unmatched,
                    &[("amount", amount.as_str()), ("payment_no", payment_no)],
                );
                let mut found = Vec::new();
                if *orders > 0 {
                    found.push(format!("ออเดอร์ {orders} รายการ"));
                }
                if *pawns > 0 {
                    found.push(format!("จำนำ {pawns} รายการ"));
                }
                if *installments > 0 {
                    found.push(format!("ผ่อนชำระ {installments} รายการ"));
                }
                debug!(?found, "unmatched slip candidates");
                if found.is_empty() {
                    base
                } else {
                    format!("{base}\n\nพบรายการค้างชำระ: {}", found.join(", "))
                }
            }
        }
    }
}

fn tier_note(tier: MatchTier) -> &'static str {
    match tier {
        MatchTier::OrderAmount => "ยอดโอนตรงกับยอดค้างชำระค่ะ",
        MatchTier::OrderMostRecent => "ระบบจับคู่กับออเดอร์ล่าสุดให้อัตโนมัติ แอดมินจะตรวจสอบยอดอีกครั้งค่ะ",
        MatchTier::PawnInterest => "ระบบตรวจพบว่าเป็นการจ่ายดอกเบี้ยค่ะ",
        MatchTier::PawnRedemption | MatchTier::PawnLoan => "ระบบตรวจพบว่าเป็นการไถ่ถอนค่ะ",
        MatchTier::Installment => "ระบบตรวจพบว่าเป็นการชำระค่างวดค่ะ",
    }
}

fn with_summary(summary: &str, text: &str) -> String {
    if summary.is_empty() {
        text.to_string()
    } else {
        format!("{text}\n\n{summary}")
    }
}
