// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transaction desk, obligation service, and payment recorder.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use concierge_core::traits::{
    AccountKind, Obligation, ObligationKind, ObligationService, PaymentLink, PaymentRecorder,
    SlipEvidence, SlipRecord, TransactionDesk,
};
use concierge_core::{Answer, ConciergeError, Scope};

/// Desk that answers with a fixed line naming the account kind.
#[derive(Debug, Default)]
pub struct MockDesk {
    calls: Mutex<Vec<String>>,
}

impl MockDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in order, formatted as `status:pawn:REF` or `trade_in:calculate`.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TransactionDesk for MockDesk {
    async fn status(
        &self,
        kind: AccountKind,
        _scope: &Scope,
        reference: Option<&str>,
    ) -> Result<Answer, ConciergeError> {
        self.calls
            .lock()
            .await
            .push(format!("status:{kind}:{}", reference.unwrap_or("-")));
        Ok(Answer::text(format!("สถานะ {kind}")))
    }

    async fn trade_in(
        &self,
        _scope: &Scope,
        _text: &str,
        calculate: bool,
    ) -> Result<Answer, ConciergeError> {
        let mode = if calculate { "calculate" } else { "inquiry" };
        self.calls.lock().await.push(format!("trade_in:{mode}"));
        Ok(Answer::text(format!("เทิร์น {mode}")))
    }
}

/// Pending obligations per kind, with every accepted link recorded.
#[derive(Debug, Default)]
pub struct MockObligations {
    pending: Mutex<HashMap<ObligationKind, Vec<Obligation>>>,
    links: Mutex<Vec<PaymentLink>>,
    fail_lookup: AtomicBool,
}

impl MockObligations {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, obligation: Obligation) {
        self.pending
            .lock()
            .await
            .entry(obligation.kind)
            .or_default()
            .push(obligation);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub async fn links(&self) -> Vec<PaymentLink> {
        self.links.lock().await.clone()
    }
}

#[async_trait]
impl ObligationService for MockObligations {
    async fn find_pending(
        &self,
        kind: ObligationKind,
        _scope: &Scope,
    ) -> Result<Vec<Obligation>, ConciergeError> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(ConciergeError::collaborator(
                "obligations",
                "lookup unavailable",
            ));
        }
        Ok(self
            .pending
            .lock()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn link_payment(&self, link: &PaymentLink) -> Result<(), ConciergeError> {
        self.links.lock().await.push(link.clone());
        Ok(())
    }
}

/// Payment recorder that reports a duplicate for a repeated transfer reference.
#[derive(Debug, Default)]
pub struct MockPayments {
    seen: Mutex<HashMap<String, String>>,
    recorded: Mutex<Vec<(SlipEvidence, Option<String>)>>,
    counter: AtomicU32,
}

impl MockPayments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slip accepted as a new payment.
    pub async fn recorded(&self) -> Vec<(SlipEvidence, Option<String>)> {
        self.recorded.lock().await.clone()
    }

    /// Pre-registers a reference as already recorded under `payment_no`.
    pub async fn mark_seen(&self, reference: &str, payment_no: &str) {
        self.seen
            .lock()
            .await
            .insert(reference.to_string(), payment_no.to_string());
    }
}

#[async_trait]
impl PaymentRecorder for MockPayments {
    async fn record_slip(
        &self,
        _scope: &Scope,
        evidence: &SlipEvidence,
        image_url: Option<&str>,
    ) -> Result<SlipRecord, ConciergeError> {
        let mut seen = self.seen.lock().await;
        if let Some(reference) = evidence.reference.as_deref()
            && let Some(existing) = seen.get(reference)
        {
            return Ok(SlipRecord::Duplicate {
                existing_payment_no: existing.clone(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let payment_no = format!("PAY-{n:04}");
        if let Some(reference) = evidence.reference.as_deref() {
            seen.insert(reference.to_string(), payment_no.clone());
        }
        self.recorded
            .lock()
            .await
            .push((evidence.clone(), image_url.map(str::to_string)));
        Ok(SlipRecord::Saved {
            payment_id: format!("pay-{n}"),
            payment_no,
        })
    }
}
