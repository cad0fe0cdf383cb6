// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status desk, pending obligations and payment recording.

use async_trait::async_trait;
use concierge_core::traits::{
    AccountKind, Obligation, ObligationKind, ObligationService, PaymentLink, PaymentRecorder,
    SlipEvidence, SlipRecord, TransactionDesk,
};
use concierge_core::{Answer, ConciergeError, Scope};
use serde_json::json;
use tracing::info;

use crate::client::BackendClient;

#[async_trait]
impl TransactionDesk for BackendClient {
    async fn status(
        &self,
        kind: AccountKind,
        scope: &Scope,
        reference: Option<&str>,
    ) -> Result<Answer, ConciergeError> {
        self.call(
            "desk/status",
            &json!({"kind": kind, "scope": scope, "reference": reference}),
        )
        .await
    }

    async fn trade_in(
        &self,
        scope: &Scope,
        text: &str,
        calculate: bool,
    ) -> Result<Answer, ConciergeError> {
        self.call(
            "desk/trade_in",
            &json!({"scope": scope, "text": text, "calculate": calculate}),
        )
        .await
    }
}

#[async_trait]
impl ObligationService for BackendClient {
    async fn find_pending(
        &self,
        kind: ObligationKind,
        scope: &Scope,
    ) -> Result<Vec<Obligation>, ConciergeError> {
        self.call(
            "obligations/find_pending",
            &json!({"kind": kind, "scope": scope}),
        )
        .await
    }

    async fn link_payment(&self, link: &PaymentLink) -> Result<(), ConciergeError> {
        self.call_unit("obligations/link_payment", &json!(link)).await?;
        info!(
            kind = %link.kind,
            obligation_id = %link.obligation_id,
            payment_id = %link.payment_id,
            "payment linked"
        );
        Ok(())
    }
}

#[async_trait]
impl PaymentRecorder for BackendClient {
    async fn record_slip(
        &self,
        scope: &Scope,
        evidence: &SlipEvidence,
        image_url: Option<&str>,
    ) -> Result<SlipRecord, ConciergeError> {
        self.call(
            "payments/record_slip",
            &json!({"scope": scope, "evidence": evidence, "image_url": image_url}),
        )
        .await
    }
}
