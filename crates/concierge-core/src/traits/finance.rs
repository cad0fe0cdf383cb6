// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order, pawn, installment, and payment collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConciergeError;
use crate::types::{Answer, Scope};

/// Account family for status lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountKind {
    Order,
    Installment,
    Pawn,
    Repair,
    Savings,
}

/// Status lookups and trade-in quotes. Answers are preformatted for the user.
#[async_trait]
pub trait TransactionDesk: Send + Sync {
    async fn status(
        &self,
        kind: AccountKind,
        scope: &Scope,
        reference: Option<&str>,
    ) -> Result<Answer, ConciergeError>;

    /// Trade-in policy, or a quote when `calculate` is set and the text names an item.
    async fn trade_in(
        &self,
        scope: &Scope,
        text: &str,
        calculate: bool,
    ) -> Result<Answer, ConciergeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObligationKind {
    Order,
    Pawn,
    Installment,
}

/// Amount(s) a payment is expected to settle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedAmount {
    Single {
        amount: f64,
    },
    /// A pawn can be settled by paying interest, by full redemption, or against the loan itself.
    Pawn {
        interest: Option<f64>,
        full_redemption: Option<f64>,
        loan: Option<f64>,
    },
}

/// An outstanding financial item a payment may settle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    /// Business-facing number (order no, pawn no, contract no).
    pub reference: String,
    pub kind: ObligationKind,
    pub expected: ExpectedAmount,
    pub recency: DateTime<Utc>,
}

/// A link between a recorded payment and an obligation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentLink {
    pub kind: ObligationKind,
    pub obligation_id: String,
    pub payment_id: String,
    /// Payment subtype (`full`, `interest`, `redemption`, `installment`).
    pub subtype: String,
    pub amount: Option<f64>,
}

#[async_trait]
pub trait ObligationService: Send + Sync {
    async fn find_pending(
        &self,
        kind: ObligationKind,
        scope: &Scope,
    ) -> Result<Vec<Obligation>, ConciergeError>;

    async fn link_payment(&self, link: &PaymentLink) -> Result<(), ConciergeError>;
}

/// Fields extracted from a payment slip image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlipEvidence {
    pub amount: Option<f64>,
    pub bank: Option<String>,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub sender_name: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlipRecord {
    Saved {
        payment_id: String,
        payment_no: String,
    },
    /// The same slip was already recorded.
    Duplicate { existing_payment_no: String },
}

#[async_trait]
pub trait PaymentRecorder: Send + Sync {
    async fn record_slip(
        &self,
        scope: &Scope,
        evidence: &SlipEvidence,
        image_url: Option<&str>,
    ) -> Result<SlipRecord, ConciergeError>;
}
