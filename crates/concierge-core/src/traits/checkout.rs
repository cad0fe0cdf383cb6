// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-step checkout collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConciergeError;
use crate::types::{Answer, Product, Scope};

/// Checkout step during which the flow is collecting a shipping address.
pub const STEP_ASK_ADDRESS: &str = "ask_address";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Full,
    Installment,
    Deposit,
    Savings,
}

/// In-progress checkout, owned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutState {
    pub step: String,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfirmation {
    pub answer: Answer,
    #[serde(default)]
    pub order_no: Option<String>,
}

#[async_trait]
pub trait CheckoutFlow: Send + Sync {
    async fn state(&self, scope: &Scope) -> Result<Option<CheckoutState>, ConciergeError>;

    /// Offers the turn to the active checkout. `None` means the flow did not consume it.
    async fn handle(&self, scope: &Scope, text: &str) -> Result<Option<Answer>, ConciergeError>;

    async fn clear(&self, scope: &Scope) -> Result<(), ConciergeError>;

    async fn start(
        &self,
        scope: &Scope,
        product: &Product,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError>;

    async fn confirm(
        &self,
        scope: &Scope,
        payment_type: PaymentType,
    ) -> Result<CheckoutConfirmation, ConciergeError>;

    async fn cancel(&self, scope: &Scope) -> Result<Answer, ConciergeError>;

    async fn payment_options(
        &self,
        scope: &Scope,
        product: Option<&Product>,
    ) -> Result<Answer, ConciergeError>;

    async fn change_payment_type(
        &self,
        scope: &Scope,
        order_no: &str,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError>;
}
