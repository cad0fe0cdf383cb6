// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closed set of intents understood by the router.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// An intent label produced by the classifier.
///
/// Unknown labels coming from an external classifier are folded into
/// [`Intent::Unknown`] by [`Intent::parse_label`] so dispatch stays exhaustive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    CheckoutConfirm,
    CheckoutCancel,
    ProductInterest,
    PurchaseIntent,
    ProductLookupByCode,
    ProductLookupByImage,
    ProductAvailability,
    ProductSearch,
    PriceInquiry,
    BrowseProducts,
    FollowUpInfo,
    DepositFlow,
    DepositNew,
    InstallmentCheck,
    InstallmentFlow,
    InstallmentNew,
    InstallmentPay,
    InstallmentExtend,
    InstallmentInquiry,
    PawnCheck,
    PawnNew,
    PawnInquiry,
    PawnPayInterest,
    PawnRedeem,
    RepairCheck,
    RepairNew,
    RepairInquiry,
    SavingsCheck,
    SavingsNew,
    SavingsDeposit,
    SavingsInquiry,
    OrderCheck,
    OrderStatus,
    ChangePaymentMethod,
    PaymentOptions,
    PaymentSlipVerify,
    AdminHandoff,
    RequestVideoCall,
    PriceNegotiation,
    TradeInInquiry,
    TradeInCalculate,
    Greeting,
    Thanks,
    Goodbye,
    Chitchat,
    Unknown,
    Fallback,
}

impl Intent {
    /// Parses a classifier label, accepting common aliases.
    ///
    /// Anything unrecognised becomes [`Intent::Unknown`].
    pub fn parse_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if let Ok(intent) = Self::from_str(&normalized) {
            return intent;
        }
        match normalized.as_str() {
            "hello" | "hi" | "welcome" | "general_greeting" => Self::Greeting,
            "thank_you" | "thankyou" => Self::Thanks,
            "bye" | "goodbye_message" => Self::Goodbye,
            "small_talk" | "chit_chat" | "smalltalk" => Self::Chitchat,
            "unclear" | "none" | "other" => Self::Unknown,
            "checkout" | "confirm_order" => Self::CheckoutConfirm,
            "product_lookup" | "search_product" => Self::ProductSearch,
            "handoff" | "talk_to_admin" => Self::AdminHandoff,
            _ => Self::Unknown,
        }
    }

    /// Social or unclassifiable intents. These never open a case.
    pub fn is_social(self) -> bool {
        matches!(
            self,
            Self::Greeting
                | Self::Thanks
                | Self::Goodbye
                | Self::Chitchat
                | Self::Unknown
                | Self::Fallback
        )
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Result of intent classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
    /// Extracted slots (product code, amount, index, ...).
    #[serde(default)]
    pub slots: BTreeMap<String, serde_json::Value>,
    /// How the intent was decided (`llm`, `keyword`, `regex`, ...).
    #[serde(default)]
    pub method: String,
}

impl IntentResult {
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence,
            slots: BTreeMap::new(),
            method: String::new(),
        }
    }

    pub fn with_slot(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    /// String slot accessor. Numbers are rendered as strings.
    pub fn slot_str(&self, key: &str) -> Option<String> {
        match self.slots.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn labels_round_trip_through_display() {
        for intent in Intent::iter() {
            assert_eq!(Intent::parse_label(&intent.to_string()), intent);
        }
    }

    #[test]
    fn aliases_fold_into_known_intents() {
        assert_eq!(Intent::parse_label("hello"), Intent::Greeting);
        assert_eq!(Intent::parse_label("Thank-You"), Intent::Thanks);
        assert_eq!(Intent::parse_label("small talk"), Intent::Chitchat);
        assert_eq!(Intent::parse_label("something_new"), Intent::Unknown);
    }

    #[test]
    fn social_intents_are_flagged() {
        assert!(Intent::Greeting.is_social());
        assert!(Intent::Fallback.is_social());
        assert!(!Intent::ProductSearch.is_social());
        assert!(!Intent::PawnInquiry.is_social());
    }

    #[test]
    fn slot_str_renders_numbers() {
        let result = IntentResult::new(Intent::ProductInterest, 0.9)
            .with_slot("index", 2)
            .with_slot("code", " RLX-0012 ");
        assert_eq!(result.slot_str("index").as_deref(), Some("2"));
        assert_eq!(result.slot_str("code").as_deref(), Some("RLX-0012"));
        assert_eq!(result.slot_str("missing"), None);
    }
}
