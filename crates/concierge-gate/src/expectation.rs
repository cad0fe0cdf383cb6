// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching replies against a question the bot asked.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

static YES_NO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(ใช่|ไม่|yes|no|ok|ได้|ไม่ได้|ตกลง|ยกเลิก|cancel|1|2)$").expect("valid regex")
});

static SELECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9]$").expect("valid regex"));

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0[0-9]{8,9}$").expect("valid regex"));

static PRODUCT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9\-]{3,}$").expect("valid regex"));

static QUICK_REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([1-9]|ใช่|ไม่|yes|no|ok|โอเค|ได้|ไม่ได้|ตกลง|ยกเลิก|cancel)$").expect("valid regex")
});

/// Shape of the answer the bot is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedInput {
    #[serde(alias = "quantity")]
    Number,
    #[serde(alias = "confirm")]
    YesNo,
    Selection,
    Phone,
    Address,
    Name,
    ProductCode,
    Any,
}

impl ExpectedInput {
    /// Answer shape for a case slot, by slot name. Photo slots are filled by
    /// image messages, so they have no text shape.
    pub fn for_slot_name(slot: &str) -> Option<Self> {
        if slot.ends_with("photo") || slot.contains("image") {
            return None;
        }
        Some(match slot {
            "phone" | "phone_number" => Self::Phone,
            "address" | "shipping_address" => Self::Address,
            "name" | "customer_name" => Self::Name,
            "product_code" | "code" => Self::ProductCode,
            "amount" | "quantity" => Self::Number,
            _ => Self::Any,
        })
    }

    /// Whether `text` is an acceptable answer of this shape.
    pub fn matches(self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        match self {
            Self::Number => NUMBER.is_match(text),
            Self::YesNo => YES_NO.is_match(text),
            Self::Selection => SELECTION.is_match(text),
            Self::Phone => {
                let digits: String = text
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '-')
                    .collect();
                PHONE.is_match(&digits)
            }
            Self::Address => text.chars().count() >= 10,
            Self::Name => (2..=100).contains(&text.chars().count()),
            Self::ProductCode => PRODUCT_CODE.is_match(text),
            Self::Any => true,
        }
    }
}

/// An active expectation stored in Quick State.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwaitingInput {
    pub kind: ExpectedInput,
    /// Slot the answer fills, when the question was about one.
    #[serde(default)]
    pub slot: Option<String>,
    /// Case that owns `slot`.
    #[serde(default)]
    pub case_id: Option<String>,
}

impl AwaitingInput {
    /// Expectation for a text answer to a case slot question, when the slot takes text.
    pub fn for_case_slot(case_id: impl Into<String>, slot: &str) -> Option<Self> {
        let kind = ExpectedInput::for_slot_name(slot)?;
        Some(Self {
            kind,
            slot: Some(slot.to_string()),
            case_id: Some(case_id.into()),
        })
    }
}

/// Bare digits 1-9 and yes/no/ok/cancel tokens, always worth processing.
pub fn is_quick_reply(text: &str) -> bool {
    QUICK_REPLY.is_match(text.trim())
}
