// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification through the text model.

use std::collections::BTreeMap;

use async_trait::async_trait;
use concierge_core::traits::IntentClassifier;
use concierge_core::{ChatMessage, ConciergeError, Intent, IntentResult};
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::client::GenerativeClient;
use crate::recover::{extract_number_field, extract_string_field, recover_object};
use crate::text::contents_with_history;
use crate::types::{Content, GenerateRequest, GenerationConfig};

/// Messages of history included in a classification prompt.
const HISTORY_WINDOW: usize = 6;

/// Classifies intents with the configured model.
#[derive(Debug, Clone)]
pub struct LlmIntentClassifier {
    client: GenerativeClient,
}

impl LlmIntentClassifier {
    pub fn new(client: GenerativeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        text: &str,
        history: &[ChatMessage],
    ) -> Result<IntentResult, ConciergeError> {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let request = GenerateRequest {
            contents: contents_with_history(&history[start..], user_prompt(text)),
            system_instruction: Some(Content::instruction(system_prompt())),
            generation_config: GenerationConfig {
                max_output_tokens: 256,
                temperature: 0.0,
            },
        };

        let raw = self.client.generate(&request, None).await?;
        let result = parse_classification(&raw)?;
        debug!(intent = %result.intent, confidence = result.confidence, "model classification");
        Ok(result)
    }
}

/// Reads `{"intent", "confidence", "slots"}` from model output.
///
/// Falls back to pulling the fields out individually when the object is cut
/// off. Output without a readable intent is a parse error.
pub fn parse_classification(raw: &str) -> Result<IntentResult, ConciergeError> {
    if let Some(object) = recover_object(raw) {
        let label = object
            .get("intent")
            .and_then(Value::as_str)
            .ok_or_else(|| ConciergeError::Parse {
                message: "classification has no intent".into(),
            })?;
        let confidence = object
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let slots: BTreeMap<String, Value> = match object.get("slots") {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => BTreeMap::new(),
        };
        return Ok(build(label, confidence, slots, "llm"));
    }

    let label = extract_string_field(raw, "intent").ok_or_else(|| ConciergeError::Parse {
        message: "classification output is not JSON".into(),
    })?;
    warn!("classification JSON was truncated, using partial fields");
    let confidence = extract_number_field(raw, "confidence").unwrap_or(0.0);
    Ok(build(&label, confidence, BTreeMap::new(), "llm_partial"))
}

fn build(label: &str, confidence: f64, slots: BTreeMap<String, Value>, method: &str) -> IntentResult {
    let mut result = IntentResult::new(map_label(label), confidence.clamp(0.0, 1.0));
    result.slots = slots;
    result.method = method.to_string();
    result
}

/// Known labels parse directly; stray purchase or payment wording is folded in.
fn map_label(label: &str) -> Intent {
    let intent = Intent::parse_label(label);
    if intent != Intent::Unknown {
        return intent;
    }
    let lower = label.to_ascii_lowercase();
    if lower.contains("buy") {
        Intent::PurchaseIntent
    } else if lower.contains("pay") {
        Intent::PaymentSlipVerify
    } else {
        Intent::Unknown
    }
}

fn system_prompt() -> String {
    let labels = Intent::iter()
        .filter(|i| *i != Intent::Fallback)
        .map(Intent::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You classify customer messages for a Thai luxury second-hand store that sells watches, \
bags and jewelry, and offers installment, deposit, pawn, savings and repair services.\n\
Allowed intents: {labels}.\n\
Extract slots when present: code (product code such as RLX-0012), keyword (product words to search), \
order_no, amount, product_index (1-based position in a list the bot showed, -1 for the latest), \
product_name_query, from_history (true when the customer picks from products shown earlier), \
trigger (\"code\", \"ask\" or \"general\").\n\
Reply with JSON only: {{\"intent\": \"...\", \"confidence\": 0.0-1.0, \"slots\": {{}}}}"
    )
}

fn user_prompt(text: &str) -> String {
    format!("Customer message: \"{}\"", text.trim())
}
