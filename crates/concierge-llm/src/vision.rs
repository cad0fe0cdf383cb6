// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image analysis through the multimodal model.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use concierge_config::model::LlmConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::{CallPolicy, ImageKind, VisionClassifier, VisionReport};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::GenerativeClient;
use crate::recover::recover_object;
use crate::types::{Content, GenerateRequest, GenerationConfig, Part};

/// Confidence assumed when the model omits one.
const DEFAULT_CONFIDENCE: f64 = 0.5;

const VISION_PROMPT: &str = r#"Classify this image sent to a Thai luxury goods store.

image_type is one of:
- "payment_proof": a bank transfer slip or payment confirmation screenshot
- "product_image": a photo of a watch, bag, jewelry or other item
- "generic": anything else

For payment_proof, extract details: amount (number only), bank, date, ref (transaction reference), sender_name.
For product_image, extract details: brand, model, category, color.

Reply with JSON only:
{"image_type": "...", "confidence": 0.0-1.0, "details": {}, "description": "short Thai description"}"#;

/// Classifies images by downloading them and asking the model.
#[derive(Debug, Clone)]
pub struct LlmVision {
    client: GenerativeClient,
    policy: CallPolicy,
}

impl LlmVision {
    pub fn new(client: GenerativeClient, config: &LlmConfig) -> Self {
        Self {
            client,
            policy: CallPolicy {
                timeout: Duration::from_secs(config.vision_timeout_seconds),
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        }
    }
}

#[async_trait]
impl VisionClassifier for LlmVision {
    async fn analyze(&self, image_url: &str) -> Result<VisionReport, ConciergeError> {
        let (mime, bytes) = self.client.fetch_image(image_url, self.policy.timeout).await?;
        debug!(mime = %mime, size = bytes.len(), "image downloaded for analysis");

        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::text(VISION_PROMPT),
                Part::inline(mime, STANDARD.encode(&bytes)),
            ])],
            system_instruction: None,
            generation_config: GenerationConfig {
                max_output_tokens: 512,
                temperature: 0.1,
            },
        };
        let raw = self.client.generate(&request, Some(self.policy)).await?;
        let report = parse_report(&raw)?;
        info!(
            image_type = %report.image_type,
            confidence = report.confidence,
            "image analyzed"
        );
        Ok(report)
    }
}

/// Builds a report from model output.
///
/// Missing confidence reads as 0.5. Without a `details` object, the other
/// root fields are taken as the details.
pub fn parse_report(raw: &str) -> Result<VisionReport, ConciergeError> {
    let mut object = recover_object(raw).ok_or_else(|| ConciergeError::Parse {
        message: "parse_error: vision output is not JSON".into(),
    })?;

    let image_type = object
        .remove("image_type")
        .and_then(|v| v.as_str().map(ImageKind::parse_label))
        .unwrap_or_default();
    let confidence = object
        .remove("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);
    let description = object
        .remove("description")
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|d| !d.trim().is_empty());

    let details = match object.remove("details") {
        Some(Value::Object(details)) => details,
        _ => object
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect::<Map<String, Value>>(),
    };

    Ok(VisionReport {
        image_type,
        confidence,
        details,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_complete_report() {
        let raw = r#"{"image_type": "payment_proof", "confidence": 0.93,
            "details": {"amount": "15,000.00", "bank": "KBank"}, "description": "สลิปโอนเงิน"}"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.image_type, ImageKind::PaymentProof);
        assert_eq!(report.confidence, 0.93);
        assert_eq!(report.details["bank"], "KBank");
        assert_eq!(report.description.as_deref(), Some("สลิปโอนเงิน"));
    }

    #[test]
    fn missing_confidence_defaults_and_root_fields_become_details() {
        let raw = "```json\n{\"image_type\": \"slip\", \"amount\": 2500, \"ref\": \"TX1\", \"bank\": null}\n```";
        let report = parse_report(raw).unwrap();
        assert_eq!(report.image_type, ImageKind::PaymentProof);
        assert_eq!(report.confidence, 0.5);
        assert_eq!(report.details["amount"], 2500);
        assert_eq!(report.details["ref"], "TX1");
        assert!(!report.details.contains_key("bank"));
    }

    #[test]
    fn unknown_type_is_generic() {
        let report = parse_report(r#"{"image_type": "selfie", "confidence": 0.8}"#).unwrap();
        assert_eq!(report.image_type, ImageKind::Generic);
        assert!(report.details.is_empty());
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = parse_report("looks like a watch").unwrap_err();
        assert!(err.to_string().contains("parse_error"));
    }
}
