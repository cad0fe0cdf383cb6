// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent, vision, and free-text model collaborators.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConciergeError;
use crate::intent::IntentResult;
use crate::types::ChatMessage;

/// Classifies a text turn into an intent with slots.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        history: &[ChatMessage],
    ) -> Result<IntentResult, ConciergeError>;
}

/// What the vision model believes an image shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageKind {
    PaymentProof,
    ProductImage,
    #[default]
    Generic,
}

impl ImageKind {
    /// Lenient parse of a model label.
    pub fn parse_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "payment_proof" | "payment_slip" | "slip" | "transfer_slip" | "receipt" => {
                Self::PaymentProof
            }
            "product_image" | "product" | "product_photo" => Self::ProductImage,
            _ => Self::Generic,
        }
    }
}

impl<'de> Deserialize<'de> for ImageKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse_label(&label))
    }
}

/// Structured output of the vision collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionReport {
    pub image_type: ImageKind,
    pub confidence: f64,
    /// Extracted fields (amount, bank, date, reference, sender name, ...).
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[async_trait]
pub trait VisionClassifier: Send + Sync {
    async fn analyze(&self, image_url: &str) -> Result<VisionReport, ConciergeError>;
}

/// Per-call timeout and retry override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base delay. Attempt `n` waits `backoff * n`.
    pub backoff: Duration,
}

/// A free-text completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub history: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub policy: Option<CallPolicy>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 512,
            temperature: 0.3,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: TextRequest) -> Result<String, ConciergeError>;
}
