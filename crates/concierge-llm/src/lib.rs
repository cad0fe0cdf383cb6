// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-backed collaborators for Concierge.
//!
//! [`GenerativeClient`] talks to a Gemini-style `generateContent` endpoint
//! with per-call timeouts and bounded retry. On top of it sit the intent
//! classifier, the vision classifier and the free-text generator.

pub mod classifier;
pub mod client;
pub mod recover;
pub mod text;
pub mod types;
pub mod vision;

use std::sync::Arc;

use concierge_config::model::LlmConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::{IntentClassifier, TextGenerator, VisionClassifier};

pub use classifier::LlmIntentClassifier;
pub use client::GenerativeClient;
pub use text::LlmText;
pub use vision::LlmVision;

/// The model-backed collaborators built from one client.
#[derive(Clone)]
pub struct ModelCollaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub vision: Arc<dyn VisionClassifier>,
    pub text: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for ModelCollaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCollaborators").finish_non_exhaustive()
    }
}

/// Builds the model collaborators, or `None` when the model is disabled.
pub fn from_config(config: &LlmConfig) -> Result<Option<ModelCollaborators>, ConciergeError> {
    if !config.enabled {
        return Ok(None);
    }
    let client = GenerativeClient::from_config(config)?;
    tracing::info!(model = client.model(), "model collaborators enabled");
    Ok(Some(ModelCollaborators {
        classifier: Arc::new(LlmIntentClassifier::new(client.clone())),
        vision: Arc::new(LlmVision::new(client.clone(), config)),
        text: Arc::new(LlmText::new(client)),
    }))
}
