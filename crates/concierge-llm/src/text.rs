// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text completion through the model.

use async_trait::async_trait;
use concierge_core::traits::{TextGenerator, TextRequest};
use concierge_core::{ChatMessage, ConciergeError, MessageRole};

use crate::client::GenerativeClient;
use crate::types::{Content, GenerateRequest, GenerationConfig, Part};

#[derive(Debug, Clone)]
pub struct LlmText {
    client: GenerativeClient,
}

impl LlmText {
    pub fn new(client: GenerativeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for LlmText {
    async fn complete(&self, request: TextRequest) -> Result<String, ConciergeError> {
        let body = GenerateRequest {
            contents: contents_with_history(&request.history, request.prompt),
            system_instruction: request.system.map(Content::instruction),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };
        self.client.generate(&body, request.policy).await
    }
}

/// Conversation turns followed by the new user prompt.
pub(crate) fn contents_with_history(history: &[ChatMessage], prompt: String) -> Vec<Content> {
    history
        .iter()
        .filter(|m| !m.text.trim().is_empty())
        .map(|m| match m.role {
            MessageRole::User => Content::user(vec![Part::text(m.text.clone())]),
            MessageRole::Bot | MessageRole::Admin => Content::model(m.text.clone()),
        })
        .chain(std::iter::once(Content::user(vec![Part::text(prompt)])))
        .collect()
}
