// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context-aware rewriting of ambiguous product queries.
//!
//! "มีสีน้ำเงินมั้ย" means nothing on its own; after a conversation about
//! Rolex watches it means "นาฬิกา Rolex สีน้ำเงิน". The rewriter asks the text
//! model for that expansion and, in the same call, whether the message is
//! chit-chat that should not be searched at all.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use concierge_config::model::LlmConfig;
use concierge_core::traits::{CallPolicy, TextGenerator, TextRequest};
use concierge_core::{ChatMessage, MessageRole};
use regex::Regex;
use serde::Deserialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::heuristics::is_product_code;

/// Messages of history the rewriter looks at.
const HISTORY_WINDOW: usize = 5;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("valid regex"));

/// Where a rewrite result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RewriteSource {
    NoRewriteNeeded,
    NoLlmAvailable,
    LlmError,
    LlmRewrite,
    ParseFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub rewritten: String,
    pub is_chit_chat: bool,
    pub source: RewriteSource,
}

impl Rewrite {
    fn unchanged(query: &str, source: RewriteSource) -> Self {
        Self {
            rewritten: query.to_string(),
            is_chit_chat: false,
            source,
        }
    }
}

#[derive(Deserialize)]
struct ModelVerdict {
    #[serde(default)]
    rewritten: Option<String>,
    #[serde(default)]
    is_chit_chat: bool,
}

/// Rewrites queries with the optional text model.
#[derive(Clone)]
pub struct QueryRewriter {
    text: Option<Arc<dyn TextGenerator>>,
    policy: CallPolicy,
}

impl QueryRewriter {
    pub fn new(text: Option<Arc<dyn TextGenerator>>, llm: &LlmConfig) -> Self {
        Self {
            text,
            policy: CallPolicy {
                timeout: Duration::from_secs(llm.rewrite_timeout_seconds),
                max_retries: llm.rewrite_max_retries,
                backoff: Duration::from_millis(llm.rewrite_backoff_ms),
            },
        }
    }

    /// Never fails: every problem degrades to the original query.
    pub async fn rewrite(&self, query: &str, history: &[ChatMessage]) -> Rewrite {
        if history.is_empty() || is_product_code(query) {
            return Rewrite::unchanged(query, RewriteSource::NoRewriteNeeded);
        }
        let Some(text) = &self.text else {
            return Rewrite::unchanged(query, RewriteSource::NoLlmAvailable);
        };

        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let request = TextRequest {
            prompt: rewrite_prompt(query, &history[start..]),
            max_tokens: 150,
            temperature: 0.1,
            policy: Some(self.policy),
            ..TextRequest::default()
        };

        let raw = match text.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "query rewrite call failed");
                return Rewrite::unchanged(query, RewriteSource::LlmError);
            }
        };

        match parse_verdict(&raw) {
            Some(verdict) => {
                let rewritten = verdict
                    .rewritten
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| query.to_string());
                if rewritten != query {
                    info!(original = query, rewritten = %rewritten, "query rewritten from context");
                }
                Rewrite {
                    rewritten,
                    is_chit_chat: verdict.is_chit_chat,
                    source: RewriteSource::LlmRewrite,
                }
            }
            None => {
                debug!(raw = %raw, "rewrite output had no usable JSON object");
                Rewrite::unchanged(query, RewriteSource::ParseFailed)
            }
        }
    }
}

impl std::fmt::Debug for QueryRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRewriter")
            .field("text", &self.text.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

/// The first flat `{...}` object in the model output.
fn parse_verdict(raw: &str) -> Option<ModelVerdict> {
    let object = JSON_OBJECT.find(raw)?;
    serde_json::from_str(object.as_str()).ok()
}

fn rewrite_prompt(query: &str, history: &[ChatMessage]) -> String {
    let transcript = history
        .iter()
        .map(|m| {
            let who = match m.role {
                MessageRole::User => "ลูกค้า",
                MessageRole::Bot | MessageRole::Admin => "ร้าน",
            };
            format!("{who}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a Thai e-commerce chatbot assistant for a luxury second-hand goods store.

Analyze the user's current message in context of the conversation history.

## Task
1. If the message is a PRODUCT SEARCH query (asking about products, colors, features, prices):
   rewrite it into a clear product search query in Thai, including the product type or brand mentioned earlier.
2. If the message is CHIT-CHAT (greetings, thanks, general talk not about products): mark it as chit-chat.

## Conversation History:
{transcript}

## Current Message: "{query}"

## Output Format (JSON only):
{{"rewritten": "rewritten search query or original", "is_chit_chat": true/false}}

Respond with JSON only:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use concierge_test_utils::MockText;

    fn history() -> Vec<ChatMessage> {
        vec![ChatMessage {
            role: MessageRole::User,
            text: "มี rolex ไหม".to_string(),
            at: Utc::now(),
        }]
    }

    fn rewriter(text: Option<MockText>) -> QueryRewriter {
        QueryRewriter::new(
            text.map(|t| Arc::new(t) as Arc<dyn TextGenerator>),
            &LlmConfig::default(),
        )
    }

    #[tokio::test]
    async fn skips_without_history_or_for_codes() {
        let r = rewriter(Some(MockText::with_responses(vec![])));
        let no_history = r.rewrite("สีน้ำเงิน", &[]).await;
        assert_eq!(no_history.source, RewriteSource::NoRewriteNeeded);
        let code = r.rewrite("RLX-0012", &history()).await;
        assert_eq!(code.source, RewriteSource::NoRewriteNeeded);
        assert_eq!(code.rewritten, "RLX-0012");
    }

    #[tokio::test]
    async fn no_model_keeps_the_query() {
        let r = rewriter(None);
        let out = r.rewrite("มีสีน้ำเงินมั้ย", &history()).await;
        assert_eq!(out.source, RewriteSource::NoLlmAvailable);
        assert_eq!(out.rewritten, "มีสีน้ำเงินมั้ย");
    }

    #[tokio::test]
    async fn parses_the_first_object_in_chatty_output() {
        let text = MockText::with_responses(vec![
            "Sure! {\"rewritten\": \"นาฬิกา Rolex สีน้ำเงิน\", \"is_chit_chat\": false} hope it helps",
        ]);
        let r = rewriter(Some(text));
        let out = r.rewrite("มีสีน้ำเงินมั้ย", &history()).await;
        assert_eq!(out.source, RewriteSource::LlmRewrite);
        assert_eq!(out.rewritten, "นาฬิกา Rolex สีน้ำเงิน");
        assert!(!out.is_chit_chat);
    }

    #[tokio::test]
    async fn flags_chit_chat() {
        let text = MockText::with_responses(vec![
            r#"{"rewritten": "ขอบคุณครับ", "is_chit_chat": true}"#,
        ]);
        let out = rewriter(Some(text)).rewrite("ขอบคุณครับ", &history()).await;
        assert!(out.is_chit_chat);
    }

    #[tokio::test]
    async fn failures_keep_the_query() {
        let r = rewriter(Some(MockText::with_responses(vec!["no json here"])));
        let parse = r.rewrite("มีสีน้ำเงินมั้ย", &history()).await;
        assert_eq!(parse.source, RewriteSource::ParseFailed);

        // The queue is now empty, so the mock errors.
        let error = r.rewrite("มีสีน้ำเงินมั้ย", &history()).await;
        assert_eq!(error.source, RewriteSource::LlmError);
        assert_eq!(error.rewritten, "มีสีน้ำเงินมั้ย");
    }
}
