// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fallback chain for turns no specific handler claims.
//!
//! In order: product search for product-shaped text, knowledge base, store
//! information, a free-text model answer, then the fallback template.

use std::sync::LazyLock;

use concierge_config::model::StoreConfig;
use concierge_core::format::fill;
use concierge_core::traits::TextRequest;
use concierge_core::{ConciergeError, Handled, Intent, ReasonTag};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::heuristics::{is_store_info_question, looks_like_product_query};
use crate::products::SEARCH_LIMIT;
use crate::router::{IntentRouter, RouteTurn};

/// Messages of history sent with a free-text answer request.
const ANSWER_HISTORY: usize = 10;

static REPLY_TEXT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""reply_text"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

const ANSWER_STYLE: &str = "ตอบเป็นภาษาไทย สั้น กระชับ สุภาพ ลงท้ายด้วยค่ะ \
ห้ามแต่งข้อมูลสินค้า ราคา หรือสต็อกที่ไม่รู้ ถ้าไม่แน่ใจให้แนะนำให้ติดต่อแอดมิน \
ตอบเป็นข้อความธรรมดา ไม่ต้องใช้ JSON";

impl IntentRouter {
    pub(crate) async fn fallback(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let text = turn.text.trim();

        if looks_like_product_query(text) {
            match self.collaborators.catalog.search(text, SEARCH_LIMIT).await {
                Ok(found) if !found.products.is_empty() => {
                    info!(results = found.products.len(), "fallback found products");
                    return self.show_products(turn, found.products).await;
                }
                Ok(_) => {
                    return Ok(Handled::text(
                        fill(&self.templates.product_not_found, &[("query", text)]),
                        ReasonTag::ProductNotFound,
                    ));
                }
                Err(e) => warn!(error = %e, "fallback product search failed"),
            }
        }

        match self.collaborators.knowledge.search(text).await {
            Ok(hits) => {
                if let Some(hit) = hits.into_iter().next() {
                    debug!(score = hit.score, "knowledge base answered");
                    return Ok(Handled::text(hit.answer, ReasonTag::KnowledgeBase));
                }
            }
            Err(e) => warn!(error = %e, "knowledge base search failed"),
        }

        if is_store_info_question(text)
            && let Some(info) = store_info(&self.store)
        {
            return Ok(Handled::text(info, ReasonTag::Routed(intent)));
        }

        if let Some(reply) = self.free_text_answer(turn).await {
            return Ok(Handled::text(reply, ReasonTag::Routed(intent)));
        }

        Ok(Handled::text(&self.templates.fallback, ReasonTag::Routed(intent)))
    }

    /// A conversational answer from the text model, if one is configured and usable.
    pub(crate) async fn free_text_answer(&self, turn: &RouteTurn<'_>) -> Option<String> {
        if !self.features.llm_fallback {
            return None;
        }
        let text = self.collaborators.text.as_ref()?;

        let start = turn.history.len().saturating_sub(ANSWER_HISTORY);
        let request = TextRequest {
            system: Some(self.system_prompt()),
            prompt: format!(
                "{ANSWER_STYLE}\n\nคำถามลูกค้า: {}\n\nคำตอบ:",
                turn.text.trim()
            ),
            history: turn.history[start..].to_vec(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            policy: None,
        };

        match text.complete(request).await {
            Ok(raw) => {
                let reply = clean_reply(&raw);
                if reply.is_none() {
                    debug!(raw = %raw, "model answer was empty after cleanup");
                }
                reply
            }
            Err(e) => {
                warn!(error = %e, "free-text answer failed");
                None
            }
        }
    }

    fn system_prompt(&self) -> String {
        if let Some(prompt) = self
            .llm
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            return prompt.to_string();
        }
        let name = self.store.name.as_deref().unwrap_or("ร้านของเรา");
        format!(
            "คุณคือแอดมินของ {name} ร้านสินค้าแบรนด์เนมและเครื่องประดับ \
ให้บริการขาย ผ่อน มัดจำ จำนำ ออมทอง และรับซ่อม พูดจาสุภาพเป็นกันเอง"
        )
    }
}

/// Strips code fences and unwraps `{"reply_text": ...}` envelopes.
///
/// `None` when nothing readable is left.
pub fn clean_reply(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.strip_suffix("```").unwrap_or(rest).trim();
    }

    let reply = if text.starts_with('{') {
        let parsed = serde_json::from_str::<serde_json::Value>(text).ok().and_then(|v| {
            v.get("reply_text")
                .and_then(|r| r.as_str())
                .map(str::to_string)
        });
        match parsed {
            Some(reply) => reply,
            None => {
                let captured = REPLY_TEXT_FIELD.captures(text)?;
                let field = captured.get(1)?.as_str();
                serde_json::from_str::<String>(&format!("\"{field}\""))
                    .unwrap_or_else(|_| field.to_string())
            }
        }
    } else {
        text.to_string()
    };

    let reply = reply.trim();
    (!reply.is_empty()).then(|| reply.to_string())
}

/// Store contact block, or `None` when nothing is configured.
pub fn store_info(store: &StoreConfig) -> Option<String> {
    let lines: Vec<String> = [
        store.name.as_deref().map(|v| format!("ร้าน {v}")),
        store.address.as_deref().map(|v| format!("ที่อยู่: {v}")),
        store.phone.as_deref().map(|v| format!("โทร: {v}")),
        store.hours.as_deref().map(|v| format!("เวลาทำการ: {v}")),
        store.line_id.as_deref().map(|v| format!("LINE: {v}")),
        store.map_url.as_deref().map(|v| format!("แผนที่: {v}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
