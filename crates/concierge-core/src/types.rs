// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the admission gate, router, and collaborators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::case::CaseType;
use crate::intent::Intent;

/// Identifier of the messaging channel (one bot deployment on one platform account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey(pub String);

/// External user identifier as issued by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserKey(pub String);

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (channel, user) pair. All short-lived conversational state is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub channel: ChannelKey,
    pub user: UserKey,
}

impl Scope {
    pub fn new(channel: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            channel: ChannelKey(channel.into()),
            user: UserKey(user.into()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.user)
    }
}

/// Messaging platform the turn arrived on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    #[default]
    Line,
    Facebook,
    Web,
}

/// The raw message carried by an inbound turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    Text {
        #[serde(default)]
        text: String,
    },
    Image {
        #[serde(default)]
        url: Option<String>,
    },
}

impl MessagePayload {
    /// Trimmed text for text messages, empty for images.
    pub fn text(&self) -> &str {
        match self {
            Self::Text { text } => text.trim(),
            Self::Image { .. } => "",
        }
    }
}

/// Inbound turn as delivered by the messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundTurn {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    pub message: MessagePayload,
    /// Platform echo of a message the page itself sent.
    #[serde(default)]
    pub is_echo: bool,
    /// Set by the gateway when an operator typed this message.
    #[serde(default)]
    pub from_admin: bool,
    #[serde(default)]
    pub sender_is_page: bool,
    /// Per-bot configuration overrides, merged over the process configuration.
    #[serde(default)]
    pub bot_config: Option<serde_json::Value>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl InboundTurn {
    /// Builds a text turn for the given scope.
    pub fn text(scope: &Scope, text: impl Into<String>) -> Self {
        Self {
            channel: Some(scope.channel.0.clone()),
            user: Some(scope.user.0.clone()),
            platform: Platform::default(),
            message: MessagePayload::Text { text: text.into() },
            is_echo: false,
            from_admin: false,
            sender_is_page: false,
            bot_config: None,
            trace_id: None,
        }
    }

    /// Builds an image turn for the given scope.
    pub fn image(scope: &Scope, url: Option<String>) -> Self {
        Self {
            message: MessagePayload::Image { url },
            ..Self::text(scope, "")
        }
    }

    /// Returns the scope when both identity fields are present and non-empty.
    pub fn scope(&self) -> Option<Scope> {
        let channel = self.channel.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let user = self.user.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some(Scope::new(channel, user))
    }
}

/// Generates a short random trace id for turns that arrive without one.
pub fn new_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// One button of a quick-reply set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReplyItem {
    pub label: String,
    pub text: String,
}

impl QuickReplyItem {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// A platform-neutral action attached to a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyAction {
    QuickReply { items: Vec<QuickReplyItem> },
    Image { url: String },
}

/// What a handler wants to say. Converted into a [`Reply`] once the reason is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Answer {
    pub text: Option<String>,
    /// Rich payloads (cards, carousels) in a platform-neutral JSON shape.
    pub messages: Vec<serde_json::Value>,
    pub actions: Vec<ReplyAction>,
}

impl Answer {
    /// A deliberate no-reply.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: serde_json::Value) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_quick_replies(mut self, items: Vec<QuickReplyItem>) -> Self {
        if !items.is_empty() {
            self.actions.push(ReplyAction::QuickReply { items });
        }
        self
    }

    /// True when nothing would be sent to the user.
    pub fn is_silent(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty())
            && self.messages.is_empty()
            && self.actions.is_empty()
    }
}

/// Outcome of the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GateReason {
    Empty,
    Gibberish,
    ExpectedInput,
    QuickReply,
    LowInfoAfterReply,
    LowInfoRapid,
    Ok,
}

/// Closed set of routing reasons attached to every reply for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonTag {
    IgnoreEcho,
    MissingContext,
    AdminMessage,
    AdminHandoffActive,
    DuplicateDelivery,
    SpamSilent,
    SpamWarning,
    EchoFilterBotOutput,
    Gatekeeper(GateReason),
    Greeting,
    CheckoutFlow,
    KnowledgeBase,
    EarlyCheckout,
    /// The bot asked for a required case slot, or just received one.
    SlotFilling,
    ProductSearch,
    ProductNotFound,
    ImageError,
    PawnImageReceived,
    ImageClarify,
    ImageSearch,
    ImageSearchNoResult,
    ImageReceived,
    SlipSaved,
    SlipDuplicate,
    SlipReceived,
    /// A routed turn without a handler-specific tag reports the intent label.
    Routed(Intent),
    Error,
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::IgnoreEcho => "ignore_echo",
            Self::MissingContext => "missing_context",
            Self::AdminMessage => "admin_message",
            Self::AdminHandoffActive => "admin_handoff_active",
            Self::DuplicateDelivery => "duplicate_delivery",
            Self::SpamSilent => "spam_silent",
            Self::SpamWarning => "spam_warning",
            Self::EchoFilterBotOutput => "echo_filter_bot_output",
            Self::Gatekeeper(reason) => return write!(f, "gatekeeper_{reason}"),
            Self::Greeting => "greeting",
            Self::CheckoutFlow => "checkout_flow",
            Self::KnowledgeBase => "knowledge_base",
            Self::EarlyCheckout => "early_checkout",
            Self::SlotFilling => "slot_filling",
            Self::ProductSearch => "product_search",
            Self::ProductNotFound => "product_not_found",
            Self::ImageError => "image_error",
            Self::PawnImageReceived => "pawn_image_received",
            Self::ImageClarify => "image_clarify",
            Self::ImageSearch => "image_search",
            Self::ImageSearchNoResult => "image_search_no_result",
            Self::ImageReceived => "image_received",
            Self::SlipSaved => "slip_saved",
            Self::SlipDuplicate => "slip_duplicate",
            Self::SlipReceived => "slip_received",
            Self::Routed(intent) => return write!(f, "{intent}"),
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

impl Serialize for ReasonTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An answer paired with the reason tag of the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub answer: Answer,
    pub reason: ReasonTag,
}

impl Handled {
    pub fn new(answer: Answer, reason: ReasonTag) -> Self {
        Self { answer, reason }
    }

    pub fn text(text: impl Into<String>, reason: ReasonTag) -> Self {
        Self::new(Answer::text(text), reason)
    }

    pub fn into_reply(self, trace_id: impl Into<String>) -> Reply {
        Reply::new(self.answer, self.reason, trace_id)
    }
}

/// Reply metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyMeta {
    pub handler: String,
    pub reason: ReasonTag,
    pub trace_id: String,
}

/// Outbound reply contract consumed by the gateway/formatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub reply_text: Option<String>,
    pub reply_messages: Vec<serde_json::Value>,
    pub actions: Vec<ReplyAction>,
    pub meta: ReplyMeta,
}

/// Handler name reported in reply metadata.
pub const HANDLER_NAME: &str = "concierge_router";

impl Reply {
    pub fn new(answer: Answer, reason: ReasonTag, trace_id: impl Into<String>) -> Self {
        Self {
            reply_text: answer.text.filter(|t| !t.trim().is_empty()),
            reply_messages: answer.messages,
            actions: answer.actions,
            meta: ReplyMeta {
                handler: HANDLER_NAME.to_string(),
                reason,
                trace_id: trace_id.into(),
            },
        }
    }

    /// A deliberate no-reply carrying only the reason.
    pub fn silent(reason: ReasonTag, trace_id: impl Into<String>) -> Self {
        Self::new(Answer::silent(), reason, trace_id)
    }

    pub fn reason(&self) -> ReasonTag {
        self.meta.reason
    }

    pub fn is_silent(&self) -> bool {
        self.reply_text.is_none() && self.reply_messages.is_empty() && self.actions.is_empty()
    }
}

/// Author of a logged chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    User,
    Bot,
    Admin,
}

/// One logged message of a conversation, used as classifier/rewriter history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// A conversation session for one (channel, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub scope: Scope,
    pub platform: Platform,
    pub active_case_id: Option<String>,
    pub active_case_type: Option<CaseType>,
    pub last_admin_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog product as seen by the router.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Internal reference id (stable across code changes).
    #[serde(default)]
    pub ref_id: Option<String>,
    /// Customer-facing product code.
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_tags_render_as_snake_case_labels() {
        assert_eq!(
            ReasonTag::Gatekeeper(GateReason::LowInfoAfterReply).to_string(),
            "gatekeeper_low_info_after_reply"
        );
        assert_eq!(ReasonTag::Gatekeeper(GateReason::Gibberish).to_string(), "gatekeeper_gibberish");
        assert_eq!(ReasonTag::CheckoutFlow.to_string(), "checkout_flow");
        assert_eq!(ReasonTag::Routed(Intent::ProductSearch).to_string(), "product_search");
        assert_eq!(ReasonTag::Error.to_string(), "error");
    }

    #[test]
    fn reply_serializes_reason_as_string() {
        let reply = Reply::new(Answer::text("hi"), ReasonTag::KnowledgeBase, "t-1");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["meta"]["reason"], "knowledge_base");
        assert_eq!(json["meta"]["trace_id"], "t-1");
        assert_eq!(json["reply_text"], "hi");
    }

    #[test]
    fn blank_answer_text_becomes_silent_reply() {
        let reply = Reply::new(Answer::text("   "), ReasonTag::Greeting, "t");
        assert!(reply.is_silent());
    }

    #[test]
    fn inbound_turn_scope_requires_both_identities() {
        let mut turn = InboundTurn::text(&Scope::new("c1", "u1"), "hello");
        assert_eq!(turn.scope(), Some(Scope::new("c1", "u1")));
        turn.user = Some("  ".into());
        assert_eq!(turn.scope(), None);
        turn.user = None;
        assert_eq!(turn.scope(), None);
    }

    #[test]
    fn inbound_turn_deserializes_from_gateway_json() {
        let json = r#"{
            "channel": "line-main",
            "user": "U123",
            "platform": "facebook",
            "message": {"type": "image", "url": "https://cdn/x.jpg"},
            "trace_id": "abc"
        }"#;
        let turn: InboundTurn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.platform, Platform::Facebook);
        assert_eq!(
            turn.message,
            MessagePayload::Image {
                url: Some("https://cdn/x.jpg".into())
            }
        );
        assert!(!turn.is_echo);
    }

    #[test]
    fn quick_replies_are_not_attached_when_empty() {
        let answer = Answer::text("x").with_quick_replies(Vec::new());
        assert!(answer.actions.is_empty());
    }

    #[test]
    fn trace_ids_are_sixteen_hex_chars() {
        let id = new_trace_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
