// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Concierge router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Concierge configuration.
///
/// Loaded once at startup from TOML with environment variable overrides.
/// A turn may carry bot-specific JSON that is merged over it (see
/// [`crate::loader::merge_bot_overrides`]). Every section defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotSection,

    /// Admission gate thresholds and keyword lists.
    #[serde(default)]
    pub gatekeeper: GatekeeperConfig,

    /// Duplicate-delivery and repeated-message detection.
    #[serde(default)]
    pub anti_spam: AntiSpamConfig,

    /// Human handoff window.
    #[serde(default)]
    pub handoff: HandoffConfig,

    /// Suppression of the bot's own output echoed back by users.
    #[serde(default)]
    pub echo_filter: EchoFilterConfig,

    /// Case creation behaviour.
    #[serde(default)]
    pub case_management: CaseManagementConfig,

    /// Per case type flow definitions, keyed by case type (`pawn`, `repair`, ...).
    #[serde(default)]
    pub case_flows: BTreeMap<String, CaseFlowConfig>,

    /// Question asked for a missing slot, keyed by slot name.
    #[serde(default = "default_slot_questions")]
    pub slot_questions: BTreeMap<String, String>,

    /// Payment-slip matching tolerances and vision thresholds.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Text and vision model endpoint.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Commerce backend serving catalog, checkout, finance and knowledge calls.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Shop details used for store-info answers.
    #[serde(default)]
    pub store: StoreConfig,

    /// Reply templates.
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Feature switches.
    #[serde(default)]
    pub features: FeaturesConfig,

    /// SQLite storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server for the turn endpoint.
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot: BotSection::default(),
            gatekeeper: GatekeeperConfig::default(),
            anti_spam: AntiSpamConfig::default(),
            handoff: HandoffConfig::default(),
            echo_filter: EchoFilterConfig::default(),
            case_management: CaseManagementConfig::default(),
            case_flows: BTreeMap::new(),
            slot_questions: default_slot_questions(),
            reconciliation: ReconciliationConfig::default(),
            llm: LlmConfig::default(),
            backend: BackendConfig::default(),
            store: StoreConfig::default(),
            templates: TemplatesConfig::default(),
            features: FeaturesConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotSection {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of logged messages passed to the classifier and rewriter.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Exact-match texts that reset any in-progress flow.
    #[serde(default = "default_menu_reset_triggers")]
    pub menu_reset_triggers: Vec<String>,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            history_limit: default_history_limit(),
            menu_reset_triggers: default_menu_reset_triggers(),
        }
    }
}

fn default_bot_name() -> String {
    "concierge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_menu_reset_triggers() -> Vec<String> {
    ["เริ่มใหม่", "ยกเลิก", "เมนู", "menu", "cancel", "stop", "reset"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Admission gate configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatekeeperConfig {
    /// Disabling the gate admits every text message.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Information score below which a message is a skip candidate.
    #[serde(default = "default_skip_threshold")]
    pub skip_threshold: f64,

    /// Low-info messages this soon after a bot reply are dropped.
    #[serde(default = "default_reply_window_seconds")]
    pub reply_window_seconds: u64,

    /// Low-info messages this soon after the previous user message are dropped.
    #[serde(default = "default_rapid_typing_seconds")]
    pub rapid_typing_seconds: u64,

    /// Platforms whose users type faster. Their rapid-typing window is one second shorter.
    #[serde(default = "default_fast_typing_platforms")]
    pub fast_typing_platforms: Vec<String>,

    #[serde(default = "default_true")]
    pub gibberish_detection: bool,

    /// Leading action verbs, unioned with the built-in list.
    #[serde(default)]
    pub action_keywords: Vec<String>,

    /// Product category words, unioned with the built-in list.
    #[serde(default)]
    pub product_keywords: Vec<String>,

    /// Brand names, unioned with the built-in list.
    #[serde(default)]
    pub brand_keywords: Vec<String>,

    /// Freshness window of the message buffer, measured from its first fragment.
    #[serde(default = "default_buffer_window_seconds")]
    pub buffer_window_seconds: u64,

    /// Maximum fragments kept in the buffer.
    #[serde(default = "default_buffer_max_fragments")]
    pub buffer_max_fragments: usize,

    /// How long an awaiting-input expectation stays active.
    #[serde(default = "default_awaiting_input_ttl_seconds")]
    pub awaiting_input_ttl_seconds: u64,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_threshold: default_skip_threshold(),
            reply_window_seconds: default_reply_window_seconds(),
            rapid_typing_seconds: default_rapid_typing_seconds(),
            fast_typing_platforms: default_fast_typing_platforms(),
            gibberish_detection: true,
            action_keywords: Vec::new(),
            product_keywords: Vec::new(),
            brand_keywords: Vec::new(),
            buffer_window_seconds: default_buffer_window_seconds(),
            buffer_max_fragments: default_buffer_max_fragments(),
            awaiting_input_ttl_seconds: default_awaiting_input_ttl_seconds(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_skip_threshold() -> f64 {
    0.3
}

fn default_reply_window_seconds() -> u64 {
    15
}

fn default_rapid_typing_seconds() -> u64 {
    3
}

fn default_fast_typing_platforms() -> Vec<String> {
    vec!["facebook".to_string()]
}

fn default_buffer_window_seconds() -> u64 {
    30
}

fn default_buffer_max_fragments() -> usize {
    5
}

fn default_awaiting_input_ttl_seconds() -> u64 {
    120
}

/// What to do when a user repeats the same message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamAction {
    /// Reply once with `default_reply`.
    #[default]
    Template,
    /// Drop without replying.
    Silent,
    /// Drop and hand the conversation to a human.
    Handoff,
}

/// Anti-spam configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AntiSpamConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Identical text within this window is a duplicate webhook delivery.
    #[serde(default = "default_duplicate_window_seconds")]
    pub duplicate_window_seconds: u64,

    /// Number of earlier identical (normalized) messages that makes a repeat spam.
    #[serde(default = "default_repeat_threshold")]
    pub repeat_threshold: usize,

    #[serde(default = "default_repeat_window_seconds")]
    pub repeat_window_seconds: u64,

    #[serde(default)]
    pub action: SpamAction,

    #[serde(default = "default_spam_reply")]
    pub default_reply: String,
}

impl Default for AntiSpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duplicate_window_seconds: default_duplicate_window_seconds(),
            repeat_threshold: default_repeat_threshold(),
            repeat_window_seconds: default_repeat_window_seconds(),
            action: SpamAction::default(),
            default_reply: default_spam_reply(),
        }
    }
}

fn default_duplicate_window_seconds() -> u64 {
    3
}

fn default_repeat_threshold() -> usize {
    3
}

fn default_repeat_window_seconds() -> u64 {
    25
}

fn default_spam_reply() -> String {
    "ได้รับข้อความแล้วนะคะ รบกวนรอแอดมินสักครู่ค่ะ".to_string()
}

/// Human handoff configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffConfig {
    /// Automated replies stay suppressed this long after an admin message.
    #[serde(default = "default_handoff_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_handoff_timeout_seconds(),
        }
    }
}

fn default_handoff_timeout_seconds() -> u64 {
    300
}

/// Echo filter configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EchoFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Extra regular expressions matching bot output, added to the built-in set.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for EchoFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
        }
    }
}

/// Case management configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaseManagementConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Open cases automatically for caseable intents.
    #[serde(default = "default_true")]
    pub auto_create: bool,

    /// Only reuse an open case created on the same calendar day (UTC).
    #[serde(default)]
    pub same_day_only: bool,

    /// Phrases that request a human.
    #[serde(default = "default_admin_handoff_triggers")]
    pub admin_handoff_triggers: Vec<String>,
}

impl Default for CaseManagementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_create: true,
            same_day_only: false,
            admin_handoff_triggers: default_admin_handoff_triggers(),
        }
    }
}

fn default_admin_handoff_triggers() -> Vec<String> {
    ["คุยกับแอดมิน", "ขอคุยกับคน", "ติดต่อพนักงาน", "ขอแอดมิน", "talk to admin", "human"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Flow definition for one case type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFlowConfig {
    /// Intent labels that open this case type. Checked before the built-in table.
    #[serde(default)]
    pub trigger_intents: Vec<String>,

    #[serde(default)]
    pub required_slots: Vec<String>,

    /// Extra required slots keyed by sub-action (`new`, `pay`, `redeem`, ...).
    #[serde(default)]
    pub conditional_slots: BTreeMap<String, Vec<String>>,
}

fn default_slot_questions() -> BTreeMap<String, String> {
    [
        ("product_code", "รบกวนขอรหัสสินค้าหรือรูปสินค้าที่สนใจด้วยนะคะ"),
        ("product_name", "สนใจสินค้าชิ้นไหนคะ บอกชื่อหรือรุ่นได้เลยค่ะ"),
        ("phone", "รบกวนขอเบอร์โทรติดต่อด้วยนะคะ"),
        ("address", "รบกวนขอที่อยู่สำหรับจัดส่งด้วยนะคะ"),
        ("amount", "ยอดที่ต้องการชำระเท่าไหร่คะ"),
        ("item_photo", "รบกวนส่งรูปสินค้าที่ต้องการประเมินมาได้เลยค่ะ"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Reconciliation tolerances (currency units) and vision confidence thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconciliationConfig {
    #[serde(default = "default_one")]
    pub order_tolerance: f64,

    #[serde(default = "default_one")]
    pub pawn_interest_tolerance: f64,

    #[serde(default = "default_redemption_tolerance")]
    pub pawn_redemption_tolerance: f64,

    #[serde(default = "default_one")]
    pub pawn_loan_tolerance: f64,

    #[serde(default = "default_installment_tolerance")]
    pub installment_tolerance: f64,

    /// Minimum vision confidence to treat an image as a payment slip.
    #[serde(default = "default_payment_confidence")]
    pub payment_confidence: f64,

    /// Minimum vision confidence to treat an image as a product photo.
    #[serde(default = "default_product_confidence")]
    pub product_confidence: f64,

    /// Lower payment threshold applied when a checkout or order is pending.
    #[serde(default = "default_context_confidence")]
    pub context_confidence: f64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            order_tolerance: default_one(),
            pawn_interest_tolerance: default_one(),
            pawn_redemption_tolerance: default_redemption_tolerance(),
            pawn_loan_tolerance: default_one(),
            installment_tolerance: default_installment_tolerance(),
            payment_confidence: default_payment_confidence(),
            product_confidence: default_product_confidence(),
            context_confidence: default_context_confidence(),
        }
    }
}

fn default_one() -> f64 {
    1.0
}

fn default_redemption_tolerance() -> f64 {
    10.0
}

fn default_installment_tolerance() -> f64 {
    100.0
}

fn default_payment_confidence() -> f64 {
    0.4
}

fn default_product_confidence() -> f64 {
    0.5
}

fn default_context_confidence() -> f64 {
    0.3
}

/// Language model endpoint configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the generateContent-style API.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key. `None` requires `CONCIERGE_LLM_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_vision_timeout_seconds")]
    pub vision_timeout_seconds: u64,

    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,

    /// Linear backoff base: retry `n` waits `n * retry_backoff_ms`.
    #[serde(default = "default_llm_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_rewrite_timeout_seconds")]
    pub rewrite_timeout_seconds: u64,

    #[serde(default = "default_rewrite_max_retries")]
    pub rewrite_max_retries: u32,

    #[serde(default = "default_rewrite_backoff_ms")]
    pub rewrite_backoff_ms: u64,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    /// System prompt for free-text fallback answers.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_seconds: default_llm_timeout_seconds(),
            vision_timeout_seconds: default_vision_timeout_seconds(),
            max_retries: default_llm_max_retries(),
            retry_backoff_ms: default_llm_backoff_ms(),
            rewrite_timeout_seconds: default_rewrite_timeout_seconds(),
            rewrite_max_retries: default_rewrite_max_retries(),
            rewrite_backoff_ms: default_rewrite_backoff_ms(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            system_prompt: None,
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_llm_timeout_seconds() -> u64 {
    10
}

fn default_vision_timeout_seconds() -> u64 {
    30
}

fn default_llm_max_retries() -> u32 {
    2
}

fn default_llm_backoff_ms() -> u64 {
    1000
}

fn default_rewrite_timeout_seconds() -> u64 {
    5
}

fn default_rewrite_max_retries() -> u32 {
    1
}

fn default_rewrite_backoff_ms() -> u64 {
    300
}

fn default_llm_max_tokens() -> u32 {
    1024
}

fn default_llm_temperature() -> f32 {
    0.3
}

/// Commerce backend endpoint.
///
/// Every collaborator call is a JSON `POST {base_url}/{operation}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL. `None` leaves `serve` unable to start.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sent as a bearer token when set.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_backend_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_backend_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backend_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_seconds: default_backend_timeout_seconds(),
            max_retries: default_backend_max_retries(),
            retry_backoff_ms: default_backend_backoff_ms(),
        }
    }
}

fn default_backend_timeout_seconds() -> u64 {
    10
}

fn default_backend_max_retries() -> u32 {
    1
}

fn default_backend_backoff_ms() -> u64 {
    500
}

/// Shop details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub line_id: Option<String>,
    #[serde(default)]
    pub map_url: Option<String>,
}

/// Reply templates. `{name}` placeholders are filled at reply time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_thanks")]
    pub thanks: String,
    #[serde(default = "default_goodbye")]
    pub goodbye: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_error")]
    pub error: String,
    #[serde(default = "default_handoff")]
    pub handoff: String,
    #[serde(default = "default_video_call")]
    pub video_call: String,
    #[serde(default = "default_negotiation")]
    pub negotiation: String,
    #[serde(default = "default_ask_product_code")]
    pub ask_product_code: String,
    #[serde(default = "default_product_not_found")]
    pub product_not_found: String,
    #[serde(default = "default_deposit_ask_product")]
    pub deposit_ask_product: String,
    #[serde(default = "default_pawn_intro")]
    pub pawn_intro: String,
    #[serde(default = "default_pawn_image_received")]
    pub pawn_image_received: String,
    #[serde(default = "default_image_clarify")]
    pub image_clarify: String,
    #[serde(default = "default_image_error")]
    pub image_error: String,
    #[serde(default = "default_image_received")]
    pub image_received: String,
    #[serde(default = "default_image_search_no_result")]
    pub image_search_no_result: String,
    #[serde(default = "default_slip_saved")]
    pub slip_saved: String,
    #[serde(default = "default_slip_unmatched")]
    pub slip_unmatched: String,
    #[serde(default = "default_slip_duplicate")]
    pub slip_duplicate: String,
    #[serde(default = "default_slip_received")]
    pub slip_received: String,

    /// Sent once every required slot of a case has an answer.
    #[serde(default = "default_slots_complete")]
    pub slots_complete: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            thanks: default_thanks(),
            goodbye: default_goodbye(),
            fallback: default_fallback(),
            error: default_error(),
            handoff: default_handoff(),
            video_call: default_video_call(),
            negotiation: default_negotiation(),
            ask_product_code: default_ask_product_code(),
            product_not_found: default_product_not_found(),
            deposit_ask_product: default_deposit_ask_product(),
            pawn_intro: default_pawn_intro(),
            pawn_image_received: default_pawn_image_received(),
            image_clarify: default_image_clarify(),
            image_error: default_image_error(),
            image_received: default_image_received(),
            image_search_no_result: default_image_search_no_result(),
            slip_saved: default_slip_saved(),
            slip_unmatched: default_slip_unmatched(),
            slip_duplicate: default_slip_duplicate(),
            slip_received: default_slip_received(),
            slots_complete: default_slots_complete(),
        }
    }
}

fn default_greeting() -> String {
    "สวัสดีค่ะ ยินดีต้อนรับค่ะ สนใจสินค้าชิ้นไหน พิมพ์ชื่อ รุ่น หรือส่งรูปมาได้เลยนะคะ".to_string()
}

fn default_thanks() -> String {
    "ยินดีค่ะ มีอะไรให้ช่วยเพิ่มเติมบอกได้เลยนะคะ".to_string()
}

fn default_goodbye() -> String {
    "ขอบคุณที่แวะมานะคะ แล้วพบกันใหม่ค่ะ".to_string()
}

fn default_fallback() -> String {
    "ขออภัยค่ะ ยังไม่เข้าใจคำถาม รบกวนพิมพ์ชื่อสินค้า รหัสสินค้า หรือส่งรูปมาได้เลยนะคะ".to_string()
}

fn default_error() -> String {
    "ขออภัยค่ะ ระบบขัดข้องชั่วคราว รบกวนลองใหม่อีกครั้ง หรือรอแอดมินติดต่อกลับนะคะ".to_string()
}

fn default_handoff() -> String {
    "รับทราบค่ะ แอดมินจะติดต่อกลับโดยเร็วที่สุดนะคะ".to_string()
}

fn default_video_call() -> String {
    "ได้เลยค่ะ แอดมินจะนัดเวลาวิดีโอคอลให้นะคะ รอสักครู่ค่ะ".to_string()
}

fn default_negotiation() -> String {
    "เรื่องราคาขอให้แอดมินช่วยดูให้นะคะ รอสักครู่ค่ะ".to_string()
}

fn default_ask_product_code() -> String {
    "สนใจชิ้นไหนคะ รบกวนส่งรหัสสินค้าหรือรูปมาได้เลยค่ะ".to_string()
}

fn default_product_not_found() -> String {
    "ยังไม่พบสินค้าที่ตรงกับ \"{query}\" ค่ะ ลองพิมพ์ชื่อรุ่นหรือส่งรูปมาได้นะคะ".to_string()
}

fn default_deposit_ask_product() -> String {
    "ต้องการมัดจำสินค้าชิ้นไหนคะ รบกวนส่งรหัสสินค้าหรือรูปมาได้เลยค่ะ".to_string()
}

fn default_pawn_intro() -> String {
    "รับฝากได้ค่ะ รบกวนส่งรูปสินค้าพร้อมใบรับประกัน (ถ้ามี) มาให้แอดมินประเมินนะคะ".to_string()
}

fn default_pawn_image_received() -> String {
    "ได้รับรูปแล้วค่ะ แอดมินจะประเมินราคาและแจ้งกลับโดยเร็วนะคะ".to_string()
}

fn default_image_clarify() -> String {
    "ได้รับรูปแล้วค่ะ รบกวนเลือกว่าส่งรูปนี้เพื่ออะไรนะคะ หรือพิมพ์บอกรายละเอียดเพิ่มเติมได้เลยค่ะ".to_string()
}

fn default_image_error() -> String {
    "รับรูปไม่ได้ค่ะ รบกวนลองส่งใหม่อีกครั้งนะคะ".to_string()
}

fn default_image_received() -> String {
    "ได้รับรูปแล้วค่ะ แอดมินจะตรวจสอบให้นะคะ".to_string()
}

fn default_image_search_no_result() -> String {
    "ยังไม่พบสินค้าที่ตรงกับรูปนี้ค่ะ{description} ลองพิมพ์ชื่อรุ่นมาได้นะคะ".to_string()
}

fn default_slip_saved() -> String {
    "ได้รับสลิปแล้วค่ะ ยอด {amount} บาท เลขที่ {payment_no} ผูกกับ {reference} เรียบร้อยค่ะ".to_string()
}

fn default_slip_unmatched() -> String {
    "ได้รับสลิปแล้วค่ะ ยอด {amount} บาท เลขที่ {payment_no} แอดมินจะตรวจสอบและยืนยันให้นะคะ".to_string()
}

fn default_slip_duplicate() -> String {
    "สลิปนี้ได้รับไปแล้วค่ะ เลขที่อ้างอิง {payment_no}".to_string()
}

fn default_slip_received() -> String {
    "ได้รับสลิปแล้วค่ะ แอดมินจะตรวจสอบให้นะคะ".to_string()
}

fn default_slots_complete() -> String {
    "ได้รับข้อมูลครบแล้วค่ะ แอดมินจะดำเนินการต่อให้นะคะ".to_string()
}

/// Feature switches.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub query_rewrite: bool,

    #[serde(default = "default_true")]
    pub early_checkout: bool,

    #[serde(default = "default_true")]
    pub image_search: bool,

    #[serde(default = "default_true")]
    pub llm_fallback: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            query_rewrite: true,
            early_checkout: true,
            image_search: true,
            llm_fallback: true,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("concierge").join("concierge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("concierge.db"))
        .to_string_lossy()
        .into_owned()
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gatekeeper_matches_documented_windows() {
        let gk = GatekeeperConfig::default();
        assert_eq!(gk.skip_threshold, 0.3);
        assert_eq!(gk.reply_window_seconds, 15);
        assert_eq!(gk.rapid_typing_seconds, 3);
        assert_eq!(gk.buffer_window_seconds, 30);
        assert_eq!(gk.buffer_max_fragments, 5);
    }

    #[test]
    fn default_reconciliation_tolerances() {
        let rc = ReconciliationConfig::default();
        assert_eq!(rc.order_tolerance, 1.0);
        assert_eq!(rc.pawn_redemption_tolerance, 10.0);
        assert_eq!(rc.installment_tolerance, 100.0);
        assert!(rc.context_confidence < rc.payment_confidence);
        assert!(rc.payment_confidence < rc.product_confidence);
    }

    #[test]
    fn spam_action_parses_snake_case() {
        let cfg: AntiSpamConfig = serde_json::from_str(r#"{"action": "handoff"}"#).unwrap();
        assert_eq!(cfg.action, SpamAction::Handoff);
        assert_eq!(cfg.repeat_threshold, 3);
    }
}
