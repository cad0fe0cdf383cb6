// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Information density scoring.
//!
//! Scores a message in `[0, 1]` from zero-cost signals: length, product codes,
//! numbers, question markers, and keyword families. No network, no model call.

use std::sync::LazyLock;

use concierge_config::model::GatekeeperConfig;
use regex::Regex;

static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(ครับ|ค่ะ|คะ|คับ|นะคะ|นะครับ|จ้า|จ้ะ|จ๊า|ค่า|เค|โอเค|ok|okay|k|kk|อืม|อ่า|อา|เออ|yes|no|y|n)+[!?.\s]*$",
    )
    .expect("valid regex")
});

static PRODUCT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{2,5}-?[A-Za-z0-9]{2,}").expect("valid regex"));

static LONG_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{3,}").expect("valid regex"));

static QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ไหม|มั้ย|เท่าไหร่|ยังไง|อะไร|ที่ไหน|เมื่อไหร่|กี่|how|what|where|when|why|\?)")
        .expect("valid regex")
});

static BUSINESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ราคา|ผ่อน|โอน|มัดจำ|จ่าย|ชำระ|ส่ง|จัดส่ง|ที่อยู่|price|pay|ship|delivery)")
        .expect("valid regex")
});

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(เขต|อำเภอ|ตำบล|จังหวัด|ถนน|ซอย|หมู่|บ้านเลขที่|[0-9]+/[0-9]+)").expect("valid regex")
});

static SELECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9]$").expect("valid regex"));

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0[689][0-9]{7,8}").expect("valid regex"));

static URGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ด่วน|urgent|รีบ|เร่ง|ปัญหา|problem|ช่วย|help|ติดต่อ|แจ้ง)").expect("valid regex")
});

/// Built-in leading action verbs.
pub const DEFAULT_ACTION_KEYWORDS: &[&str] = &[
    "สนใจ", "ซื้อ", "เอา", "ดู", "ขอ", "จอง", "รับ", "ต้องการ", "อยาก", "หา", "เช็ค", "ตรวจ",
    "ถาม", "สอบถาม", "สวัสดี", "ทัก", "hello", "hi",
];

/// Built-in product category words.
pub const DEFAULT_PRODUCT_KEYWORDS: &[&str] = &[
    "นาฬิกา", "แหวน", "สร้อย", "กำไล", "จี้", "ต่างหู", "เพชร", "ทอง", "ทองคำ", "พลอย",
    "ไข่มุก", "เงิน", "กระเป๋า", "watch", "ring", "necklace", "bracelet", "diamond", "gold",
    "bag",
];

/// Built-in brand names.
pub const DEFAULT_BRAND_KEYWORDS: &[&str] = &[
    "rolex", "omega", "patek", "cartier", "audemars", "hublot", "iwc", "panerai", "chanel",
    "hermes", "louis vuitton", "lv", "gucci", "dior", "bulgari", "tiffany", "van cleef",
    "chopard",
];

/// Weight of each independent signal.
const BOOST_PRODUCT_CODE: f64 = 0.6;
const BOOST_NUMBER: f64 = 0.4;
const BOOST_QUESTION: f64 = 0.5;
const BOOST_ACTION: f64 = 0.6;
const BOOST_KEYWORD: f64 = 0.5;
const BOOST_SELECTION: f64 = 0.6;
const BOOST_URGENT: f64 = 0.6;

/// Information density scorer with keyword lists resolved from configuration.
#[derive(Debug, Clone)]
pub struct InfoScorer {
    action: Vec<String>,
    product: Vec<String>,
    brand: Vec<String>,
}

impl InfoScorer {
    /// Unions the built-in keyword lists with the configured ones.
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            action: merge_keywords(DEFAULT_ACTION_KEYWORDS, &config.action_keywords),
            product: merge_keywords(DEFAULT_PRODUCT_KEYWORDS, &config.product_keywords),
            brand: merge_keywords(DEFAULT_BRAND_KEYWORDS, &config.brand_keywords),
        }
    }

    pub fn score(&self, text: &str) -> f64 {
        let text = text.trim();
        if text.is_empty() || FILLER.is_match(text) {
            return 0.0;
        }
        if is_sticker_or_emoji(text) {
            return 0.1;
        }

        let lower = text.to_lowercase();
        let mut score = (text.chars().count() as f64 / 40.0).min(0.5);

        if PRODUCT_CODE
            .find_iter(text)
            .any(|m| m.as_str().chars().any(|c| c.is_ascii_digit()))
        {
            score += BOOST_PRODUCT_CODE;
        }
        if LONG_NUMBER.is_match(text) {
            score += BOOST_NUMBER;
        }
        if QUESTION.is_match(text) {
            score += BOOST_QUESTION;
        }
        if self.action.iter().any(|kw| lower.starts_with(kw.as_str())) {
            score += BOOST_ACTION;
        }
        if BUSINESS.is_match(text) {
            score += BOOST_KEYWORD;
        }
        if self.product.iter().any(|kw| lower.contains(kw.as_str())) {
            score += BOOST_KEYWORD;
        }
        if self.brand.iter().any(|kw| lower.contains(kw.as_str())) {
            score += BOOST_KEYWORD;
        }
        if ADDRESS.is_match(text) {
            score += BOOST_KEYWORD;
        }
        if SELECTION.is_match(text) {
            score += BOOST_SELECTION;
        }
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if PHONE.is_match(&digits) {
            score += BOOST_KEYWORD;
        }
        if URGENT.is_match(text) {
            score += BOOST_URGENT;
        }

        score.min(1.0)
    }
}

fn merge_keywords(defaults: &[&str], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    for kw in extra {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() && !merged.contains(&kw) {
            merged.push(kw);
        }
    }
    merged
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D | 0x2300..=0x23FF)
}

fn is_sticker_or_emoji(text: &str) -> bool {
    text.eq_ignore_ascii_case("[sticker]")
        || text
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(is_emoji)
}
