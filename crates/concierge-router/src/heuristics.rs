// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zero-cost text heuristics used around intent classification.
//!
//! None of these call a collaborator. They decide whether a message looks
//! like a product name, a store-info question, a bare "I'll take it", or a
//! menu button, and they mine recent history for a product category.

use std::sync::LazyLock;

use concierge_core::traits::PaymentType;
use concierge_core::{ChatMessage, MessageRole};
use regex::Regex;

static QUESTION_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?？]").expect("valid regex"));

static QUESTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ทำไม|อะไร|ที่ไหน|เมื่อไหร่|ยังไง|อย่างไร|ไหม|มั้ย|หรือ)").expect("valid regex")
});

static SOCIAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(สวัสดี|ดีค่ะ|ดีครับ|ขอบคุณ|ขอบใจ|hello|hi|hey|thanks)").expect("valid regex")
});

static SERVICE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ซ่อม|จำนำ|ผ่อน|แอดมิน|admin|ติดต่อ)").expect("valid regex")
});

static BRANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(rolex|omega|patek|cartier|audemars|richard mille|hublot|iwc|panerai|breitling|tag heuer|tissot|seiko|citizen|casio|g-shock|tudor|longines|chopard|bvlgari|bulgari|tiffany|chanel|van cleef|piaget|hermes|louis vuitton|dior|gucci)",
    )
    .expect("valid regex")
});

static MODELS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(submariner|daytona|datejust|gmt|speedmaster|seamaster|nautilus|royal oak|santos|tank|aquanaut|calatrava|oyster|perpetual|chronograph)",
    )
    .expect("valid regex")
});

static NICKNAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(แพม|pam|green sub|hulk|pepsi|batman|root beer|starbucks?|panda|king size|boyy|kelly|birkin|constance|j12|coke|แบทแมน|เป๊ปซี่|แพนด้า)",
    )
    .expect("valid regex")
});

static THAI_CATEGORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(นาฬิกา|แหวน|สร้อย|กำไล|จี้|ต่างหู|เพชร|ทอง|เงิน|พลอย|ไข่มุก|กระเป๋า|พระ)")
        .expect("valid regex")
});

static LATIN_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s\-.]+$").expect("valid regex"));

static HAS_LATIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]").expect("valid regex"));

static HAS_THAI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{0E00}-\x{0E7F}]").expect("valid regex"));

static PRODUCT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z]{1,3}[-\s]?\d{4,}").expect("valid regex"));

static STORE_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(ที่อยู่|ร้านอยู่|อยู่ที่ไหน|อยู่ตรงไหน|แผนที่|เปิดกี่โมง|ปิดกี่โมง|เวลาเปิด|เวลาทำการ|เบอร์โทร|เบอร์ร้าน|ไลน์ร้าน|สาขา|location|address|opening hours|phone)",
    )
    .expect("valid regex")
});

static EARLY_CHECKOUT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^สนใจ\s*(?:รุ่นนี้|ตัวนี้|เลย|ค่ะ|ครับ)?$",
        r"^เอา\s*(?:เลย|ตัวนี้|รุ่นนี้)?$",
        r"^ซื้อ\s*(?:เลย|ค่ะ|ครับ)?$",
        r"^ต้องการ\s*(?:เลย|ค่ะ|ครับ)?$",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static BARE_INTEREST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(สนใจ|รับ|เอา|จอง)\s*(ครับ|ค่ะ|นะ|เลย)?$").expect("valid regex")
});

pub(crate) static GREETING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(สวัสดี|หวัดดี|ดีค่ะ|ดีครับ)").expect("valid regex"));

pub(crate) static THANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ขอบคุณ|ขอบใจ|ขอบพระคุณ)").expect("valid regex"));

/// Category words a customer may have mentioned, mapped to the search term to use.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("พระ", "พระ"),
    ("พระเครื่อง", "พระ"),
    ("พระทอง", "พระทอง"),
    ("ตลับพระ", "ตลับพระ"),
    ("พระเลี่ยม", "พระเลี่ยม"),
    ("วัตถุมงคล", "พระ"),
    ("สร้อย", "สร้อย"),
    ("สร้อยคอ", "สร้อยคอ"),
    ("สร้อยทอง", "สร้อยทอง"),
    ("สร้อยข้อมือ", "สร้อยข้อมือ"),
    ("แหวน", "แหวน"),
    ("แหวนเพชร", "แหวนเพชร"),
    ("ต่างหู", "ต่างหู"),
    ("จี้", "จี้"),
    ("เข็มกลัด", "เข็มกลัด"),
    ("กำไล", "กำไล"),
    ("เครื่องประดับ", "เครื่องประดับ"),
    ("เพชร", "เพชร"),
    ("ทอง", "ทอง"),
    ("ทองคำ", "ทองคำ"),
    ("นาฬิกา", "นาฬิกา"),
    ("rolex", "rolex"),
    ("tag heuer", "tag heuer"),
    ("omega", "omega"),
    ("cartier", "cartier"),
    ("patek", "patek philippe"),
];

static CATEGORIES_LONGEST_FIRST: LazyLock<Vec<(&'static str, &'static str)>> =
    LazyLock::new(|| {
        let mut sorted = CATEGORY_KEYWORDS.to_vec();
        sorted.sort_by_key(|(k, _)| std::cmp::Reverse(k.chars().count()));
        sorted
    });

/// Whether an unclassified message is worth a product search.
///
/// Questions, greetings and service requests are rejected. Brand and model
/// names, common nicknames, Thai category words and Latin or mixed-script
/// strings are accepted.
pub fn looks_like_product_query(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if !(3..=100).contains(&len) {
        return false;
    }
    if QUESTION_MARK.is_match(text)
        || QUESTION_PREFIX.is_match(text)
        || SOCIAL_PREFIX.is_match(text)
        || SERVICE_REQUEST.is_match(text)
    {
        return false;
    }
    if BRANDS.is_match(text)
        || MODELS.is_match(text)
        || NICKNAMES.is_match(text)
        || THAI_CATEGORIES.is_match(text)
    {
        return true;
    }
    if LATIN_ONLY.is_match(text) && HAS_LATIN.is_match(text) {
        return true;
    }
    HAS_LATIN.is_match(text) && HAS_THAI.is_match(text)
}

/// Codes such as `P-2026-000001`, `BR-12345` or `RLX 0012`.
pub fn is_product_code(text: &str) -> bool {
    PRODUCT_CODE.is_match(text.trim())
}

pub fn is_store_info_question(text: &str) -> bool {
    STORE_INFO.is_match(text)
}

/// A bare "I'll take it" with no product named.
pub fn is_early_checkout_phrase(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    EARLY_CHECKOUT.iter().any(|re| re.is_match(&text))
}

/// Exact, case-insensitive match against the configured menu triggers.
pub fn is_menu_reset(text: &str, triggers: &[String]) -> bool {
    let text = text.trim().to_lowercase();
    triggers.iter().any(|t| t.trim().to_lowercase() == text)
}

/// The search term for the most recent product category the customer mentioned.
///
/// Walks user messages newest first, skipping bare interest phrases, and
/// prefers the longest matching keyword within a message.
pub fn category_from_history(history: &[ChatMessage]) -> Option<&'static str> {
    history
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.text.trim().to_lowercase())
        .filter(|text| !BARE_INTEREST.is_match(text))
        .find_map(|text| {
            CATEGORIES_LONGEST_FIRST
                .iter()
                .find(|(keyword, _)| text.contains(keyword))
                .map(|(_, term)| *term)
        })
}

/// Payment type named in a checkout confirmation. Defaults to full payment.
pub fn confirm_payment_type(text: &str) -> PaymentType {
    let text = text.to_lowercase();
    if text.contains("ผ่อน") || text.contains("installment") {
        PaymentType::Installment
    } else if text.contains("มัดจำ") || text.contains("deposit") {
        PaymentType::Deposit
    } else if text.contains("ออม") || text.contains("savings") {
        PaymentType::Savings
    } else {
        PaymentType::Full
    }
}

/// Payment type a customer asks to switch to.
///
/// Full-payment words are checked first so "โอนเต็ม" never reads as a deposit.
pub fn requested_payment_type(text: &str) -> PaymentType {
    const RULES: &[(&[&str], PaymentType)] = &[
        (&["โอน", "เต็ม", "full", "สด", "cash"], PaymentType::Full),
        (&["ผ่อน", "งวด", "installment"], PaymentType::Installment),
        (&["มัดจำ", "deposit", "จอง"], PaymentType::Deposit),
        (&["ออม", "savings"], PaymentType::Savings),
    ];
    let text = text.to_lowercase();
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

/// Thai label for a payment type.
pub fn payment_type_label(kind: PaymentType) -> &'static str {
    match kind {
        PaymentType::Full => "ชำระเต็มจำนวน",
        PaymentType::Installment => "ผ่อนชำระ",
        PaymentType::Deposit => "มัดจำ",
        PaymentType::Savings => "ออมทอง",
    }
}
