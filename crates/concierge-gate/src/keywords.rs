// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strips conversational wrapping to isolate the product-relevant core of a message.

use std::sync::LazyLock;

const PREFIXES: &[&str] = &[
    "อยากได้",
    "อยากดู",
    "ต้องการ",
    "สนใจ",
    "หา",
    "ขอดู",
    "ขอ",
    "เอา",
    "มี",
    "หรือเปล่า",
    "รึเปล่า",
    "บ้าง",
    "ไหม",
    "มั้ย",
    "หน่อย",
    "ดู",
    "แนะนำ",
    "ช่วยหา",
    "ช่วยดู",
];

const SUFFIXES: &[&str] = &[
    "ครับ", "ค่ะ", "คะ", "คับ", "จ้า", "นะ", "ไหม", "มั้ย", "หน่อย", "บ้าง", "ด้วย",
];

/// Word lists ordered longest first so "ขอดู" is stripped before "ขอ".
static ORDERED: LazyLock<(Vec<&'static str>, Vec<&'static str>)> = LazyLock::new(|| {
    let mut prefixes = PREFIXES.to_vec();
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
    let mut suffixes = SUFFIXES.to_vec();
    suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    (prefixes, suffixes)
});

/// Returns the message with leading wants/asks and trailing particles removed.
///
/// Known words are stripped from each end until none remain. The result may be empty.
pub fn extract_product_keywords(text: &str) -> String {
    let (prefixes, suffixes) = &*ORDERED;
    let mut core = text.trim();
    while let Some(rest) = prefixes.iter().find_map(|p| core.strip_prefix(*p)) {
        core = rest.trim_start();
    }
    while let Some(rest) = suffixes.iter().find_map(|s| core.strip_suffix(*s)) {
        core = rest.trim_end();
    }
    core.to_string()
}
