// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recognizes the bot's own output shapes echoed back as inbound text.

use regex::Regex;

use concierge_config::model::EchoFilterConfig;

/// Order summaries, payment instructions and shipping notices the bot sends.
const BUILT_IN: &[&str] = &[
    r"^สินค้า:.*ราคา:",
    r"^รายการสั่งซื้อ",
    r"^ยืนยันการสั่งซื้อ",
    r"^ขอบคุณที่สั่งซื้อ",
    r"^กรุณาโอนเงิน",
    r"^ตรวจสอบสลิป.*สำเร็จ",
    r"ยอดรวม:\s*฿?\d+",
    r"เลขพัสดุ:",
    r"จัดส่งภายใน",
];

#[derive(Debug, Clone)]
pub struct EchoFilter {
    enabled: bool,
    patterns: Vec<Regex>,
}

impl EchoFilter {
    /// Compiles the built-in patterns plus the configured ones. Invalid
    /// configured patterns are skipped with a warning.
    pub fn new(config: &EchoFilterConfig) -> Self {
        let patterns = BUILT_IN
            .iter()
            .copied()
            .chain(config.patterns.iter().map(String::as_str))
            .filter_map(|p| match Regex::new(&format!("(?s){p}")) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern = p, error = %e, "skipping invalid echo pattern");
                    None
                }
            })
            .collect();
        Self {
            enabled: config.enabled,
            patterns,
        }
    }

    pub fn is_bot_output(&self, text: &str) -> bool {
        let text = text.trim();
        self.enabled && !text.is_empty() && self.patterns.iter().any(|re| re.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn built_in_shapes_match() {
        let filter = EchoFilter::new(&EchoFilterConfig::default());
        assert!(filter.is_bot_output("สินค้า: Rolex Submariner\nราคา: 450,000"));
        assert!(filter.is_bot_output("กรุณาโอนเงินภายใน 24 ชั่วโมง"));
        assert!(filter.is_bot_output("สรุป ยอดรวม: ฿12500"));
        assert!(!filter.is_bot_output("สนใจ rolex ครับ"));
    }

    #[test]
    fn disabled_filter_matches_nothing() {
        let filter = EchoFilter::new(&EchoFilterConfig {
            enabled: false,
            patterns: Vec::new(),
        });
        assert!(!filter.is_bot_output("กรุณาโอนเงิน"));
    }

    #[traced_test]
    #[test]
    fn configured_patterns_extend_and_invalid_ones_are_skipped() {
        let filter = EchoFilter::new(&EchoFilterConfig {
            enabled: true,
            patterns: vec![r"^\[BOT\]".into(), "(".into()],
        });
        assert!(filter.is_bot_output("[BOT] hello"));
        assert!(logs_contain("skipping invalid echo pattern"));
    }
}
