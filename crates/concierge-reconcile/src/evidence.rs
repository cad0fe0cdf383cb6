// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slip fields pulled out of a vision report.

use concierge_core::format::format_price;
use concierge_core::traits::{SlipEvidence, VisionReport};
use serde_json::Value;

/// Reads a money amount from a number or a string like `"฿ 1,500.00"`.
///
/// Zero, negative and unparseable amounts read as `None`.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && *c != '฿' && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn text_field(details: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match details.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Builds slip evidence from the fields the vision model extracted.
pub fn evidence_from_report(report: &VisionReport) -> SlipEvidence {
    let details = &report.details;
    SlipEvidence {
        amount: details.get("amount").and_then(parse_amount),
        bank: text_field(details, &["bank", "bank_name"]),
        date: text_field(details, &["date", "transfer_date"]),
        reference: text_field(details, &["ref", "reference", "transaction_ref"]),
        sender_name: text_field(details, &["sender_name", "sender"]),
        confidence: report.confidence,
    }
}

/// Human-readable summary of the slip, empty when no amount was read.
pub fn describe(evidence: &SlipEvidence) -> String {
    let Some(amount) = evidence.amount else {
        return String::new();
    };
    let mut lines = vec![
        "ข้อมูลจากสลิป:".to_string(),
        format!("จำนวนเงิน: {} บาท", format_price(amount)),
    ];
    if let Some(bank) = &evidence.bank {
        lines.push(format!("ธนาคาร: {bank}"));
    }
    if let Some(date) = &evidence.date {
        lines.push(format!("วันที่: {date}"));
    }
    if let Some(reference) = &evidence.reference {
        lines.push(format!("เลขอ้างอิง: {reference}"));
    }
    if let Some(sender) = &evidence.sender_name {
        lines.push(format!("ผู้โอน: {sender}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use concierge_core::traits::ImageKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn amounts_strip_commas_currency_and_spaces() {
        assert_eq!(parse_amount(&json!("฿ 12,500.50")), Some(12500.5));
        assert_eq!(parse_amount(&json!(3000)), Some(3000.0));
        assert_eq!(parse_amount(&json!("1 500")), Some(1500.0));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(0)), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[test]
    fn evidence_reads_aliased_fields() {
        let details = json!({
            "amount": "2,000",
            "bank_name": "SCB",
            "ref": "TX123",
            "sender": "Somchai",
        });
        let report = VisionReport {
            image_type: ImageKind::PaymentProof,
            confidence: 0.9,
            details: details.as_object().cloned().unwrap(),
            description: None,
        };
        let evidence = evidence_from_report(&report);
        assert_eq!(evidence.amount, Some(2000.0));
        assert_eq!(evidence.bank.as_deref(), Some("SCB"));
        assert_eq!(evidence.reference.as_deref(), Some("TX123"));
        assert_eq!(evidence.sender_name.as_deref(), Some("Somchai"));
        assert_eq!(evidence.date, None);

        let summary = describe(&evidence);
        assert!(summary.contains("จำนวนเงิน: 2,000 บาท"));
        assert!(summary.contains("ธนาคาร: SCB"));
        assert!(!summary.contains("วันที่"));
    }

    #[test]
    fn no_amount_means_no_summary() {
        assert_eq!(describe(&SlipEvidence::default()), "");
    }
}
