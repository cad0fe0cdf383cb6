// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template filling and platform-neutral product cards.

use serde_json::json;

use crate::types::{Answer, Product};

/// Most cards a carousel carries.
pub const MAX_CAROUSEL_ITEMS: usize = 10;

/// Replaces every `{name}` placeholder with its value. Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

/// Formats a price in baht with thousands separators, dropping zero satang.
pub fn format_price(price: f64) -> String {
    let rounded = (price * 100.0).round() / 100.0;
    let whole = rounded.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        grouped.insert(0, '-');
    }
    let satang = ((rounded.fract().abs()) * 100.0).round() as i64;
    if satang == 0 {
        grouped
    } else {
        format!("{grouped}.{satang:02}")
    }
}

/// A carousel answer with one card per product. The text part doubles as the alt text.
pub fn product_carousel(products: &[Product]) -> Answer {
    let items: Vec<serde_json::Value> = products
        .iter()
        .take(MAX_CAROUSEL_ITEMS)
        .map(|p| {
            let pick = p.code.as_deref().unwrap_or(p.name.as_str());
            json!({
                "title": p.name,
                "code": p.code,
                "brand": p.brand,
                "price": p.price,
                "price_text": p.price.map(|v| format!("{} บาท", format_price(v))),
                "image_url": p.image_url,
                "actions": [{ "label": "สนใจชิ้นนี้", "text": format!("สนใจ {pick}") }],
            })
        })
        .collect();
    let alt_text = format!("พบสินค้า {} รายการค่ะ", items.len());
    Answer::text(alt_text.clone()).with_message(json!({
        "type": "carousel",
        "alt_text": alt_text,
        "items": items,
    }))
}
