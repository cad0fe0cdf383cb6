// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort recovery of JSON objects from model output.
//!
//! Models wrap JSON in prose or code fences and sometimes cut it off. Recovery
//! tries a direct parse, then a fenced json block, then the widest `{...}` span.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static FENCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// The JSON object in `raw`, if one can be found.
pub fn recover_object(raw: &str) -> Option<Map<String, Value>> {
    let raw = raw.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str(raw) {
        return Some(map);
    }

    if let Some(block) = FENCED.captures(raw).and_then(|c| c.get(1))
        && let Ok(Value::Object(map)) = serde_json::from_str(block.as_str())
    {
        return Some(map);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&raw[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// A single `"key": "value"` string field pulled out of text that is not valid JSON.
pub fn extract_string_field(raw: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(raw)?.get(1)?.as_str();
    let value = serde_json::from_str::<String>(&format!("\"{value}\""))
        .unwrap_or_else(|_| value.to_string());
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A single numeric field pulled out of text that is not valid JSON.
pub fn extract_number_field(raw: &str, key: &str) -> Option<f64> {
    let pattern = format!(r#""{}"\s*:\s*(-?\d+(?:\.\d+)?)"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw)?.get(1)?.as_str().parse().ok()
}
