// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Products a customer has looked at during a case.
//!
//! The history lives inside the case slot bag under [`HISTORY_SLOT`] so it
//! persists with the case and shows up in slot-update activity entries.

use chrono::{DateTime, Utc};
use concierge_core::{Product, SlotBag};
use serde::{Deserialize, Serialize};

/// Slot key holding the serialized history.
pub const HISTORY_SLOT: &str = "products_history";

/// Slot key holding the product the customer picked from the history.
pub const SELECTED_SLOT: &str = "selected_product";

/// One product shown to the customer, numbered from 1 in order of first sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub idx: usize,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_ref_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_price: Option<f64>,
    #[serde(default)]
    pub product_image_url: Option<String>,
    #[serde(default)]
    pub product_brand: Option<String>,
    pub searched_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Builds an entry from `product_*` slots. `None` when no identifying slot is set.
    pub fn from_slots(slots: &SlotBag, at: DateTime<Utc>) -> Option<Self> {
        let text = |key: &str| {
            slots
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let entry = Self {
            idx: 0,
            product_code: text("product_code"),
            product_ref_id: text("product_ref_id"),
            product_name: text("product_name"),
            product_price: slots.get("product_price").and_then(|v| v.as_f64()),
            product_image_url: text("product_image_url"),
            product_brand: text("product_brand"),
            searched_at: at,
        };
        if entry.product_code.is_none()
            && entry.product_ref_id.is_none()
            && entry.product_name.is_none()
        {
            return None;
        }
        Some(entry)
    }

    pub fn to_product(&self) -> Product {
        Product {
            ref_id: self.product_ref_id.clone(),
            code: self.product_code.clone(),
            name: self.product_name.clone().unwrap_or_default(),
            price: self.product_price,
            image_url: self.product_image_url.clone(),
            brand: self.product_brand.clone(),
        }
    }

    /// Same product when the ref ids match, or the codes match and neither entry has a ref id.
    fn same_product(&self, other: &Self) -> bool {
        match (&self.product_ref_id, &other.product_ref_id) {
            (Some(a), Some(b)) => a == b,
            _ => match (&self.product_code, &other.product_code) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            },
        }
    }
}

/// The `product_*` slots describing `product`.
pub fn product_slots(product: &Product) -> SlotBag {
    let mut slots = SlotBag::new();
    if let Some(ref_id) = &product.ref_id {
        slots.insert("product_ref_id", ref_id.as_str());
    }
    if let Some(code) = &product.code {
        slots.insert("product_code", code.as_str());
    }
    slots.insert("product_name", product.name.as_str());
    if let Some(price) = product.price {
        slots.insert("product_price", price);
    }
    if let Some(url) = &product.image_url {
        slots.insert("product_image_url", url.as_str());
    }
    if let Some(brand) = &product.brand {
        slots.insert("product_brand", brand.as_str());
    }
    slots
}

/// Reads the history out of a slot bag. A malformed value reads as empty.
pub fn read_history(slots: &SlotBag) -> Vec<HistoryEntry> {
    slots
        .get(HISTORY_SLOT)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Appends `entry` unless the same product is already listed.
///
/// Returns true when the history grew.
pub fn push_unique(history: &mut Vec<HistoryEntry>, mut entry: HistoryEntry) -> bool {
    if history.iter().any(|h| h.same_product(&entry)) {
        return false;
    }
    entry.idx = history.len() + 1;
    history.push(entry);
    true
}

/// Finds the entry a customer refers to.
///
/// Tried in order: a 1-based index (`-1` means the latest), an exact ref id or
/// product code, then a case-insensitive name fragment.
pub fn select<'a>(history: &'a [HistoryEntry], selector: &str) -> Option<&'a HistoryEntry> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }

    if let Ok(n) = selector.parse::<i64>() {
        return match n {
            -1 => history.last(),
            n if n >= 1 => history.iter().find(|h| h.idx == n as usize),
            _ => None,
        };
    }

    if let Some(hit) = history.iter().find(|h| {
        h.product_ref_id.as_deref() == Some(selector)
            || h.product_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(selector))
    }) {
        return Some(hit);
    }

    let needle = selector.to_lowercase();
    history.iter().rev().find(|h| {
        h.product_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, name: &str) -> HistoryEntry {
        HistoryEntry {
            idx: 0,
            product_code: Some(code.into()),
            product_ref_id: None,
            product_name: Some(name.into()),
            product_price: None,
            product_image_url: None,
            product_brand: None,
            searched_at: Utc::now(),
        }
    }

    fn history() -> Vec<HistoryEntry> {
        let mut h = Vec::new();
        push_unique(&mut h, entry("RLX-001", "Rolex Submariner Green"));
        push_unique(&mut h, entry("OMG-002", "Omega Speedmaster"));
        push_unique(&mut h, entry("CTR-003", "Cartier Love Bracelet"));
        h
    }

    #[test]
    fn duplicates_by_code_are_not_appended() {
        let mut h = history();
        assert!(!push_unique(&mut h, entry("rlx-001", "Rolex again")));
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().map(|e| e.idx).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn select_by_index_code_and_name() {
        let h = history();
        assert_eq!(select(&h, "2").unwrap().product_code.as_deref(), Some("OMG-002"));
        assert_eq!(select(&h, "-1").unwrap().product_code.as_deref(), Some("CTR-003"));
        assert_eq!(select(&h, "rlx-001").unwrap().idx, 1);
        assert_eq!(select(&h, "speedmaster").unwrap().idx, 2);
        assert!(select(&h, "0").is_none());
        assert!(select(&h, "9").is_none());
        assert!(select(&h, "patek").is_none());
    }

    #[test]
    fn slots_without_identity_make_no_entry() {
        let mut slots = SlotBag::new();
        slots.insert("budget", 50000);
        assert!(HistoryEntry::from_slots(&slots, Utc::now()).is_none());

        slots.insert("product_name", "Rolex Daytona");
        let e = HistoryEntry::from_slots(&slots, Utc::now()).unwrap();
        assert_eq!(e.to_product().name, "Rolex Daytona");
    }
}
