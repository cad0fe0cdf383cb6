// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case records, their slot bag, and the append-only activity log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::{Platform, Scope};

/// Kind of customer request tracked by a case.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaseType {
    ProductInquiry,
    PaymentFull,
    PaymentInstallment,
    PaymentSavings,
    Pawn,
    Repair,
}

impl CaseType {
    /// Localized subject line used when a case of this type is opened.
    pub fn subject(self) -> &'static str {
        match self {
            Self::ProductInquiry => "สอบถามสินค้า",
            Self::PaymentFull => "ชำระเงินเต็ม",
            Self::PaymentInstallment => "ชำระเงินผ่อน",
            Self::PaymentSavings => "ออมสินค้า",
            Self::Pawn => "ขอประเมินรับฝาก",
            Self::Repair => "ขอประเมินซ่อม",
        }
    }
}

/// Case status. `Resolved` and `Cancelled` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Open,
    PendingCustomer,
    PendingAdmin,
    InProgress,
    Resolved,
    Cancelled,
}

impl CaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }

    /// Whether a case in this status may move to `next`.
    ///
    /// Terminal statuses never transition. Re-asserting the current status is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Open => self == Self::Open,
            _ => true,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CasePriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Ordered bag of extracted facts attached to a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotBag(pub BTreeMap<String, serde_json::Value>);

impl SlotBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge. Values in `other` overwrite existing values on key collision.
    ///
    /// Null values in `other` are skipped so a classifier that reports an empty
    /// slot cannot erase a known fact.
    pub fn merge(&mut self, other: &SlotBag) {
        for (key, value) in &other.0 {
            if value.is_null() {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// True when the key holds a non-empty value.
    pub fn has(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for SlotBag {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, serde_json::Value)> for SlotBag {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A trackable unit of unresolved customer intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    /// Business-facing number, `CASE-YYYYMMDD-XXXXX`.
    pub case_no: String,
    pub case_type: CaseType,
    pub scope: Scope,
    pub platform: Platform,
    pub session_id: Option<String>,
    pub subject: String,
    pub slots: SlotBag,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Builds a case number from the creation time and a random suffix.
pub fn case_number(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "CASE-{}-{}",
        now.format("%Y%m%d"),
        random[..5].to_ascii_uppercase()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityType {
    Created,
    SlotUpdated,
    StatusChanged,
    CaseResolved,
    HandoffTriggered,
    OrderLinked,
    PaymentLinked,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorType {
    #[default]
    Bot,
    Admin,
    System,
}

/// One immutable audit entry for a case mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseActivity {
    pub case_id: String,
    pub activity_type: ActivityType,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
