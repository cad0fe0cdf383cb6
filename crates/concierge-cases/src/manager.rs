// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case lifecycle: find-or-create, slot filling, status transitions, handoff.
//!
//! Every mutation is a read, compute, write sequence followed by one
//! append-only activity entry. Mutations originate from a single serialized
//! turn per user, so the slot merge is last-writer-wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use concierge_config::BotConfig;
use concierge_config::model::{CaseFlowConfig, CaseManagementConfig};
use concierge_core::traits::{CaseStore, SessionStore};
use concierge_core::{
    ActivityType, ActorType, Case, CaseActivity, CasePriority, CaseStatus, CaseType, Clock,
    Collaborators, ConciergeError, Intent, Platform, Product, Scope, SlotBag,
};
use serde_json::json;
use tracing::{debug, info};

use crate::history::{self, HistoryEntry, HISTORY_SLOT, SELECTED_SLOT};
use crate::mapping::detect_case_type;

/// Slot key that carries the sub-action used for conditional required slots.
pub const ACTION_SLOT: &str = "action_type";

/// Who and where a case belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseContext {
    pub scope: Scope,
    pub platform: Platform,
    /// Session the case is linked to as its active case.
    pub session_id: Option<String>,
}

impl CaseContext {
    pub fn new(scope: Scope, platform: Platform) -> Self {
        Self {
            scope,
            platform,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Case lifecycle manager bound to one store and one bot configuration.
#[derive(Clone)]
pub struct CaseManager {
    store: Arc<dyn CaseStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    settings: CaseManagementConfig,
    flows: BTreeMap<String, CaseFlowConfig>,
    questions: BTreeMap<String, String>,
}

impl CaseManager {
    pub fn new(
        store: Arc<dyn CaseStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: &BotConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            settings: config.case_management.clone(),
            flows: config.case_flows.clone(),
            questions: config.slot_questions.clone(),
        }
    }

    /// Builds a manager over the stores in a collaborator bundle.
    pub fn from_collaborators(collaborators: &Collaborators, config: &BotConfig) -> Self {
        Self::new(
            collaborators.cases.clone(),
            collaborators.sessions.clone(),
            collaborators.clock.clone(),
            config,
        )
    }

    /// Whether the router should open cases for caseable intents.
    pub fn auto_create(&self) -> bool {
        self.settings.enabled && self.settings.auto_create
    }

    pub fn detect_case_type(&self, intent: Intent) -> Option<CaseType> {
        detect_case_type(intent, &self.flows)
    }

    /// The open case of `case_type` for `scope`, if any.
    pub async fn open_case(
        &self,
        scope: &Scope,
        case_type: CaseType,
    ) -> Result<Option<Case>, ConciergeError> {
        self.store.find_open(scope, case_type).await
    }

    /// Returns the open case of `case_type` for the context, creating it when absent.
    ///
    /// An existing case gets `slots` merged in. Either way the case becomes
    /// the session's active case.
    pub async fn get_or_create(
        &self,
        ctx: &CaseContext,
        case_type: CaseType,
        slots: &SlotBag,
    ) -> Result<Case, ConciergeError> {
        let now = self.clock.now();
        let existing = match self.store.find_open(&ctx.scope, case_type).await? {
            Some(case) if self.settings.same_day_only && !same_day(case.created_at, now) => {
                // Close yesterday's case so at most one stays open per type.
                debug!(case_no = %case.case_no, "superseding open case from an earlier day");
                self.resolve(&case.id, "superseded").await?;
                None
            }
            other => other,
        };

        let case = match existing {
            Some(case) => {
                debug!(case_no = %case.case_no, case_type = %case_type, "found open case");
                if slots.is_empty() {
                    case
                } else {
                    self.update_slots(&case.id, slots).await?
                }
            }
            None => self.create(ctx, case_type, slots, now).await?,
        };

        if let Some(session_id) = &ctx.session_id {
            self.sessions
                .set_active_case(session_id, &case.id, case.case_type, now)
                .await?;
        }
        Ok(case)
    }

    async fn create(
        &self,
        ctx: &CaseContext,
        case_type: CaseType,
        slots: &SlotBag,
        now: DateTime<Utc>,
    ) -> Result<Case, ConciergeError> {
        let mut initial = SlotBag::new();
        initial.merge(slots);
        if let Some(entry) = HistoryEntry::from_slots(slots, now) {
            let mut products = Vec::new();
            history::push_unique(&mut products, entry);
            initial.insert(HISTORY_SLOT, serde_json::to_value(&products)?);
        }

        let case = Case {
            id: uuid::Uuid::new_v4().to_string(),
            case_no: concierge_core::case::case_number(now),
            case_type,
            scope: ctx.scope.clone(),
            platform: ctx.platform,
            session_id: ctx.session_id.clone(),
            subject: case_type.subject().to_string(),
            slots: initial,
            status: CaseStatus::Open,
            priority: CasePriority::Normal,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&case).await?;
        self.log(
            &case.id,
            ActivityType::Created,
            None,
            Some(json!({ "case_type": case_type, "status": case.status })),
        )
        .await?;

        info!(case_no = %case.case_no, case_type = %case_type, "case created");
        Ok(case)
    }

    /// Merges `new_slots` into the case. Product slots also extend the products history.
    pub async fn update_slots(
        &self,
        case_id: &str,
        new_slots: &SlotBag,
    ) -> Result<Case, ConciergeError> {
        let mut case = self.load(case_id).await?;
        let now = self.clock.now();
        let old = serde_json::to_value(&case.slots)?;

        let mut merged = case.slots.clone();
        merged.merge(new_slots);
        if let Some(entry) = HistoryEntry::from_slots(new_slots, now) {
            let mut products = history::read_history(&case.slots);
            if history::push_unique(&mut products, entry) {
                merged.insert(HISTORY_SLOT, serde_json::to_value(&products)?);
            }
        }

        case.slots = merged;
        case.updated_at = now;
        self.store.update(&case).await?;
        self.log(
            case_id,
            ActivityType::SlotUpdated,
            Some(old),
            Some(serde_json::to_value(new_slots)?),
        )
        .await?;
        Ok(case)
    }

    /// Moves the case to `status`. Transitions out of a terminal status are rejected.
    pub async fn update_status(
        &self,
        case_id: &str,
        status: CaseStatus,
    ) -> Result<Case, ConciergeError> {
        let mut case = self.load(case_id).await?;
        let old = case.status;
        if !old.can_transition_to(status) {
            return Err(ConciergeError::Internal(format!(
                "case {} cannot move from {old} to {status}",
                case.case_no
            )));
        }

        case.status = status;
        case.updated_at = self.clock.now();
        self.store.update(&case).await?;
        self.log(
            case_id,
            ActivityType::StatusChanged,
            Some(json!({ "status": old })),
            Some(json!({ "status": status })),
        )
        .await?;
        Ok(case)
    }

    /// Resolves the case, recording why.
    pub async fn resolve(
        &self,
        case_id: &str,
        resolution_type: &str,
    ) -> Result<Case, ConciergeError> {
        let mut case = self.load(case_id).await?;
        let old = case.status;
        if !old.can_transition_to(CaseStatus::Resolved) {
            return Err(ConciergeError::Internal(format!(
                "case {} is already {old}",
                case.case_no
            )));
        }

        case.status = CaseStatus::Resolved;
        case.updated_at = self.clock.now();
        self.store.update(&case).await?;
        self.log(
            case_id,
            ActivityType::CaseResolved,
            Some(json!({ "status": old })),
            Some(json!({ "status": CaseStatus::Resolved, "resolution_type": resolution_type })),
        )
        .await?;

        info!(case_no = %case.case_no, resolution_type, "case resolved");
        Ok(case)
    }

    /// Hands the case to a human: status `pending_admin`, priority `high`.
    pub async fn trigger_handoff(&self, case_id: &str, reason: &str) -> Result<Case, ConciergeError> {
        let mut case = self.load(case_id).await?;
        let old = json!({ "status": case.status, "priority": case.priority });
        if case.status.is_terminal() {
            return Err(ConciergeError::Internal(format!(
                "case {} is closed and cannot be handed off",
                case.case_no
            )));
        }

        case.status = CaseStatus::PendingAdmin;
        case.priority = CasePriority::High;
        case.updated_at = self.clock.now();
        self.store.update(&case).await?;
        self.log(
            case_id,
            ActivityType::HandoffTriggered,
            Some(old),
            Some(json!({ "reason": reason, "status": case.status, "priority": case.priority })),
        )
        .await?;

        info!(case_no = %case.case_no, reason, "case handed off to admin");
        Ok(case)
    }

    pub async fn link_order(&self, case_id: &str, order_id: &str) -> Result<Case, ConciergeError> {
        self.link(case_id, "order_id", order_id, ActivityType::OrderLinked)
            .await
    }

    pub async fn link_payment(&self, case_id: &str, payment_id: &str) -> Result<Case, ConciergeError> {
        self.link(case_id, "payment_id", payment_id, ActivityType::PaymentLinked)
            .await
    }

    async fn link(
        &self,
        case_id: &str,
        slot: &str,
        id: &str,
        activity: ActivityType,
    ) -> Result<Case, ConciergeError> {
        let mut case = self.load(case_id).await?;
        let old = case.slots.get(slot).cloned();
        case.slots.insert(slot, id);
        case.updated_at = self.clock.now();
        self.store.update(&case).await?;
        self.log(case_id, activity, old, Some(json!({ slot: id })))
            .await?;
        Ok(case)
    }

    /// True when the text asks for a human or the slots flag a handoff.
    pub fn should_handoff_to_admin(&self, text: &str, slots: &SlotBag) -> bool {
        let lowered = text.to_lowercase();
        let asked = self
            .settings
            .admin_handoff_triggers
            .iter()
            .filter(|t| !t.trim().is_empty())
            .any(|t| lowered.contains(&t.to_lowercase()));
        if asked {
            return true;
        }
        match slots.get("handoff_to_admin") {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => matches!(s.as_str(), "true" | "1" | "yes"),
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    /// Required slots for a case type, plus those conditional on `action`.
    pub fn required_slots(&self, case_type: CaseType, action: Option<&str>) -> Vec<String> {
        let key: &'static str = case_type.into();
        let Some(flow) = self.flows.get(key) else {
            return Vec::new();
        };
        let mut required = flow.required_slots.clone();
        if let Some(extra) = action.and_then(|a| flow.conditional_slots.get(a)) {
            for slot in extra {
                if !required.contains(slot) {
                    required.push(slot.clone());
                }
            }
        }
        required
    }

    /// Required slots the case has no value for yet, in configuration order.
    pub fn missing_slots(&self, case: &Case) -> Vec<String> {
        let action = case.slots.get(ACTION_SLOT).and_then(|v| v.as_str());
        self.required_slots(case.case_type, action)
            .into_iter()
            .filter(|slot| !case.slots.has(slot))
            .collect()
    }

    /// The question to ask for a missing slot.
    pub fn slot_question(&self, slot: &str) -> Option<&str> {
        self.questions.get(slot).map(String::as_str)
    }

    /// Upserts the product inquiry case with `product` in its history.
    pub async fn track_product(
        &self,
        ctx: &CaseContext,
        product: &Product,
    ) -> Result<Case, ConciergeError> {
        self.get_or_create(ctx, CaseType::ProductInquiry, &history::product_slots(product))
            .await
    }

    pub async fn products_history(&self, case_id: &str) -> Result<Vec<HistoryEntry>, ConciergeError> {
        let case = self.load(case_id).await?;
        Ok(history::read_history(&case.slots))
    }

    /// Picks a product from the case history and makes it the selected product.
    ///
    /// Returns `None`, leaving the case untouched, when nothing matches.
    pub async fn select_product_from_history(
        &self,
        case_id: &str,
        selector: &str,
    ) -> Result<Option<HistoryEntry>, ConciergeError> {
        let case = self.load(case_id).await?;
        let products = history::read_history(&case.slots);
        let Some(entry) = history::select(&products, selector).cloned() else {
            return Ok(None);
        };

        let mut slots = history::product_slots(&entry.to_product());
        slots.insert(SELECTED_SLOT, serde_json::to_value(&entry)?);
        self.update_slots(case_id, &slots).await?;
        debug!(case_id, idx = entry.idx, "product selected from history");
        Ok(Some(entry))
    }

    pub async fn activities(&self, case_id: &str) -> Result<Vec<CaseActivity>, ConciergeError> {
        self.store.activities(case_id).await
    }

    async fn load(&self, case_id: &str) -> Result<Case, ConciergeError> {
        self.store
            .get(case_id)
            .await?
            .ok_or_else(|| ConciergeError::Internal(format!("case {case_id} not found")))
    }

    async fn log(
        &self,
        case_id: &str,
        activity_type: ActivityType,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Result<(), ConciergeError> {
        let activity = CaseActivity {
            case_id: case_id.to_string(),
            activity_type,
            old_value,
            new_value,
            actor_type: ActorType::Bot,
            actor_id: None,
            created_at: self.clock.now(),
        };
        self.store.append_activity(&activity).await
    }
}

impl std::fmt::Debug for CaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseManager")
            .field("settings", &self.settings)
            .field("flows", &self.flows.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}
