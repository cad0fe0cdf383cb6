// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Concierge commerce router.
//!
//! This crate provides the error taxonomy, the turn/reply contract, the
//! closed intent and case vocabularies, and the collaborator traits every
//! other workspace crate is written against.

pub mod case;
pub mod clock;
pub mod error;
pub mod format;
pub mod intent;
pub mod quick_state;
pub mod services;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use case::{
    ActivityType, ActorType, Case, CaseActivity, CasePriority, CaseStatus, CaseType, SlotBag,
};
pub use clock::{Clock, SystemClock};
pub use error::ConciergeError;
pub use intent::{Intent, IntentResult};
pub use quick_state::{PendingIntent, QuickState, StateKey};
pub use services::Collaborators;
pub use types::{
    Answer, ChatMessage, GateReason, Handled, InboundTurn, MessagePayload, MessageRole, Platform, Product,
    QuickReplyItem, ReasonTag, Reply, ReplyAction, Scope, Session,
};
