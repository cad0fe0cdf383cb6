// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case lifecycle management for the Concierge router.
//!
//! A case tracks one unresolved customer request per (channel, user, case
//! type). [`CaseManager`] finds or creates cases, merges extracted slots,
//! moves them through their statuses, and writes an append-only activity
//! entry for every mutation.

pub mod history;
pub mod manager;
pub mod mapping;

pub use history::{HistoryEntry, product_slots};
pub use manager::{ACTION_SLOT, CaseContext, CaseManager};
pub use mapping::detect_case_type;
