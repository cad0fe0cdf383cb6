// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commerce backend adapter for Concierge.
//!
//! [`BackendClient`] implements the catalog, checkout, knowledge-base,
//! status desk, obligation and payment collaborators over one JSON HTTP API.

pub mod client;
pub mod commerce;
pub mod finance;

pub use client::BackendClient;
