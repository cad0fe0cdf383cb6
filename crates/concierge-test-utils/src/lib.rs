// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Concierge integration tests.
//!
//! Provides in-memory stores, scripted collaborator mocks, and a manual
//! clock for fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`ManualClock`] - clock that only moves when told to
//! - [`MemoryQuickState`], [`MemorySessions`], [`MemoryCases`] - in-memory stores
//! - [`MockCatalog`], [`MockCheckout`], [`MockObligations`], ... - scripted collaborators
//! - [`TestWorld`] - every mock wired into a [`concierge_core::Collaborators`]

pub mod clock;
pub mod harness;
pub mod memory;
pub mod mock_commerce;
pub mod mock_finance;
pub mod mock_models;

pub use clock::ManualClock;
pub use harness::TestWorld;
pub use memory::{MemoryCases, MemoryQuickState, MemorySessions};
pub use mock_commerce::{MockCatalog, MockCheckout, MockKnowledgeBase};
pub use mock_finance::{MockDesk, MockObligations, MockPayments};
pub use mock_models::{MockClassifier, MockText, MockVision};

/// Builds a product with a code, name, and price.
pub fn product(code: &str, name: &str, price: f64) -> concierge_core::Product {
    concierge_core::Product {
        ref_id: Some(format!("ref-{code}")),
        code: Some(code.to_string()),
        name: name.to_string(),
        price: Some(price),
        image_url: Some(format!("https://img.example/{code}.jpg")),
        brand: None,
    }
}
