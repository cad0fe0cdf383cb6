// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator and store traits.
//!
//! Everything the router talks to lives behind one of these traits and uses
//! `#[async_trait]` so implementations can be held as `Arc<dyn Trait>`.

pub mod catalog;
pub mod checkout;
pub mod classifier;
pub mod finance;
pub mod knowledge;
pub mod stores;

pub use catalog::{ImageSearchResult, ProductCatalog, ProductSearchResult};
pub use checkout::{CheckoutConfirmation, CheckoutFlow, CheckoutState, PaymentType, STEP_ASK_ADDRESS};
pub use classifier::{
    CallPolicy, ImageKind, IntentClassifier, TextGenerator, TextRequest, VisionClassifier,
    VisionReport,
};
pub use finance::{
    AccountKind, ExpectedAmount, Obligation, ObligationKind, ObligationService, PaymentLink,
    PaymentRecorder, SlipEvidence, SlipRecord, TransactionDesk,
};
pub use knowledge::{KbHit, KnowledgeBase};
pub use stores::{CaseStore, QuickStateStore, SessionStore};
