// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bundle of collaborators a turn is processed against.

use std::sync::Arc;

use crate::clock::Clock;
use crate::quick_state::QuickState;
use crate::traits::{
    CaseStore, CheckoutFlow, IntentClassifier, KnowledgeBase, ObligationService,
    PaymentRecorder, ProductCatalog, QuickStateStore, SessionStore, TextGenerator,
    TransactionDesk, VisionClassifier,
};
use crate::types::Scope;

/// Shared handles to every collaborator. Cloning is cheap.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub cases: Arc<dyn CaseStore>,
    pub quick_state: Arc<dyn QuickStateStore>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub knowledge: Arc<dyn KnowledgeBase>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub checkout: Arc<dyn CheckoutFlow>,
    pub desk: Arc<dyn TransactionDesk>,
    pub obligations: Arc<dyn ObligationService>,
    pub payments: Arc<dyn PaymentRecorder>,
    /// Absent when no vision integration is configured.
    pub vision: Option<Arc<dyn VisionClassifier>>,
    /// Absent when no text model is configured.
    pub text: Option<Arc<dyn TextGenerator>>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Quick State bound to `scope`.
    pub fn state_for(&self, scope: &Scope) -> QuickState {
        QuickState::new(self.quick_state.clone(), self.clock.clone(), scope.clone())
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("vision", &self.vision.is_some())
            .field("text", &self.text.is_some())
            .finish_non_exhaustive()
    }
}
