// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test world for end-to-end turn processing tests.
//!
//! `TestWorld` holds every mock collaborator alongside a manual clock and a
//! bot configuration, and hands them out as a [`Collaborators`] bundle.
//! Tests keep the typed `Arc`s to script behavior and inspect calls.

use std::sync::Arc;

use concierge_config::BotConfig;
use concierge_core::{Collaborators, Product, QuickState, Scope};

use crate::clock::ManualClock;
use crate::memory::{MemoryCases, MemoryQuickState, MemorySessions};
use crate::mock_commerce::{MockCatalog, MockCheckout, MockKnowledgeBase};
use crate::mock_finance::{MockDesk, MockObligations, MockPayments};
use crate::mock_models::{MockClassifier, MockText, MockVision};

/// Builder for a [`TestWorld`].
pub struct TestWorldBuilder {
    products: Vec<Product>,
    classifier: MockClassifier,
    knowledge: MockKnowledgeBase,
    config: BotConfig,
    vision: bool,
    text: Option<MockText>,
}

impl TestWorldBuilder {
    fn new() -> Self {
        Self {
            products: Vec::new(),
            classifier: MockClassifier::new(),
            knowledge: MockKnowledgeBase::new(),
            config: BotConfig::default(),
            vision: true,
            text: None,
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_classifier(mut self, classifier: MockClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_knowledge(mut self, knowledge: MockKnowledgeBase) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    /// Leaves the vision collaborator unset.
    pub fn without_vision(mut self) -> Self {
        self.vision = false;
        self
    }

    /// Installs a text generator with canned responses.
    pub fn with_text(mut self, text: MockText) -> Self {
        self.text = Some(text);
        self
    }

    pub fn build(self) -> TestWorld {
        TestWorld {
            clock: Arc::new(ManualClock::new()),
            quick_state: Arc::new(MemoryQuickState::new()),
            sessions: Arc::new(MemorySessions::new()),
            cases: Arc::new(MemoryCases::new()),
            classifier: Arc::new(self.classifier),
            knowledge: Arc::new(self.knowledge),
            catalog: Arc::new(MockCatalog::with_products(self.products)),
            checkout: Arc::new(MockCheckout::new()),
            desk: Arc::new(MockDesk::new()),
            obligations: Arc::new(MockObligations::new()),
            payments: Arc::new(MockPayments::new()),
            vision: self.vision.then(|| Arc::new(MockVision::new())),
            text: self.text.map(Arc::new),
            config: self.config,
        }
    }
}

/// Every mock collaborator plus the clock and configuration for one test.
pub struct TestWorld {
    pub clock: Arc<ManualClock>,
    pub quick_state: Arc<MemoryQuickState>,
    pub sessions: Arc<MemorySessions>,
    pub cases: Arc<MemoryCases>,
    pub classifier: Arc<MockClassifier>,
    pub knowledge: Arc<MockKnowledgeBase>,
    pub catalog: Arc<MockCatalog>,
    pub checkout: Arc<MockCheckout>,
    pub desk: Arc<MockDesk>,
    pub obligations: Arc<MockObligations>,
    pub payments: Arc<MockPayments>,
    pub vision: Option<Arc<MockVision>>,
    pub text: Option<Arc<MockText>>,
    pub config: BotConfig,
}

impl TestWorld {
    pub fn builder() -> TestWorldBuilder {
        TestWorldBuilder::new()
    }

    /// A world with default configuration and no products.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// The default test scope.
    pub fn scope() -> Scope {
        Scope::new("channel-1", "user-1")
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            sessions: self.sessions.clone(),
            cases: self.cases.clone(),
            quick_state: self.quick_state.clone(),
            classifier: self.classifier.clone(),
            knowledge: self.knowledge.clone(),
            catalog: self.catalog.clone(),
            checkout: self.checkout.clone(),
            desk: self.desk.clone(),
            obligations: self.obligations.clone(),
            payments: self.payments.clone(),
            vision: self
                .vision
                .clone()
                .map(|v| v as Arc<dyn concierge_core::traits::VisionClassifier>),
            text: self
                .text
                .clone()
                .map(|t| t as Arc<dyn concierge_core::traits::TextGenerator>),
            clock: self.clock.clone(),
        }
    }

    /// Quick State for `scope` backed by this world's store and clock.
    pub fn state(&self, scope: &Scope) -> QuickState {
        self.collaborators().state_for(scope)
    }

    pub fn vision(&self) -> &Arc<MockVision> {
        self.vision
            .as_ref()
            .expect("world was built without vision")
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::StateKey;
    use std::time::Duration;

    #[tokio::test]
    async fn state_cells_expire_with_the_manual_clock() {
        let world = TestWorld::new();
        let state = world.state(&TestWorld::scope());
        state
            .set(StateKey::LastUserMsg, &"hello", Duration::from_secs(60))
            .await
            .unwrap();

        world.clock.advance_secs(59);
        let live: Option<String> = state.get(StateKey::LastUserMsg).await.unwrap();
        assert_eq!(live.as_deref(), Some("hello"));

        world.clock.advance_secs(2);
        let gone: Option<String> = state.get(StateKey::LastUserMsg).await.unwrap();
        assert_eq!(gone, None);
    }
}
