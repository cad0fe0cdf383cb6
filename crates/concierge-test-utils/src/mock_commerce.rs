// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock catalog, checkout, and knowledge base.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use concierge_core::traits::{
    CheckoutConfirmation, CheckoutFlow, CheckoutState, ImageSearchResult, KbHit, KnowledgeBase,
    PaymentType, ProductCatalog, ProductSearchResult,
};
use concierge_core::{Answer, ConciergeError, Product, Scope};

/// Catalog backed by a fixed product list.
///
/// Text search matches a product when any query token of two or more
/// characters appears in its name, brand, or code.
#[derive(Debug, Default)]
pub struct MockCatalog {
    products: Mutex<Vec<Product>>,
    image_results: Mutex<VecDeque<ImageSearchResult>>,
    viewed: Mutex<HashMap<Scope, Product>>,
    searches: Mutex<Vec<String>>,
    image_searches: Mutex<Vec<String>>,
    tracked: Mutex<Vec<Product>>,
    fail_search: AtomicBool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    pub async fn push_image_result(&self, result: ImageSearchResult) {
        self.image_results.lock().await.push_back(result);
    }

    pub async fn set_recently_viewed(&self, scope: &Scope, product: Product) {
        self.viewed.lock().await.insert(scope.clone(), product);
    }

    pub fn fail_searches(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Queries passed to `search`, in call order.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.lock().await.clone()
    }

    pub async fn image_searches(&self) -> Vec<String> {
        self.image_searches.lock().await.clone()
    }

    pub async fn tracked(&self) -> Vec<Product> {
        self.tracked.lock().await.clone()
    }

    fn matches(product: &Product, query: &str) -> bool {
        let haystack = format!(
            "{} {} {}",
            product.name,
            product.brand.as_deref().unwrap_or_default(),
            product.code.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        let query = query.to_lowercase();
        query
            .split_whitespace()
            .filter(|token| token.chars().count() >= 2)
            .any(|token| haystack.contains(token))
            || haystack.contains(query.trim())
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<ProductSearchResult, ConciergeError> {
        self.searches.lock().await.push(query.to_string());
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(ConciergeError::collaborator("catalog", "search unavailable"));
        }
        if query.trim().is_empty() {
            return Ok(ProductSearchResult::default());
        }
        let products = self.products.lock().await;
        Ok(ProductSearchResult {
            products: products
                .iter()
                .filter(|p| Self::matches(p, query))
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    async fn search_by_image(&self, image_url: &str) -> Result<ImageSearchResult, ConciergeError> {
        self.image_searches.lock().await.push(image_url.to_string());
        Ok(self
            .image_results
            .lock()
            .await
            .pop_front()
            .unwrap_or_default())
    }

    async fn by_code(&self, code: &str) -> Result<Option<Product>, ConciergeError> {
        let products = self.products.lock().await;
        Ok(products
            .iter()
            .find(|p| {
                p.code
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(code.trim()))
            })
            .cloned())
    }

    async fn recently_viewed(&self, scope: &Scope) -> Result<Option<Product>, ConciergeError> {
        Ok(self.viewed.lock().await.get(scope).cloned())
    }

    async fn track_view(&self, scope: &Scope, product: &Product) -> Result<(), ConciergeError> {
        self.viewed
            .lock()
            .await
            .insert(scope.clone(), product.clone());
        self.tracked.lock().await.push(product.clone());
        Ok(())
    }

    async fn browse(&self, category: Option<&str>) -> Result<Vec<Product>, ConciergeError> {
        let products = self.products.lock().await;
        Ok(products
            .iter()
            .filter(|p| category.is_none_or(|c| Self::matches(p, c)))
            .take(5)
            .cloned()
            .collect())
    }
}

/// Checkout flow with scripted `handle` replies and recorded calls.
#[derive(Debug, Default)]
pub struct MockCheckout {
    states: Mutex<HashMap<Scope, CheckoutState>>,
    handle_replies: Mutex<VecDeque<Option<Answer>>>,
    calls: Mutex<Vec<String>>,
}

impl MockCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_state(&self, scope: &Scope, state: CheckoutState) {
        self.states.lock().await.insert(scope.clone(), state);
    }

    pub async fn current(&self, scope: &Scope) -> Option<CheckoutState> {
        self.states.lock().await.get(scope).cloned()
    }

    /// Queues the next `handle` result. `None` means the flow declines the turn.
    pub async fn push_handle_reply(&self, reply: Option<Answer>) {
        self.handle_replies.lock().await.push_back(reply);
    }

    /// Operation names in call order (`handle`, `start:deposit`, `confirm:full`, ...).
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl CheckoutFlow for MockCheckout {
    async fn state(&self, scope: &Scope) -> Result<Option<CheckoutState>, ConciergeError> {
        Ok(self.states.lock().await.get(scope).cloned())
    }

    async fn handle(&self, scope: &Scope, text: &str) -> Result<Option<Answer>, ConciergeError> {
        self.record(format!("handle:{text}")).await;
        if !self.states.lock().await.contains_key(scope) {
            return Ok(None);
        }
        Ok(self.handle_replies.lock().await.pop_front().flatten())
    }

    async fn clear(&self, scope: &Scope) -> Result<(), ConciergeError> {
        self.record("clear".to_string()).await;
        self.states.lock().await.remove(scope);
        Ok(())
    }

    async fn start(
        &self,
        scope: &Scope,
        product: &Product,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError> {
        self.record(format!("start:{payment_type}")).await;
        self.states.lock().await.insert(
            scope.clone(),
            CheckoutState {
                step: "confirm".to_string(),
                product: Some(product.clone()),
                payment_type: Some(payment_type),
            },
        );
        Ok(Answer::text(format!("สรุปการสั่งซื้อ {}", product.name)))
    }

    async fn confirm(
        &self,
        scope: &Scope,
        payment_type: PaymentType,
    ) -> Result<CheckoutConfirmation, ConciergeError> {
        self.record(format!("confirm:{payment_type}")).await;
        self.states.lock().await.remove(scope);
        Ok(CheckoutConfirmation {
            answer: Answer::text("ยืนยันคำสั่งซื้อแล้วค่ะ"),
            order_no: Some("ORD-0001".to_string()),
        })
    }

    async fn cancel(&self, scope: &Scope) -> Result<Answer, ConciergeError> {
        self.record("cancel".to_string()).await;
        self.states.lock().await.remove(scope);
        Ok(Answer::text("ยกเลิกคำสั่งซื้อแล้วค่ะ"))
    }

    async fn payment_options(
        &self,
        _scope: &Scope,
        product: Option<&Product>,
    ) -> Result<Answer, ConciergeError> {
        self.record("payment_options".to_string()).await;
        let suffix = product.map(|p| format!(" {}", p.name)).unwrap_or_default();
        Ok(Answer::text(format!("ช่องทางการชำระเงิน{suffix}")))
    }

    async fn change_payment_type(
        &self,
        _scope: &Scope,
        order_no: &str,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError> {
        self.record(format!("change:{order_no}:{payment_type}")).await;
        Ok(Answer::text(format!("เปลี่ยนวิธีชำระของ {order_no} แล้วค่ะ")))
    }
}

/// Knowledge base answering by keyword containment.
#[derive(Debug, Default)]
pub struct MockKnowledgeBase {
    policies: Vec<(String, String)>,
    entries: Vec<(String, KbHit)>,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, keyword: &str, answer: &str) -> Self {
        self.policies.push((keyword.to_string(), answer.to_string()));
        self
    }

    pub fn with_entry(mut self, keyword: &str, answer: &str, score: f64) -> Self {
        self.entries.push((
            keyword.to_string(),
            KbHit {
                answer: answer.to_string(),
                score,
            },
        ));
        self
    }
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    async fn policy_answer(&self, text: &str) -> Result<Option<String>, ConciergeError> {
        Ok(self
            .policies
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, answer)| answer.clone()))
    }

    async fn search(&self, text: &str) -> Result<Vec<KbHit>, ConciergeError> {
        let mut hits: Vec<KbHit> = self
            .entries
            .iter()
            .filter(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, hit)| hit.clone())
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }
}
