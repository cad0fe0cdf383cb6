// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog, checkout and knowledge-base operations.

use async_trait::async_trait;
use concierge_core::traits::{
    CheckoutConfirmation, CheckoutFlow, CheckoutState, ImageSearchResult, KbHit, KnowledgeBase,
    PaymentType, ProductCatalog, ProductSearchResult,
};
use concierge_core::{Answer, ConciergeError, Product, Scope};
use serde::Deserialize;
use serde_json::json;

use crate::client::BackendClient;

#[async_trait]
impl ProductCatalog for BackendClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<ProductSearchResult, ConciergeError> {
        self.call("catalog/search", &json!({"query": query, "limit": limit}))
            .await
    }

    async fn search_by_image(&self, image_url: &str) -> Result<ImageSearchResult, ConciergeError> {
        self.call("catalog/search_by_image", &json!({"image_url": image_url}))
            .await
    }

    async fn by_code(&self, code: &str) -> Result<Option<Product>, ConciergeError> {
        self.call("catalog/by_code", &json!({"code": code})).await
    }

    async fn recently_viewed(&self, scope: &Scope) -> Result<Option<Product>, ConciergeError> {
        self.call("catalog/recently_viewed", &json!({"scope": scope}))
            .await
    }

    async fn track_view(&self, scope: &Scope, product: &Product) -> Result<(), ConciergeError> {
        self.call_unit(
            "catalog/track_view",
            &json!({"scope": scope, "product": product}),
        )
        .await
    }

    async fn browse(&self, category: Option<&str>) -> Result<Vec<Product>, ConciergeError> {
        self.call("catalog/browse", &json!({"category": category}))
            .await
    }
}

#[async_trait]
impl CheckoutFlow for BackendClient {
    async fn state(&self, scope: &Scope) -> Result<Option<CheckoutState>, ConciergeError> {
        self.call("checkout/state", &json!({"scope": scope})).await
    }

    async fn handle(&self, scope: &Scope, text: &str) -> Result<Option<Answer>, ConciergeError> {
        self.call("checkout/handle", &json!({"scope": scope, "text": text}))
            .await
    }

    async fn clear(&self, scope: &Scope) -> Result<(), ConciergeError> {
        self.call_unit("checkout/clear", &json!({"scope": scope}))
            .await
    }

    async fn start(
        &self,
        scope: &Scope,
        product: &Product,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError> {
        self.call(
            "checkout/start",
            &json!({"scope": scope, "product": product, "payment_type": payment_type}),
        )
        .await
    }

    async fn confirm(
        &self,
        scope: &Scope,
        payment_type: PaymentType,
    ) -> Result<CheckoutConfirmation, ConciergeError> {
        self.call(
            "checkout/confirm",
            &json!({"scope": scope, "payment_type": payment_type}),
        )
        .await
    }

    async fn cancel(&self, scope: &Scope) -> Result<Answer, ConciergeError> {
        self.call("checkout/cancel", &json!({"scope": scope})).await
    }

    async fn payment_options(
        &self,
        scope: &Scope,
        product: Option<&Product>,
    ) -> Result<Answer, ConciergeError> {
        self.call(
            "checkout/payment_options",
            &json!({"scope": scope, "product": product}),
        )
        .await
    }

    async fn change_payment_type(
        &self,
        scope: &Scope,
        order_no: &str,
        payment_type: PaymentType,
    ) -> Result<Answer, ConciergeError> {
        self.call(
            "checkout/change_payment_type",
            &json!({"scope": scope, "order_no": order_no, "payment_type": payment_type}),
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct PolicyAnswer {
    #[serde(default)]
    answer: Option<String>,
}

#[async_trait]
impl KnowledgeBase for BackendClient {
    async fn policy_answer(&self, text: &str) -> Result<Option<String>, ConciergeError> {
        let reply: PolicyAnswer = self
            .call("knowledge/policy_answer", &json!({"text": text}))
            .await?;
        Ok(reply.answer.filter(|a| !a.trim().is_empty()))
    }

    async fn search(&self, text: &str) -> Result<Vec<KbHit>, ConciergeError> {
        let mut hits: Vec<KbHit> = self
            .call("knowledge/search", &json!({"text": text}))
            .await?;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }
}
