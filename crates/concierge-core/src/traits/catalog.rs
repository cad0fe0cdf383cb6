// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConciergeError;
use crate::types::{Product, Scope};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSearchResult {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub products: Vec<Product>,
    /// What the catalog thinks the photo shows, for "not found" replies.
    pub detected_description: Option<String>,
}

/// Product catalog and per-user viewing memory.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn search(&self, query: &str, limit: usize)
    -> Result<ProductSearchResult, ConciergeError>;

    async fn search_by_image(&self, image_url: &str)
    -> Result<ImageSearchResult, ConciergeError>;

    async fn by_code(&self, code: &str) -> Result<Option<Product>, ConciergeError>;

    /// The product this user looked at most recently.
    async fn recently_viewed(&self, scope: &Scope) -> Result<Option<Product>, ConciergeError>;

    async fn track_view(&self, scope: &Scope, product: &Product) -> Result<(), ConciergeError>;

    /// Featured products, optionally restricted to a category keyword.
    async fn browse(&self, category: Option<&str>) -> Result<Vec<Product>, ConciergeError>;
}
