// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product search, selection and browsing handlers.

use concierge_cases::HistoryEntry;
use concierge_core::format::{fill, format_price, product_carousel};
use concierge_core::traits::PaymentType;
use concierge_core::{
    CaseType, ConciergeError, Handled, Intent, IntentResult, PendingIntent, Product, ReasonTag,
    StateKey,
};
use concierge_gate::extract_product_keywords;
use tracing::{debug, info, warn};

use crate::heuristics::{GREETING, THANKS, category_from_history};
use crate::router::{IntentRouter, RouteTurn, slot_flag};

/// Upper bound on products shown for a search.
pub(crate) const SEARCH_LIMIT: usize = 10;
const FOLLOW_UP_LIMIT: usize = 3;

const BROWSE_CATEGORIES: &str = "สนใจดูสินค้าประเภทไหนคะ?\n\n\
1. นาฬิกา\n2. กระเป๋า\n3. แหวน\n4. สร้อย\n5. กำไล\n6. ต่างหู\n\n\
พิมพ์ชื่อประเภทหรือแบรนด์ที่สนใจได้เลยค่ะ";

impl IntentRouter {
    /// Searches the catalog and shows what it finds.
    ///
    /// Unless `skip_rewrite` is set, the query is first expanded from the
    /// conversation; a turn the rewriter calls chit-chat is answered
    /// conversationally instead of searched.
    pub(crate) async fn product_search(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
        query: &str,
        skip_rewrite: bool,
    ) -> Result<Handled, ConciergeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Handled::text(
                &self.templates.ask_product_code,
                ReasonTag::Routed(intent),
            ));
        }

        let search_query = if skip_rewrite || !self.features.query_rewrite {
            query.to_string()
        } else {
            let rewrite = self.rewriter.rewrite(query, turn.history).await;
            debug!(source = %rewrite.source, rewritten = %rewrite.rewritten, "query rewrite");
            if rewrite.is_chit_chat {
                return Ok(self.chit_chat(turn, query).await);
            }
            rewrite.rewritten
        };

        let products = match self
            .collaborators
            .catalog
            .search(&search_query, SEARCH_LIMIT)
            .await
        {
            Ok(found) => found.products,
            Err(e) => {
                warn!(error = %e, query = %search_query, "catalog search failed");
                Vec::new()
            }
        };
        info!(query = %search_query, results = products.len(), "product search");

        if products.is_empty() {
            return Ok(Handled::text(
                fill(
                    &self.templates.product_not_found,
                    &[("query", search_query.as_str())],
                ),
                ReasonTag::ProductNotFound,
            ));
        }
        self.show_products(turn, products).await
    }

    /// Shows search results, or starts the deposit checkout a customer asked
    /// for before naming a product.
    pub(crate) async fn show_products(
        &self,
        turn: &RouteTurn<'_>,
        products: Vec<Product>,
    ) -> Result<Handled, ConciergeError> {
        let Some(first) = products.first() else {
            return Ok(Handled::text(
                &self.templates.ask_product_code,
                ReasonTag::ProductNotFound,
            ));
        };
        self.track_viewed(turn, first).await;

        let state = self.collaborators.state_for(turn.scope);
        let pending: Option<PendingIntent> = state.get(StateKey::PendingIntent).await?;
        if pending.is_some_and(|p| p.is(PendingIntent::DEPOSIT)) {
            state.delete(StateKey::PendingIntent).await?;
            info!(product_code = ?first.code, "starting deposit checkout for pending request");
            let answer = self
                .collaborators
                .checkout
                .start(turn.scope, first, PaymentType::Deposit)
                .await?;
            return Ok(Handled::new(answer, ReasonTag::Routed(Intent::DepositNew)));
        }

        Ok(Handled::new(product_carousel(&products), ReasonTag::ProductSearch))
    }

    /// Records a product view in the catalog and in the open product case.
    pub(crate) async fn track_viewed(&self, turn: &RouteTurn<'_>, product: &Product) {
        if let Err(e) = self.collaborators.catalog.track_view(turn.scope, product).await {
            warn!(error = %e, "recording product view failed");
        }
        if self.track_cases
            && let Err(e) = self.cases.track_product(&turn.case_context(), product).await
        {
            warn!(error = %e, "recording product in case failed");
        }
    }

    pub(crate) async fn product_availability(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let keywords = extract_product_keywords(turn.text);
        if keywords.is_empty() {
            self.product_search(turn, intent, turn.text, false).await
        } else {
            self.product_search(turn, intent, &keywords, true).await
        }
    }

    /// Works out which product the customer means and starts its checkout.
    pub(crate) async fn product_interest(
        &self,
        turn: &RouteTurn<'_>,
        result: &IntentResult,
    ) -> Result<Handled, ConciergeError> {
        let intent = result.intent;

        if slot_flag(result, "from_history") {
            if let Some(index) = result.slot_str("product_index") {
                return self.pick_from_history(turn, intent, &index, false).await;
            }
            if let Some(name) = result.slot_str("product_name_query") {
                return self.pick_from_history(turn, intent, &name, true).await;
            }
        }

        let mut code = result
            .slot_str("code")
            .or_else(|| result.slot_str("product_code"));
        let trigger = result.slot_str("trigger");
        if code.is_none() && trigger.as_deref().unwrap_or("general") == "general" {
            code = self.recent_product(turn).await.and_then(|p| p.code);
        }

        let Some(code) = code else {
            if let Some(prompt) = self.history_prompt(turn).await? {
                return Ok(Handled::text(prompt, ReasonTag::Routed(intent)));
            }
            if let Some(category) = category_from_history(turn.history) {
                info!(category, "interest without product, searching category from history");
                return self.product_search(turn, intent, category, true).await;
            }
            return Ok(Handled::text(
                &self.templates.ask_product_code,
                ReasonTag::Routed(intent),
            ));
        };

        let product = match self.collaborators.catalog.by_code(&code).await {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, code = %code, "product lookup failed");
                None
            }
        };
        let Some(product) = product else {
            return Ok(Handled::text(
                format!(
                    "ไม่พบสินค้ารหัส {code} ค่ะ ลองเช็ครหัสอีกครั้ง หรือพิมพ์ชื่อสินค้าที่สนใจได้เลยนะคะ"
                ),
                ReasonTag::ProductNotFound,
            ));
        };

        self.track_viewed(turn, &product).await;
        let answer = self
            .collaborators
            .checkout
            .start(turn.scope, &product, PaymentType::Full)
            .await?;
        Ok(Handled::new(answer, ReasonTag::Routed(intent)))
    }

    /// "เอาตัวที่ 2", "เอาอันที่เป็น Rolex": resolves against the products
    /// already shown in this product case.
    async fn pick_from_history(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
        selector: &str,
        by_name: bool,
    ) -> Result<Handled, ConciergeError> {
        let case = self
            .cases
            .open_case(turn.scope, CaseType::ProductInquiry)
            .await?;
        let history = match &case {
            Some(case) => self.cases.products_history(&case.id).await?,
            None => Vec::new(),
        };

        let Some(case) = case.filter(|_| !history.is_empty()) else {
            if by_name {
                return self.product_search(turn, intent, selector, false).await;
            }
            return Ok(Handled::text(
                "ยังไม่มีสินค้าที่ดูไว้ค่ะ พิมพ์รหัสหรือชื่อสินค้าที่สนใจได้เลยนะคะ",
                ReasonTag::Routed(intent),
            ));
        };

        match self
            .cases
            .select_product_from_history(&case.id, selector)
            .await?
        {
            Some(entry) => {
                info!(case_no = %case.case_no, idx = entry.idx, "product selected from history");
                let product = entry.to_product();
                let answer = self
                    .collaborators
                    .checkout
                    .start(turn.scope, &product, PaymentType::Full)
                    .await?;
                Ok(Handled::new(answer, ReasonTag::Routed(intent)))
            }
            None => {
                let heading = if by_name {
                    format!("ไม่พบ \"{selector}\" ในรายการที่ดูไว้ค่ะ")
                } else {
                    format!("ไม่พบรายการที่ {selector} ค่ะ")
                };
                Ok(Handled::text(
                    format!(
                        "{heading}\n\nสินค้าที่ดูไว้มี:\n{}\n\nพิมพ์ \"เอาตัวที่ X\" หรือพิมพ์รหัสสินค้าได้เลยค่ะ",
                        history_lines(&history)
                    ),
                    ReasonTag::Routed(intent),
                ))
            }
        }
    }

    /// A "which one?" prompt listing the products viewed in the open case.
    async fn history_prompt(
        &self,
        turn: &RouteTurn<'_>,
    ) -> Result<Option<String>, ConciergeError> {
        let Some(case) = self
            .cases
            .open_case(turn.scope, CaseType::ProductInquiry)
            .await?
        else {
            return Ok(None);
        };
        let history = self.cases.products_history(&case.id).await?;
        if history.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "สนใจสินค้าตัวไหนคะ? ที่ดูไว้มี:\n{}\n\nพิมพ์ \"เอาตัวที่ X\" หรือพิมพ์ชื่อสินค้าได้เลยค่ะ",
            history_lines(&history)
        )))
    }

    pub(crate) async fn browse(&self, intent: Intent) -> Result<Handled, ConciergeError> {
        match self.collaborators.catalog.browse(None).await {
            Ok(products) if !products.is_empty() => Ok(Handled::new(
                product_carousel(&products),
                ReasonTag::Routed(intent),
            )),
            Ok(_) => Ok(Handled::text(BROWSE_CATEGORIES, ReasonTag::Routed(intent))),
            Err(e) => {
                warn!(error = %e, "catalog browse failed");
                Ok(Handled::text(BROWSE_CATEGORIES, ReasonTag::Routed(intent)))
            }
        }
    }

    /// "มีแบบอื่นไหม": similar products to the one last viewed.
    pub(crate) async fn follow_up(
        &self,
        turn: &RouteTurn<'_>,
        intent: Intent,
    ) -> Result<Handled, ConciergeError> {
        let Some(recent) = self.recent_product(turn).await else {
            return Ok(Handled::text(
                "สนใจดูสินค้าประเภทไหนคะ? พิมพ์รหัสสินค้าหรือประเภทที่สนใจได้เลยค่ะ",
                ReasonTag::Routed(intent),
            ));
        };

        let term = recent
            .brand
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| recent.name.split_whitespace().next().map(str::to_string))
            .unwrap_or_default();

        let similar: Vec<Product> = if term.is_empty() {
            Vec::new()
        } else {
            match self.collaborators.catalog.search(&term, SEARCH_LIMIT).await {
                Ok(found) => found
                    .products
                    .into_iter()
                    .filter(|p| p.code.is_none() || p.code != recent.code)
                    .take(FOLLOW_UP_LIMIT)
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "similar product search failed");
                    Vec::new()
                }
            }
        };

        if similar.is_empty() {
            let label = recent.code.as_deref().unwrap_or(recent.name.as_str());
            return Ok(Handled::text(
                format!(
                    "สินค้า {label} มีแบบเดียวค่ะ\n\nสนใจดูสินค้าอื่นไหมคะ? พิมพ์ประเภทที่สนใจได้เลยค่ะ"
                ),
                ReasonTag::Routed(intent),
            ));
        }
        Ok(Handled::new(product_carousel(&similar), ReasonTag::Routed(intent)))
    }

    pub(crate) async fn recent_product(&self, turn: &RouteTurn<'_>) -> Option<Product> {
        match self.collaborators.catalog.recently_viewed(turn.scope).await {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, "recently viewed lookup failed");
                None
            }
        }
    }

    /// Reply for a turn the rewriter judged to be chit-chat.
    async fn chit_chat(&self, turn: &RouteTurn<'_>, query: &str) -> Handled {
        if let Some(reply) = self.free_text_answer(turn).await {
            return Handled::text(reply, ReasonTag::Routed(Intent::Chitchat));
        }
        if GREETING.is_match(query) {
            return Handled::text(&self.templates.greeting, ReasonTag::Routed(Intent::Greeting));
        }
        if THANKS.is_match(query) {
            return Handled::text(&self.templates.thanks, ReasonTag::Routed(Intent::Thanks));
        }
        Handled::text(
            &self.templates.ask_product_code,
            ReasonTag::Routed(Intent::Chitchat),
        )
    }
}

fn history_lines(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            let name = entry.product_name.as_deref().unwrap_or("สินค้า");
            match entry.product_price {
                Some(price) => format!("{}. {} - ฿{}", entry.idx, name, format_price(price)),
                None => format!("{}. {}", entry.idx, name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
