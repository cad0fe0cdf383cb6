// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent routing for Concierge.
//!
//! [`IntentRouter`] takes an admitted text turn through the active checkout,
//! policy answers and early checkout before classifying it, then dispatches
//! the classified intent to its handler. Turns nobody claims fall through to
//! the fallback chain.

mod commerce;
mod fallback;
pub mod heuristics;
mod products;
pub mod rewrite;
mod router;

pub use commerce::LastOrder;
pub use fallback::{clean_reply, store_info};
pub use rewrite::{QueryRewriter, Rewrite, RewriteSource};
pub use router::{IntentRouter, RouteTurn};
