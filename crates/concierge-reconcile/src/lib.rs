// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image classification and payment reconciliation.
//!
//! [`ImageEngine`] decides what an uploaded image is for. Payment proofs are
//! recorded and matched against the customer's pending orders, pawns and
//! installment contracts by [`match_payment`].

pub mod engine;
pub mod evidence;
pub mod matcher;
pub mod routing;

pub use engine::{ImageEngine, ImageTurn, LastPayment};
pub use evidence::{evidence_from_report, parse_amount};
pub use matcher::{Candidates, MatchOutcome, MatchTier, Tolerances, match_payment};
pub use routing::{ImageRoute, route_image};
