// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered matching of a payment amount against outstanding obligations.
//!
//! Tiers are tried in a fixed order and the first tier with any candidate
//! inside its tolerance decides the match. Inside a tier the smallest
//! difference wins, and equal differences go to the most recent obligation.
//!
//! | Tier | Candidates | Tolerance (default) |
//! |---|---|---|
//! | `order_amount` | pending orders | ±1 |
//! | `order_most_recent` | pending orders, any amount | n/a |
//! | `pawn_interest` | pawns, interest due | ±1 |
//! | `pawn_redemption` | pawns, full redemption | ±10 |
//! | `pawn_loan` | pawns, loan principal | ±1 |
//! | `installment` | installment contracts | ±100 |
//!
//! Pawn and installment tiers are only consulted when there are no pending
//! orders at all, and only with a known positive amount.

use std::cmp::Ordering;

use concierge_config::model::ReconciliationConfig;
use concierge_core::traits::{ExpectedAmount, Obligation};
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchTier {
    OrderAmount,
    OrderMostRecent,
    PawnInterest,
    PawnRedemption,
    PawnLoan,
    Installment,
}

impl MatchTier {
    /// Payment subtype reported to the obligation service.
    pub fn subtype(self) -> &'static str {
        match self {
            Self::OrderAmount | Self::OrderMostRecent => "full",
            Self::PawnInterest => "interest",
            Self::PawnRedemption | Self::PawnLoan => "redemption",
            Self::Installment => "installment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub order: f64,
    pub pawn_interest: f64,
    pub pawn_redemption: f64,
    pub pawn_loan: f64,
    pub installment: f64,
}

impl From<&ReconciliationConfig> for Tolerances {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            order: config.order_tolerance,
            pawn_interest: config.pawn_interest_tolerance,
            pawn_redemption: config.pawn_redemption_tolerance,
            pawn_loan: config.pawn_loan_tolerance,
            installment: config.installment_tolerance,
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::from(&ReconciliationConfig::default())
    }
}

/// Everything a payment could settle, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub orders: Vec<Obligation>,
    pub pawns: Vec<Obligation>,
    pub installments: Vec<Obligation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Linked {
        obligation: Obligation,
        tier: MatchTier,
        /// Distance between paid and expected amount, `None` for the recency tier.
        difference: Option<f64>,
    },
    /// Left for manual review. Counts show what was found.
    Unmatched {
        orders: usize,
        pawns: usize,
        installments: usize,
    },
}

fn single_amount(expected: &ExpectedAmount) -> Option<f64> {
    match expected {
        ExpectedAmount::Single { amount } => Some(*amount),
        ExpectedAmount::Pawn { .. } => None,
    }
}

fn pawn_interest(expected: &ExpectedAmount) -> Option<f64> {
    match expected {
        ExpectedAmount::Pawn { interest, .. } => *interest,
        ExpectedAmount::Single { .. } => None,
    }
}

fn pawn_redemption(expected: &ExpectedAmount) -> Option<f64> {
    match expected {
        ExpectedAmount::Pawn {
            full_redemption, ..
        } => *full_redemption,
        ExpectedAmount::Single { .. } => None,
    }
}

/// A pawn reported with a single amount is treated as its loan principal.
fn pawn_loan(expected: &ExpectedAmount) -> Option<f64> {
    match expected {
        ExpectedAmount::Pawn { loan, .. } => *loan,
        ExpectedAmount::Single { amount } => Some(*amount),
    }
}

/// Closest candidate within `tolerance`, ties broken by recency.
fn tightest<'a>(
    candidates: &'a [Obligation],
    paid: f64,
    tolerance: f64,
    expected: fn(&ExpectedAmount) -> Option<f64>,
) -> Option<(&'a Obligation, f64)> {
    candidates
        .iter()
        .filter_map(|o| {
            let due = expected(&o.expected).filter(|due| *due > 0.0)?;
            let difference = (due - paid).abs();
            (difference <= tolerance).then_some((o, difference))
        })
        .min_by(|(a, da), (b, db)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.recency.cmp(&a.recency))
        })
}

/// Picks the obligation a payment of `amount` most plausibly settles.
pub fn match_payment(
    amount: Option<f64>,
    candidates: &Candidates,
    tolerances: &Tolerances,
) -> MatchOutcome {
    let paid = amount.filter(|a| *a > 0.0);
    let linked = |obligation: &Obligation, tier, difference| MatchOutcome::Linked {
        obligation: obligation.clone(),
        tier,
        difference,
    };

    if !candidates.orders.is_empty() {
        if let Some(paid) = paid
            && let Some((order, diff)) =
                tightest(&candidates.orders, paid, tolerances.order, single_amount)
        {
            return linked(order, MatchTier::OrderAmount, Some(diff));
        }
        if let Some(order) = candidates.orders.iter().max_by_key(|o| o.recency) {
            return linked(order, MatchTier::OrderMostRecent, None);
        }
    }

    if let Some(paid) = paid {
        let pawn_tiers: [(MatchTier, f64, fn(&ExpectedAmount) -> Option<f64>); 3] = [
            (MatchTier::PawnInterest, tolerances.pawn_interest, pawn_interest),
            (MatchTier::PawnRedemption, tolerances.pawn_redemption, pawn_redemption),
            (MatchTier::PawnLoan, tolerances.pawn_loan, pawn_loan),
        ];
        for (tier, tolerance, expected) in pawn_tiers {
            if let Some((pawn, diff)) = tightest(&candidates.pawns, paid, tolerance, expected) {
                return linked(pawn, tier, Some(diff));
            }
        }

        if let Some((contract, diff)) = tightest(
            &candidates.installments,
            paid,
            tolerances.installment,
            single_amount,
        ) {
            return linked(contract, MatchTier::Installment, Some(diff));
        }
    }

    MatchOutcome::Unmatched {
        orders: candidates.orders.len(),
        pawns: candidates.pawns.len(),
        installments: candidates.installments.len(),
    }
}
