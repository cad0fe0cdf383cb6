// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides what an analyzed image is for.

use concierge_config::model::ReconciliationConfig;
use concierge_core::traits::{ImageKind, VisionReport};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImageRoute {
    /// Payment proof, goes to reconciliation.
    Slip,
    /// Product photo, goes to image search.
    Product,
    /// Anything else. Image search is still tried before asking the user.
    Generic,
}

/// Maps a vision report to a route.
///
/// A payment proof below the normal threshold still counts as a slip when
/// the customer has a checkout or order waiting for payment and the
/// confidence reaches the context threshold. Nothing else ever becomes a
/// slip.
pub fn route_image(
    report: &VisionReport,
    config: &ReconciliationConfig,
    payment_pending: bool,
) -> ImageRoute {
    match report.image_type {
        ImageKind::PaymentProof if report.confidence >= config.payment_confidence => {
            ImageRoute::Slip
        }
        ImageKind::PaymentProof
            if payment_pending && report.confidence >= config.context_confidence =>
        {
            ImageRoute::Slip
        }
        ImageKind::ProductImage if report.confidence >= config.product_confidence => {
            ImageRoute::Product
        }
        _ => ImageRoute::Generic,
    }
}
