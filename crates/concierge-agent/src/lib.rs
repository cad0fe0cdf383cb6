// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn processing for Concierge.
//!
//! [`TurnProcessor`] is the single entry point for inbound messages. It
//! serializes turns per (channel, user), applies per-turn configuration
//! overrides, runs the pre-checks and admission gate, and dispatches to the
//! intent router or the image engine. Every turn ends in a [`Reply`] carrying
//! a reason tag and trace id.
//!
//! [`Reply`]: concierge_core::Reply

pub mod locks;
mod pipeline;
pub mod processor;

pub use locks::ScopeLocks;
pub use processor::TurnProcessor;
