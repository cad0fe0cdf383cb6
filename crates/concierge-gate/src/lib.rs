// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message admission for the Concierge commerce router.
//!
//! Everything that decides whether an inbound text deserves full processing:
//! the gibberish detector, the information density scorer, awaiting-input
//! matching, the gatekeeper that combines them with timing state, the message
//! buffer for held fragments, anti-spam checks, and the bot-echo filter.

pub mod admission;
pub mod buffer;
pub mod echo;
pub mod expectation;
pub mod gatekeeper;
pub mod gibberish;
pub mod keywords;
pub mod score;
pub mod spam;

pub use admission::{Admission, AdmissionGate};
pub use buffer::{MessageBuffer, merge_fragments};
pub use echo::EchoFilter;
pub use expectation::{AwaitingInput, ExpectedInput, is_quick_reply};
pub use gatekeeper::{
    BotActionKind, GateDecision, Gatekeeper, LastBotAction, record_bot_action, record_bot_reply,
    set_awaiting_input,
};
pub use gibberish::is_gibberish;
pub use keywords::extract_product_keywords;
pub use score::InfoScorer;
pub use spam::{AntiSpam, SpamVerdict, normalize_for_comparison};
