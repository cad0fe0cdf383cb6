// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end admission scenarios over the in-memory Quick State.

use std::time::Duration;

use concierge_config::BotConfig;
use concierge_core::{GateReason, Platform, StateKey};
use concierge_gate::AdmissionGate;
use concierge_test_utils::TestWorld;

#[tokio::test]
async fn repeated_digits_are_dropped_without_buffering() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let state = world.state(&scope);
    let gate = AdmissionGate::new(&BotConfig::default());

    let admission = gate.admit("55555555", &state, Platform::Line).await.unwrap();

    assert!(!admission.decision.process);
    assert_eq!(admission.decision.reason, GateReason::Gibberish);
    assert!(admission.text.is_empty());
    assert!(world.quick_state.peek(&scope, "msg_buffer").is_none());
}

#[tokio::test]
async fn held_fragment_is_merged_into_next_message() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let state = world.state(&scope);
    let gate = AdmissionGate::new(&BotConfig::default());

    // An earlier accepted message starts the rapid-typing window.
    state
        .touch(StateKey::LastUserMsg, Duration::from_secs(60))
        .await
        .unwrap();
    world.clock.advance_secs(1);

    let first = gate.admit("ครับ", &state, Platform::Line).await.unwrap();
    assert_eq!(first.decision.reason, GateReason::LowInfoRapid);
    assert!(world.quick_state.peek(&scope, "msg_buffer").is_some());

    world.clock.advance_secs(2);
    let second = gate
        .admit("นาฬิกาโรเล็กซ์สีเขียว", &state, Platform::Line)
        .await
        .unwrap();
    assert!(second.decision.process);
    assert_eq!(second.decision.reason, GateReason::Ok);
    assert_eq!(second.text, "นาฬิกาโรเล็กซ์สีเขียว");
    assert!(world.quick_state.peek(&scope, "msg_buffer").is_none());
}

#[tokio::test]
async fn product_fragment_core_is_prepended() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let state = world.state(&scope);
    let gate = AdmissionGate::new(&BotConfig::default());

    state
        .touch(StateKey::LastBotReplyTime, Duration::from_secs(300))
        .await
        .unwrap();
    world.clock.advance_secs(2);
    let held = gate.admit("ดำ", &state, Platform::Line).await.unwrap();
    assert_eq!(held.decision.reason, GateReason::LowInfoAfterReply);

    world.clock.advance_secs(2);
    let admitted = gate.admit("rolex submariner", &state, Platform::Line).await.unwrap();
    assert_eq!(admitted.text, "ดำ rolex submariner");
}
