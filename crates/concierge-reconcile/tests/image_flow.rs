// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use chrono::{TimeZone, Utc};
use concierge_cases::{CaseContext, CaseManager};
use concierge_core::traits::{
    CheckoutState, ExpectedAmount, ImageKind, ImageSearchResult, Obligation, ObligationKind,
    SessionStore,
};
use concierge_core::{
    ActivityType, CasePriority, CaseStatus, CaseType, Clock, ConciergeError, PendingIntent, Platform, ReasonTag,
    ReplyAction, SlotBag, StateKey,
};
use concierge_reconcile::{ImageEngine, ImageTurn, LastPayment};
use concierge_test_utils::{MockVision, TestWorld, product};
use serde_json::json;

const IMAGE: &str = "https://cdn.example/upload/1.jpg";

fn engine(world: &TestWorld) -> ImageEngine {
    ImageEngine::new(world.collaborators(), &world.config)
}

fn order(id: &str, amount: f64) -> Obligation {
    Obligation {
        id: id.into(),
        reference: format!("ORD-{id}"),
        kind: ObligationKind::Order,
        expected: ExpectedAmount::Single { amount },
        recency: Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap(),
    }
}

async fn stored_case(world: &TestWorld, id: &str) -> concierge_core::Case {
    world
        .cases
        .all()
        .await
        .into_iter()
        .find(|c| c.id == id)
        .unwrap()
}

fn turn<'a>(scope: &'a concierge_core::Scope, session: Option<&'a str>) -> ImageTurn<'a> {
    ImageTurn {
        scope,
        session_id: session,
        image_url: Some(IMAGE),
    }
}

#[tokio::test]
async fn borderline_slip_with_pending_order_is_linked_by_amount() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world.obligations.add(order("o-1", 15000.0)).await;
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.35,
            json!({"amount": "15,000.00", "bank": "KBank", "ref": "TX-991"}),
        )))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::SlipSaved);
    let text = handled.answer.text.unwrap();
    assert!(text.contains("ORD-o-1"), "{text}");
    assert!(text.contains("15,000"), "{text}");

    let links = world.obligations.links().await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].obligation_id, "o-1");
    assert_eq!(links[0].subtype, "full");
    assert_eq!(links[0].payment_id, "pay-1");

    assert!(world.checkout.calls().await.contains(&"clear".to_string()));
    let last: Option<LastPayment> = world.state(&scope).get(StateKey::LastPayment).await.unwrap();
    let last = last.unwrap();
    assert_eq!(last.payment_no, "PAY-0001");
    assert_eq!(last.matched_reference.as_deref(), Some("ORD-o-1"));
}

#[tokio::test]
async fn vision_failure_asks_for_clarification_and_never_records_a_slip() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world.obligations.add(order("o-1", 15000.0)).await;
    world
        .vision()
        .push(Err(ConciergeError::Timeout {
            duration: Duration::from_secs(30),
        }))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::ImageClarify);
    assert!(matches!(
        handled.answer.actions.first(),
        Some(ReplyAction::QuickReply { items }) if items.len() == 3
    ));
    assert!(world.payments.recorded().await.is_empty());
    assert!(world.obligations.links().await.is_empty());
    assert!(world.catalog.image_searches().await.is_empty());
}

#[tokio::test]
async fn pending_pawn_assessment_claims_the_image() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let session = world
        .sessions
        .get_or_create(&scope, Platform::Line, world.clock.now())
        .await
        .unwrap();
    let cases = CaseManager::from_collaborators(&world.collaborators(), &world.config);
    let pawn_case = cases
        .get_or_create(
            &CaseContext::new(scope.clone(), Platform::Line),
            CaseType::Pawn,
            &SlotBag::new(),
        )
        .await
        .unwrap();
    world
        .state(&scope)
        .set(
            StateKey::PendingIntent,
            &PendingIntent::new(PendingIntent::PAWN_ASSESSMENT, world.clock.now()),
            Duration::from_secs(600),
        )
        .await
        .unwrap();
    world
        .vision()
        .push(Ok(MockVision::report(ImageKind::PaymentProof, 0.99, json!({}))))
        .await;

    let handled = engine(&world)
        .handle(turn(&scope, Some(&session.id)))
        .await
        .unwrap();

    assert_eq!(handled.reason, ReasonTag::PawnImageReceived);
    assert!(world.vision().calls().await.is_empty());
    assert!(world.payments.recorded().await.is_empty());

    let session = world.sessions.session_for(&scope).unwrap();
    assert_eq!(session.last_admin_message_at, Some(world.clock.now()));
    let pending: Option<PendingIntent> =
        world.state(&scope).get(StateKey::PendingIntent).await.unwrap();
    assert_eq!(pending, None);

    let case = cases.open_case(&scope, CaseType::Pawn).await.unwrap().unwrap();
    assert_eq!(case.id, pawn_case.id);
    assert_eq!(case.status, CaseStatus::PendingAdmin);
    assert_eq!(case.priority, CasePriority::High);
}

#[tokio::test]
async fn generic_image_searches_products_even_with_pending_order() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world.obligations.add(order("o-1", 15000.0)).await;
    world
        .catalog
        .push_image_result(ImageSearchResult {
            products: vec![product("RLX-001", "Rolex Submariner", 450000.0)],
            detected_description: None,
        })
        .await;
    world
        .vision()
        .push(Ok(MockVision::report(ImageKind::Generic, 0.8, json!({}))))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::ImageSearch);
    assert_eq!(handled.answer.messages[0]["type"], "carousel");
    assert!(world.payments.recorded().await.is_empty());
}

#[tokio::test]
async fn unrecognised_image_without_results_mentions_slip_option_when_order_pending() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world
        .checkout
        .set_state(
            &scope,
            CheckoutState {
                step: "await_payment".into(),
                product: None,
                payment_type: None,
            },
        )
        .await;
    world
        .catalog
        .push_image_result(ImageSearchResult {
            products: vec![],
            detected_description: Some("กระเป๋าสีดำ".into()),
        })
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::ImageSearchNoResult);
    let text = handled.answer.text.unwrap();
    assert!(text.contains("กระเป๋าสีดำ"), "{text}");
    assert!(text.contains("สลิป"), "{text}");
}

#[tokio::test]
async fn plain_image_is_acknowledged() {
    let world = TestWorld::builder().without_vision().build();
    let scope = TestWorld::scope();

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::ImageReceived);
    assert_eq!(world.catalog.image_searches().await, vec![IMAGE.to_string()]);
}

#[tokio::test]
async fn repeated_slip_is_reported_as_duplicate() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world.payments.mark_seen("TX-1", "PAY-0042").await;
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.9,
            json!({"amount": 500, "ref": "TX-1"}),
        )))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::SlipDuplicate);
    assert!(handled.answer.text.unwrap().contains("PAY-0042"));
    assert!(world.obligations.links().await.is_empty());
}

#[tokio::test]
async fn unmatched_slip_reports_candidate_counts() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world
        .obligations
        .add(Obligation {
            id: "i-1".into(),
            reference: "INS-1".into(),
            kind: ObligationKind::Installment,
            expected: ExpectedAmount::Single { amount: 5000.0 },
            recency: world.clock.now(),
        })
        .await;
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.9,
            json!({"amount": "1,200"}),
        )))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::SlipSaved);
    let text = handled.answer.text.unwrap();
    assert!(text.contains("ผ่อนชำระ 1 รายการ"), "{text}");
    assert!(world.obligations.links().await.is_empty());
}

#[tokio::test]
async fn obligation_outage_keeps_the_slip_for_manual_review() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    world.obligations.add(order("o-1", 15000.0)).await;
    world.obligations.fail_lookups(true);
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.9,
            json!({"amount": "15000"}),
        )))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();

    assert_eq!(handled.reason, ReasonTag::SlipSaved);
    assert_eq!(world.payments.recorded().await.len(), 1);
    assert!(world.obligations.links().await.is_empty());
}

#[tokio::test]
async fn missing_image_url_is_an_image_error() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let handled = engine(&world)
        .handle(ImageTurn {
            scope: &scope,
            session_id: None,
            image_url: None,
        })
        .await
        .unwrap();
    assert_eq!(handled.reason, ReasonTag::ImageError);
}

#[tokio::test]
async fn linked_order_payment_is_recorded_on_the_open_payment_case() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let cases = CaseManager::from_collaborators(&world.collaborators(), &world.config);
    let case = cases
        .get_or_create(
            &CaseContext::new(scope.clone(), Platform::Line),
            CaseType::PaymentFull,
            &SlotBag::new(),
        )
        .await
        .unwrap();
    world.obligations.add(order("o-1", 15000.0)).await;
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.9,
            json!({"amount": "15000"}),
        )))
        .await;

    let handled = engine(&world).handle(turn(&scope, None)).await.unwrap();
    assert_eq!(handled.reason, ReasonTag::SlipSaved);

    let case = stored_case(&world, &case.id).await;
    assert_eq!(case.slots.get("order_id"), Some(&json!("o-1")));
    assert_eq!(case.slots.get("payment_id"), Some(&json!("pay-1")));
    let kinds: Vec<ActivityType> = world
        .cases
        .all_activities()
        .await
        .into_iter()
        .map(|a| a.activity_type)
        .collect();
    assert!(kinds.contains(&ActivityType::OrderLinked));
    assert!(kinds.contains(&ActivityType::PaymentLinked));
}

#[tokio::test]
async fn unmatched_slip_leaves_the_case_untouched() {
    let world = TestWorld::new();
    let scope = TestWorld::scope();
    let cases = CaseManager::from_collaborators(&world.collaborators(), &world.config);
    let case = cases
        .get_or_create(
            &CaseContext::new(scope.clone(), Platform::Line),
            CaseType::PaymentFull,
            &SlotBag::new(),
        )
        .await
        .unwrap();
    world.obligations.add(order("o-1", 15000.0)).await;
    world
        .vision()
        .push(Ok(MockVision::report(
            ImageKind::PaymentProof,
            0.9,
            json!({"amount": "900"}),
        )))
        .await;

    engine(&world).handle(turn(&scope, None)).await.unwrap();

    let case = stored_case(&world, &case.id).await;
    assert!(case.slots.get("payment_id").is_none());
}
