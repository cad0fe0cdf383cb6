// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use concierge_backend::BackendClient;
use concierge_config::model::BackendConfig;
use concierge_core::traits::{
    CheckoutFlow, KnowledgeBase, ObligationKind, ObligationService, PaymentLink, PaymentRecorder,
    PaymentType, ProductCatalog, SlipEvidence, SlipRecord,
};
use concierge_core::{ReplyAction, Scope};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> BackendClient {
    let config = BackendConfig {
        base_url: Some(server.uri()),
        retry_backoff_ms: 10,
        ..BackendConfig::default()
    };
    BackendClient::from_config(&config).unwrap().unwrap()
}

fn scope() -> Scope {
    Scope::new("line-oa", "U123")
}

#[tokio::test]
async fn catalog_search_sends_query_and_reads_products() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/search"))
        .and(body_partial_json(json!({"query": "rolex", "limit": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"code": "RLX-0012", "name": "Rolex Submariner", "price": 450000.0}]
        })))
        .mount(&server)
        .await;

    let result = ProductCatalog::search(&backend(&server), "rolex", 5)
        .await
        .unwrap();

    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].code.as_deref(), Some("RLX-0012"));
}

#[tokio::test]
async fn unknown_code_reads_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catalog/by_code"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let product = backend(&server).by_code("XX-9999").await.unwrap();
    assert!(product.is_none());
}

#[tokio::test]
async fn scope_is_sent_as_channel_and_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/handle"))
        .and(body_partial_json(json!({
            "scope": {"channel": "line-oa", "user": "U123"},
            "text": "0812345678"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "รบกวนขอที่อยู่จัดส่งค่ะ",
            "actions": [{"type": "quick_reply", "items": [{"label": "ยกเลิก", "text": "ยกเลิก"}]}]
        })))
        .mount(&server)
        .await;

    let answer = backend(&server)
        .handle(&scope(), "0812345678")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(answer.text.as_deref(), Some("รบกวนขอที่อยู่จัดส่งค่ะ"));
    assert!(answer.messages.is_empty());
    assert!(matches!(&answer.actions[0], ReplyAction::QuickReply { items } if items.len() == 1));
}

#[tokio::test]
async fn confirmation_carries_the_order_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/confirm"))
        .and(body_partial_json(json!({"payment_type": "installment"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": {"text": "สร้างคำสั่งซื้อแล้วค่ะ"},
            "order_no": "ORD-2026-0042"
        })))
        .mount(&server)
        .await;

    let confirmation = backend(&server)
        .confirm(&scope(), PaymentType::Installment)
        .await
        .unwrap();

    assert_eq!(confirmation.order_no.as_deref(), Some("ORD-2026-0042"));
}

#[tokio::test]
async fn pending_obligations_decode_both_amount_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/obligations/find_pending"))
        .and(body_partial_json(json!({"kind": "pawn"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "p-1",
                "reference": "PWN-0007",
                "kind": "pawn",
                "expected": {"kind": "pawn", "interest": 1500.0, "full_redemption": 51500.0, "loan": 50000.0},
                "recency": "2026-03-01T09:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let pending = backend(&server)
        .find_pending(ObligationKind::Pawn, &scope())
        .await
        .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].reference, "PWN-0007");
}

#[tokio::test]
async fn link_payment_posts_the_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/obligations/link_payment"))
        .and(body_partial_json(json!({"obligation_id": "o-1", "subtype": "full"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .link_payment(&PaymentLink {
            kind: ObligationKind::Order,
            obligation_id: "o-1".into(),
            payment_id: "pay-1".into(),
            subtype: "full".into(),
            amount: Some(15000.0),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_slip_is_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments/record_slip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "duplicate",
            "existing_payment_no": "PAY-0001"
        })))
        .mount(&server)
        .await;

    let record = backend(&server)
        .record_slip(
            &scope(),
            &SlipEvidence {
                amount: Some(15000.0),
                reference: Some("TX-991".into()),
                confidence: 0.9,
                ..SlipEvidence::default()
            },
            Some("https://cdn.example/slip.jpg"),
        )
        .await
        .unwrap();

    assert_eq!(
        record,
        SlipRecord::Duplicate {
            existing_payment_no: "PAY-0001".into()
        }
    );
}

#[tokio::test]
async fn blank_policy_answer_reads_as_none_and_hits_are_ranked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/knowledge/policy_answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "  "})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/knowledge/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"answer": "ส่งฟรีทั่วประเทศค่ะ", "score": 0.4},
            {"answer": "จัดส่งภายใน 2 วันค่ะ", "score": 0.8}
        ])))
        .mount(&server)
        .await;

    let kb = backend(&server);
    assert_eq!(kb.policy_answer("ส่งกี่วัน").await.unwrap(), None);
    let hits = KnowledgeBase::search(&kb, "ส่งกี่วัน").await.unwrap();
    assert_eq!(hits[0].answer, "จัดส่งภายใน 2 วันค่ะ");
}
