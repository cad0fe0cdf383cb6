// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case lifecycle and Quick State running against a real SQLite file.

use std::sync::Arc;
use std::time::Duration;

use concierge_cases::{CaseContext, CaseManager};
use concierge_config::BotConfig;
use concierge_config::model::StorageConfig;
use concierge_core::traits::SessionStore;
use concierge_core::{
    ActivityType, CaseStatus, CaseType, Clock, PendingIntent, Platform, QuickState, Scope,
    StateKey,
};
use concierge_storage::SqliteStore;
use concierge_test_utils::{ManualClock, product};

async fn open_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
    let config = StorageConfig {
        database_path: dir.path().join("concierge.db").to_string_lossy().into_owned(),
        wal_mode: true,
    };
    Arc::new(SqliteStore::open(&config).await.unwrap())
}

#[tokio::test]
async fn product_tracking_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new());
    let scope = Scope::new("line-main", "U42");

    let case_id = {
        let store = open_store(&dir).await;
        let session = store
            .get_or_create(&scope, Platform::Line, clock.now())
            .await
            .unwrap();
        let manager = CaseManager::new(store.clone(), store.clone(), clock.clone(), &BotConfig::default());
        let ctx = CaseContext::new(scope.clone(), Platform::Line).with_session(&session.id);

        manager
            .track_product(&ctx, &product("RLX-0012", "Rolex Submariner", 450_000.0))
            .await
            .unwrap();
        clock.advance_secs(30);
        let case = manager
            .track_product(&ctx, &product("HRM-0003", "Hermes Birkin 30", 890_000.0))
            .await
            .unwrap();
        manager.trigger_handoff(&case.id, "customer_request").await.unwrap();
        store.close().await.unwrap();
        case.id
    };

    let store = open_store(&dir).await;
    let manager = CaseManager::new(store.clone(), store.clone(), clock.clone(), &BotConfig::default());

    let history = manager.products_history(&case_id).await.unwrap();
    let names: Vec<_> = history.iter().filter_map(|h| h.product_name.clone()).collect();
    assert_eq!(names, vec!["Rolex Submariner", "Hermes Birkin 30"]);

    let open = manager
        .open_case(&scope, CaseType::ProductInquiry)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.id, case_id);
    assert_eq!(open.status, CaseStatus::PendingAdmin);

    let log = manager.activities(&case_id).await.unwrap();
    assert_eq!(log.first().map(|a| a.activity_type), Some(ActivityType::Created));
    assert_eq!(
        log.last().map(|a| a.activity_type),
        Some(ActivityType::HandoffTriggered)
    );

    let session = store.get_or_create(&scope, Platform::Line, clock.now()).await.unwrap();
    assert_eq!(session.active_case_id.as_deref(), Some(case_id.as_str()));
    assert_eq!(session.active_case_type, Some(CaseType::ProductInquiry));
}

#[tokio::test]
async fn quick_state_expires_on_the_injected_clock() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let clock = Arc::new(ManualClock::new());
    let state = QuickState::new(store.clone(), clock.clone(), Scope::new("line-main", "U7"));

    state
        .set(
            StateKey::PendingIntent,
            &PendingIntent::new(PendingIntent::DEPOSIT, clock.now()),
            Duration::from_secs(300),
        )
        .await
        .unwrap();

    clock.advance_secs(299);
    let pending: Option<PendingIntent> = state.get(StateKey::PendingIntent).await.unwrap();
    assert!(pending.is_some_and(|p| p.is(PendingIntent::DEPOSIT)));

    clock.advance_secs(1);
    let pending: Option<PendingIntent> = state.get(StateKey::PendingIntent).await.unwrap();
    assert!(pending.is_none());
}

#[tokio::test]
async fn purge_clears_only_expired_cells() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let clock = Arc::new(ManualClock::new());
    let state = QuickState::new(store.clone(), clock.clone(), Scope::new("line-main", "U8"));

    state.touch(StateKey::LastBotReplyTime, Duration::from_secs(60)).await.unwrap();
    state.touch(StateKey::LastUserMsg, Duration::from_secs(3600)).await.unwrap();

    clock.advance_secs(120);
    assert_eq!(store.purge_expired(clock.now()).await.unwrap(), 1);
    assert!(state.seconds_since(StateKey::LastUserMsg).await.unwrap().is_some());
}
