// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge serve` implementation.
//!
//! Opens the database, builds the collaborators, then serves webhook turns
//! until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use concierge_agent::TurnProcessor;
use concierge_backend::BackendClient;
use concierge_config::BotConfig;
use concierge_core::traits::IntentClassifier;
use concierge_core::{ChatMessage, Clock, Collaborators, ConciergeError, IntentResult, SystemClock};
use concierge_storage::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::http::{self, AppState};

/// How often expired quick-state cells are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Runs the webhook server.
pub async fn run_serve(config: BotConfig) -> Result<(), ConciergeError> {
    init_tracing(&config.bot.log_level);

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    info!(path = %config.storage.database_path, "database opened");

    let collaborators = match build_collaborators(&config, store.clone()) {
        Ok(c) => c,
        Err(e) => {
            let _ = store.close().await;
            return Err(e);
        }
    };
    let processor = Arc::new(TurnProcessor::new(collaborators, Arc::new(config.clone())));

    let cancel = install_signal_handler();
    spawn_purge_task(store.clone(), cancel.clone());

    let state = AppState {
        processor,
        store: Some(store.clone()),
        start_time: Instant::now(),
    };
    let app = http::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConciergeError::Transport {
            message: format!("failed to bind {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!(bot = %config.bot.name, "listening on {addr}");

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ConciergeError::Transport {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        });

    cancel.cancel();
    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close database cleanly");
    }
    info!("concierge stopped");
    served
}

/// Wires storage, the commerce backend and the model into one bundle.
fn build_collaborators(
    config: &BotConfig,
    store: Arc<SqliteStore>,
) -> Result<Collaborators, ConciergeError> {
    let backend = BackendClient::from_config(&config.backend)?.ok_or_else(|| {
        ConciergeError::Config("backend.base_url is required to serve turns".into())
    })?;
    let backend = Arc::new(backend);
    info!(base_url = backend.base_url(), "commerce backend configured");

    let (classifier, vision, text) = match concierge_llm::from_config(&config.llm)? {
        Some(models) => (models.classifier, Some(models.vision), Some(models.text)),
        None => {
            warn!("llm disabled; intent classification will answer with the fallback template");
            (
                Arc::new(UnconfiguredClassifier) as Arc<dyn IntentClassifier>,
                None,
                None,
            )
        }
    };

    Ok(Collaborators {
        sessions: store.clone(),
        cases: store.clone(),
        quick_state: store,
        classifier,
        knowledge: backend.clone(),
        catalog: backend.clone(),
        checkout: backend.clone(),
        desk: backend.clone(),
        obligations: backend.clone(),
        payments: backend,
        vision,
        text,
        clock: Arc::new(SystemClock),
    })
}

/// Classifier used when no model is configured. Every call fails, so the
/// router answers with the fallback template instead of guessing an intent.
struct UnconfiguredClassifier;

#[async_trait]
impl IntentClassifier for UnconfiguredClassifier {
    async fn classify(
        &self,
        _text: &str,
        _history: &[ChatMessage],
    ) -> Result<IntentResult, ConciergeError> {
        Err(ConciergeError::collaborator(
            "classifier",
            "no intent model configured",
        ))
    }
}

/// Periodically deletes expired quick-state cells until cancelled.
fn spawn_purge_task(store: Arc<SqliteStore>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let clock = SystemClock;
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match store.purge_expired(clock.now()).await {
                        Ok(0) => debug!("no expired state to purge"),
                        Ok(purged) => info!(purged, "expired state purged"),
                        Err(e) => warn!(error = %e, "state purge failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("purge task shutting down");
                    break;
                }
            }
        }
    });
}

/// Installs handlers for SIGINT and SIGTERM.
///
/// Returns a [`CancellationToken`] cancelled when either signal arrives.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler; only Ctrl+C stops the server");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("concierge={log_level},concierge_agent={log_level},warn"))
    });

    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_config::model::StorageConfig;

    async fn temp_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
        let config = StorageConfig {
            database_path: dir.path().join("serve.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        Arc::new(SqliteStore::open(&config).await.unwrap())
    }

    #[tokio::test]
    async fn serving_requires_a_backend() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_collaborators(&BotConfig::default(), temp_store(&dir).await).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(ref m) if m.contains("backend.base_url")));
    }

    #[tokio::test]
    async fn disabled_model_leaves_vision_and_text_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BotConfig::default();
        config.llm.enabled = false;
        config.backend.base_url = Some("http://127.0.0.1:9".into());

        let collaborators = build_collaborators(&config, temp_store(&dir).await).unwrap();

        assert!(collaborators.vision.is_none());
        assert!(collaborators.text.is_none());
        let err = collaborators.classifier.classify("สวัสดี", &[]).await.unwrap_err();
        assert!(matches!(err, ConciergeError::Collaborator { name: "classifier", .. }));
    }
}
