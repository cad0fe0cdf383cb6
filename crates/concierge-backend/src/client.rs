// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-over-HTTP client for the commerce backend.
//!
//! Every operation is a `POST {base_url}/{operation}` with a JSON body and a
//! JSON response. Transport errors, timeouts, 429 and 5xx are retried with
//! linear backoff; other statuses fail immediately.

use std::time::Duration;

use concierge_config::model::BackendConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::CallPolicy;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Error body the backend may send with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the commerce backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    policy: CallPolicy,
}

impl BackendClient {
    /// Builds a client from the `backend` section, or `None` when no base URL is set.
    pub fn from_config(config: &BackendConfig) -> Result<Option<Self>, ConciergeError> {
        let Some(base_url) = config.base_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let policy = CallPolicy {
            timeout: Duration::from_secs(config.timeout_seconds),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        };
        Self::new(base_url, config.api_key.as_deref(), policy).map(Some)
    }

    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        policy: CallPolicy,
    ) -> Result<Self, ConciergeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ConciergeError::Config(format!("invalid backend API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConciergeError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Calls `operation` and decodes the response body.
    pub async fn call<R: DeserializeOwned>(
        &self,
        operation: &str,
        args: &serde_json::Value,
    ) -> Result<R, ConciergeError> {
        let body = self.call_raw(operation, args).await?;
        serde_json::from_str(&body).map_err(|e| ConciergeError::Parse {
            message: format!("{operation}: unexpected response: {e}"),
        })
    }

    /// Calls `operation` for its effect only.
    pub async fn call_unit(
        &self,
        operation: &str,
        args: &serde_json::Value,
    ) -> Result<(), ConciergeError> {
        self.call_raw(operation, args).await.map(|_| ())
    }

    async fn call_raw(
        &self,
        operation: &str,
        args: &serde_json::Value,
    ) -> Result<String, ConciergeError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.policy.backoff * attempt;
                warn!(operation, attempt, delay_ms = delay.as_millis() as u64, "retrying backend call");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(operation, args).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    warn!(operation, error = %e, attempt, "transient backend failure");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        operation: &str,
        args: &serde_json::Value,
    ) -> Result<String, ConciergeError> {
        let url = format!("{}/{operation}", self.base_url);
        let timeout = self.policy.timeout;
        let call = async {
            let response = self
                .http
                .post(&url)
                .json(args)
                .send()
                .await
                .map_err(|e| ConciergeError::Transport {
                    message: format!("{operation}: request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(operation, status = %status, "backend response received");
            let body = response.text().await.map_err(|e| ConciergeError::Transport {
                message: format!("{operation}: failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;

            if status.is_success() {
                Ok(body)
            } else {
                Err(status_error(operation, status, &body))
            }
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ConciergeError::Timeout { duration: timeout })?
    }
}

fn status_error(operation: &str, status: reqwest::StatusCode, body: &str) -> ConciergeError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.chars().take(200).collect(),
    };
    if status.as_u16() == 429 || status.is_server_error() {
        ConciergeError::Transport {
            message: format!("{operation}: http_{}: {message}", status.as_u16()),
            source: None,
        }
    } else {
        ConciergeError::Rejected {
            status: status.as_u16(),
            message: format!("{operation}: {message}"),
        }
    }
}
