// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a Gemini-style `generateContent` API.
//!
//! Provides [`GenerativeClient`] which handles request construction, API key
//! authentication, per-call timeouts and bounded retry of transient failures
//! with linear backoff.

use std::time::Duration;

use concierge_config::model::LlmConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::CallPolicy;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// HTTP client for model calls.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GenerativeClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    default_policy: CallPolicy,
}

impl GenerativeClient {
    /// Builds a client from the `llm` configuration section.
    ///
    /// Fails when no API key is configured or it is not a valid header value.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConciergeError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConciergeError::Config("llm.api_key is not set".into()))?;
        let policy = CallPolicy {
            timeout: Duration::from_secs(config.timeout_seconds),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        };
        Self::new(api_key, &config.endpoint, &config.model, policy)
    }

    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: &str,
        default_policy: CallPolicy,
    ) -> Result<Self, ConciergeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| ConciergeError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConciergeError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            default_policy,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Sends a request and returns the first candidate's text.
    ///
    /// Transport errors, timeouts, 429 and 5xx are retried up to
    /// `policy.max_retries` times, waiting `backoff * attempt` before each
    /// retry. Other statuses and unreadable bodies fail immediately.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        policy: Option<CallPolicy>,
    ) -> Result<String, ConciergeError> {
        let policy = policy.unwrap_or(self.default_policy);
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = policy.backoff * attempt;
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying model call");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(request, policy.timeout).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    warn!(error = %e, attempt, "transient model failure");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<String, ConciergeError> {
        let call = async {
            let response = self
                .http
                .post(self.url())
                .json(request)
                .send()
                .await
                .map_err(|e| ConciergeError::Transport {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, model = %self.model, "model response received");
            let body = response.text().await.map_err(|e| ConciergeError::Transport {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;

            if !status.is_success() {
                return Err(status_error(status, &body));
            }

            let parsed: GenerateResponse =
                serde_json::from_str(&body).map_err(|e| ConciergeError::Parse {
                    message: format!("failed to parse model response: {e}"),
                })?;
            parsed.text().ok_or_else(|| ConciergeError::Parse {
                message: "model response had no text".into(),
            })
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ConciergeError::Timeout { duration: timeout })?
    }

    /// Downloads an image for inline submission. Returns `(mime_type, bytes)`.
    pub async fn fetch_image(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<(String, Vec<u8>), ConciergeError> {
        let download = async {
            // A plain client: the image host must not receive the API key.
            let response = reqwest::Client::new()
                .get(url)
                .send()
                .await
                .map_err(|e| ConciergeError::collaborator("image_download", format!("download_failed: {e}")))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ConciergeError::collaborator(
                    "image_download",
                    format!("download_failed: status {status}"),
                ));
            }
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
                .filter(|v| v.starts_with("image/"))
                .unwrap_or_else(|| "image/jpeg".to_string());
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ConciergeError::collaborator("image_download", format!("download_failed: {e}")))?;
            Ok((mime, bytes.to_vec()))
        };

        tokio::time::timeout(timeout, download)
            .await
            .map_err(|_| ConciergeError::Timeout { duration: timeout })?
    }

    #[cfg(test)]
    pub(crate) fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

/// Maps a non-2xx status to a retryable transport error or a final rejection.
fn status_error(status: reqwest::StatusCode, body: &str) -> ConciergeError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!("{} ({})", api.error.message, api.error.status),
        Err(_) => body.chars().take(200).collect(),
    };
    if status.as_u16() == 429 || status.is_server_error() {
        ConciergeError::Transport {
            message: format!("http_{}: {message}", status.as_u16()),
            source: None,
        }
    } else {
        ConciergeError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, GenerationConfig, Part};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATH: &str = "/models/test-model:generateContent";

    fn policy(max_retries: u32) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(5),
            max_retries,
            backoff: Duration::from_millis(10),
        }
    }

    fn test_client(server: &MockServer, max_retries: u32) -> GenerativeClient {
        GenerativeClient::new("test-key", "http://unused", "test-model", policy(max_retries))
            .unwrap()
            .with_endpoint(&server.uri())
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content::user(vec![Part::text("สวัสดี")])],
            system_instruction: None,
            generation_config: GenerationConfig {
                max_output_tokens: 32,
                temperature: 0.1,
            },
        }
    }

    fn ok_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    }

    #[tokio::test]
    async fn generate_returns_candidate_text_and_sends_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("สวัสดีค่ะ")))
            .mount(&server)
            .await;

        let text = test_client(&server, 0).generate(&request(), None).await.unwrap();
        assert_eq!(text, "สวัสดีค่ะ");
    }

    #[tokio::test]
    async fn generate_retries_on_429_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"status": "RESOURCE_EXHAUSTED", "message": "quota"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("after retry")))
            .mount(&server)
            .await;

        let text = test_client(&server, 2).generate(&request(), None).await.unwrap();
        assert_eq!(text, "after retry");
    }

    #[tokio::test]
    async fn generate_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let err = test_client(&server, 2)
            .generate(&request(), None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("http_503"), "got: {err}");
    }

    #[tokio::test]
    async fn generate_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"status": "INVALID_ARGUMENT", "message": "bad model"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server, 2)
            .generate(&request(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConciergeError::Rejected { status: 400, .. }));
        assert!(err.to_string().contains("INVALID_ARGUMENT"));
    }

    #[tokio::test]
    async fn generate_times_out_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("slow"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let tight = CallPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 1,
            backoff: Duration::from_millis(10),
        };
        let err = test_client(&server, 0)
            .generate(&request(), Some(tight))
            .await
            .unwrap_err();
        assert!(matches!(err, ConciergeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn unreadable_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server, 2)
            .generate(&request(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConciergeError::Parse { .. }));
    }

    #[tokio::test]
    async fn fetch_image_reports_download_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slip.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let (mime, bytes) = client
            .fetch_image(&format!("{}/slip.jpg", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);

        let err = client
            .fetch_image(&format!("{}/missing.jpg", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("download_failed"), "got: {err}");
    }
}
