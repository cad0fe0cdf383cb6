// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted intent classifier, vision classifier, and text generator.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use concierge_core::traits::{
    ImageKind, IntentClassifier, TextGenerator, TextRequest, VisionClassifier, VisionReport,
};
use concierge_core::{ChatMessage, ConciergeError, Intent, IntentResult};

/// Classifier that maps texts to results.
///
/// Exact matches win over substring rules. Anything unmatched classifies as
/// `unknown` with low confidence.
#[derive(Debug, Default)]
pub struct MockClassifier {
    exact: Vec<(String, IntentResult)>,
    contains: Vec<(String, IntentResult)>,
    seen: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, text: &str, result: IntentResult) -> Self {
        self.exact.push((text.to_string(), result));
        self
    }

    pub fn on_contains(mut self, fragment: &str, result: IntentResult) -> Self {
        self.contains.push((fragment.to_string(), result));
        self
    }

    /// Texts the classifier was asked about, in order.
    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl IntentClassifier for MockClassifier {
    async fn classify(
        &self,
        text: &str,
        _history: &[ChatMessage],
    ) -> Result<IntentResult, ConciergeError> {
        self.seen.lock().await.push(text.to_string());
        let found = self
            .exact
            .iter()
            .find(|(t, _)| t == text)
            .or_else(|| self.contains.iter().find(|(f, _)| text.contains(f.as_str())))
            .map(|(_, result)| result.clone());
        Ok(found.unwrap_or_else(|| IntentResult::new(Intent::Unknown, 0.2)))
    }
}

/// Vision classifier returning queued results, then a low-confidence generic report.
#[derive(Debug, Default)]
pub struct MockVision {
    queue: Mutex<VecDeque<Result<VisionReport, ConciergeError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, result: Result<VisionReport, ConciergeError>) {
        self.queue.lock().await.push_back(result);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Report with the given kind, confidence, and `details` JSON object.
    pub fn report(kind: ImageKind, confidence: f64, details: serde_json::Value) -> VisionReport {
        VisionReport {
            image_type: kind,
            confidence,
            details: details.as_object().cloned().unwrap_or_default(),
            description: None,
        }
    }
}

#[async_trait]
impl VisionClassifier for MockVision {
    async fn analyze(&self, image_url: &str) -> Result<VisionReport, ConciergeError> {
        self.calls.lock().await.push(image_url.to_string());
        self.queue.lock().await.pop_front().unwrap_or_else(|| {
            Ok(Self::report(
                ImageKind::Generic,
                0.1,
                serde_json::Value::Null,
            ))
        })
    }
}

/// Text generator returning queued responses, like a canned LLM.
#[derive(Debug, Default)]
pub struct MockText {
    queue: Mutex<VecDeque<Result<String, ConciergeError>>>,
    requests: Mutex<Vec<TextRequest>>,
}

impl MockText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<&str>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, result: Result<String, ConciergeError>) {
        self.queue.lock().await.push_back(result);
    }

    pub async fn requests(&self) -> Vec<TextRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl TextGenerator for MockText {
    async fn complete(&self, request: TextRequest) -> Result<String, ConciergeError> {
        self.requests.lock().await.push(request);
        self.queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ConciergeError::Internal("no scripted response".into())))
    }
}
