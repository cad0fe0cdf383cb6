// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Concierge commerce router.

use thiserror::Error;

/// The primary error type used across collaborator traits and turn processing.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Configuration errors (invalid bot config JSON, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A collaborator (catalog, checkout, payment service, ...) reported a failure.
    #[error("{name} failed: {message}")]
    Collaborator {
        name: &'static str,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure talking to a remote service (connection reset,
    /// 5xx, 429). Eligible for bounded retry.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote service answered with a non-retryable HTTP status (4xx other than 429).
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Malformed payload from a collaborator that could not be recovered.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Returns true for failures worth retrying under the bounded retry policy:
    /// transport errors and timeouts. Rejections and parse failures are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// Shorthand for a collaborator failure without an underlying source.
    pub fn collaborator(name: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            name,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}

impl From<serde_json::Error> for ConciergeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_transport_and_timeout() {
        let transport = ConciergeError::Transport {
            message: "503".into(),
            source: None,
        };
        let timeout = ConciergeError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        assert!(transport.is_retryable());
        assert!(timeout.is_retryable());

        assert!(!ConciergeError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ConciergeError::Parse {
            message: "eof".into()
        }
        .is_retryable());
        assert!(!ConciergeError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn collaborator_error_display_names_the_service() {
        let err = ConciergeError::collaborator("checkout", "state corrupted");
        assert_eq!(err.to_string(), "checkout failed: state corrupted");
    }

    #[test]
    fn serde_json_errors_become_parse_errors() {
        let err: ConciergeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConciergeError::Parse { .. }));
    }
}
