// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as threshold ranges, case-flow vocabularies, and echo-filter patterns.

use std::collections::HashMap;
use std::str::FromStr;

use concierge_core::{CaseType, Intent};

use crate::diagnostic::ConfigError;
use crate::model::BotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let unit_ranges = [
        ("gatekeeper.skip_threshold", config.gatekeeper.skip_threshold),
        (
            "reconciliation.payment_confidence",
            config.reconciliation.payment_confidence,
        ),
        (
            "reconciliation.product_confidence",
            config.reconciliation.product_confidence,
        ),
        (
            "reconciliation.context_confidence",
            config.reconciliation.context_confidence,
        ),
    ];
    for (key, value) in unit_ranges {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be between 0.0 and 1.0, got {value}"),
            });
        }
    }

    if config.reconciliation.context_confidence > config.reconciliation.payment_confidence {
        errors.push(ConfigError::Validation {
            message: "reconciliation.context_confidence must not exceed reconciliation.payment_confidence"
                .to_string(),
        });
    }

    let tolerances = [
        ("reconciliation.order_tolerance", config.reconciliation.order_tolerance),
        (
            "reconciliation.pawn_interest_tolerance",
            config.reconciliation.pawn_interest_tolerance,
        ),
        (
            "reconciliation.pawn_redemption_tolerance",
            config.reconciliation.pawn_redemption_tolerance,
        ),
        (
            "reconciliation.pawn_loan_tolerance",
            config.reconciliation.pawn_loan_tolerance,
        ),
        (
            "reconciliation.installment_tolerance",
            config.reconciliation.installment_tolerance,
        ),
    ];
    for (key, value) in tolerances {
        if value < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be non-negative, got {value}"),
            });
        }
    }

    if config.anti_spam.repeat_threshold == 0 {
        errors.push(ConfigError::Validation {
            message: "anti_spam.repeat_threshold must be at least 1".to_string(),
        });
    }

    if config.gatekeeper.buffer_max_fragments == 0 {
        errors.push(ConfigError::Validation {
            message: "gatekeeper.buffer_max_fragments must be at least 1".to_string(),
        });
    }

    // Each intent may open at most one case type.
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (case_type, flow) in &config.case_flows {
        if CaseType::from_str(case_type).is_err() {
            errors.push(ConfigError::Validation {
                message: format!("case_flows.{case_type} is not a known case type"),
            });
        }
        for intent in &flow.trigger_intents {
            if Intent::from_str(intent).is_err() {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "case_flows.{case_type}.trigger_intents contains unknown intent `{intent}`"
                    ),
                });
            }
            if let Some(previous) = owners.insert(intent.as_str(), case_type.as_str())
                && previous != case_type.as_str()
            {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "intent `{intent}` triggers both case_flows.{previous} and case_flows.{case_type}"
                    ),
                });
            }
        }
    }

    for (i, pattern) in config.echo_filter.patterns.iter().enumerate() {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ConfigError::Validation {
                message: format!("echo_filter.patterns[{i}] is not a valid regex: {e}"),
            });
        }
    }

    if config.llm.enabled {
        let endpoint = config.llm.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("llm.endpoint `{endpoint}` must be an http(s) URL"),
            });
        }
        if config.llm.model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "llm.model must not be empty when llm.enabled is true".to_string(),
            });
        }
    }

    if let Some(base_url) = config.backend.base_url.as_deref().map(str::trim)
        && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        errors.push(ConfigError::Validation {
            message: format!("backend.base_url `{base_url}` must be an http(s) URL"),
        });
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
