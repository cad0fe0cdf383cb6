// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Concierge configuration system.

use std::io::Write;

use concierge_config::diagnostic::ConfigError;
use concierge_config::model::{BotConfig, SpamAction};
use concierge_config::{
    load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str,
};

/// Valid TOML with known fields across sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_bot_config() {
    let toml = r#"
[bot]
name = "luxe-bot"
log_level = "debug"

[gatekeeper]
skip_threshold = 0.25
rapid_typing_seconds = 4
brand_keywords = ["tudor", "breguet"]

[anti_spam]
action = "silent"
repeat_threshold = 4

[handoff]
timeout_seconds = 600

[reconciliation]
installment_tolerance = 50.0

[store]
name = "Luxe Secondhand"
phone = "02-000-0000"

[storage]
database_path = "/tmp/concierge-test.db"
wal_mode = false

[server]
host = "0.0.0.0"
port = 9000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "luxe-bot");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.gatekeeper.skip_threshold, 0.25);
    assert_eq!(config.gatekeeper.rapid_typing_seconds, 4);
    assert_eq!(config.gatekeeper.reply_window_seconds, 15);
    assert_eq!(config.gatekeeper.brand_keywords, vec!["tudor", "breguet"]);
    assert_eq!(config.anti_spam.action, SpamAction::Silent);
    assert_eq!(config.anti_spam.repeat_threshold, 4);
    assert_eq!(config.handoff.timeout_seconds, 600);
    assert_eq!(config.reconciliation.installment_tolerance, 50.0);
    assert_eq!(config.reconciliation.order_tolerance, 1.0);
    assert_eq!(config.store.name.as_deref(), Some("Luxe Secondhand"));
    assert_eq!(config.storage.database_path, "/tmp/concierge-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.server.port, 9000);
}

/// Unknown field in [gatekeeper] produces a figment error mentioning the key.
#[test]
fn unknown_field_in_gatekeeper_produces_error() {
    let toml = r#"
[gatekeeper]
skip_treshold = 0.2
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("skip_treshold"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown keys become `UnknownKey` diagnostics with a suggestion.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = "[gatekeeper]\nskip_treshold = 0.2\n";
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "skip_treshold" && s == "skip_threshold"
    )));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.bot.name, "concierge");
    assert_eq!(config.bot.log_level, "info");
    assert!(config.gatekeeper.enabled);
    assert_eq!(config.anti_spam.duplicate_window_seconds, 3);
    assert_eq!(config.anti_spam.repeat_window_seconds, 25);
    assert_eq!(config.handoff.timeout_seconds, 300);
    assert!(!config.llm.enabled);
    assert!(config.case_flows.is_empty());
    assert!(config.slot_questions.contains_key("address"));
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config, BotConfig::default());
}

/// Semantic validation errors surface through the high-level loader.
#[test]
fn validation_errors_surface_from_load_and_validate() {
    let toml = r#"
[reconciliation]
payment_confidence = 0.2
context_confidence = 0.3
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("context_confidence")
    )));
}

/// Wrong value types are reported as invalid types.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(!errors.is_empty());
}

/// A config file on disk loads through the path loader.
#[test]
fn config_file_loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[bot]\nname = \"from-file\"\n").unwrap();

    let config = load_and_validate_path(file.path()).expect("file config should load");
    assert_eq!(config.bot.name, "from-file");
}

/// Environment variables override file values through section mapping.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "concierge.toml",
            r#"
[gatekeeper]
skip_threshold = 0.3

[anti_spam]
repeat_threshold = 3
"#,
        )?;
        jail.set_env("CONCIERGE_GATEKEEPER_SKIP_THRESHOLD", "0.45");
        jail.set_env("CONCIERGE_ANTI_SPAM_REPEAT_THRESHOLD", "5");
        jail.set_env("CONCIERGE_STORE_NAME", "Env Store");

        let config = load_config_from_path(std::path::Path::new("concierge.toml"))?;
        assert_eq!(config.gatekeeper.skip_threshold, 0.45);
        assert_eq!(config.anti_spam.repeat_threshold, 5);
        assert_eq!(config.store.name.as_deref(), Some("Env Store"));
        Ok(())
    });
}
