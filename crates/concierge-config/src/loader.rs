// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports `./concierge.toml` > `~/.config/concierge/concierge.toml` > `/etc/concierge/concierge.toml`
//! with environment variable overrides via the `CONCIERGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BotConfig;

/// Top-level sections, longest first so `case_flows_x` never matches `case_`.
const SECTIONS: &[&str] = &[
    "case_management",
    "reconciliation",
    "slot_questions",
    "echo_filter",
    "case_flows",
    "gatekeeper",
    "anti_spam",
    "templates",
    "features",
    "backend",
    "handoff",
    "storage",
    "server",
    "store",
    "bot",
    "llm",
];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/concierge/concierge.toml`
/// 3. `~/.config/concierge/concierge.toml`
/// 4. `./concierge.toml`
/// 5. `CONCIERGE_*` environment variables
pub fn load_config() -> Result<BotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config file locations in merge order, lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/concierge/concierge.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("concierge").join("concierge.toml"));
    }
    paths.push(PathBuf::from("concierge.toml"));
    paths
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(BotConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Merge per-bot JSON carried on a turn over the process configuration.
///
/// Only known top-level sections are taken from `overrides`; anything else a
/// gateway attaches to the bot record is ignored. Unknown keys inside a known
/// section are still rejected.
pub fn merge_bot_overrides(
    base: &BotConfig,
    overrides: &serde_json::Value,
) -> Result<BotConfig, figment::Error> {
    let Some(map) = overrides.as_object() else {
        return Ok(base.clone());
    };
    let known: serde_json::Map<String, serde_json::Value> = map
        .iter()
        .filter(|(key, value)| SECTIONS.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if known.is_empty() {
        return Ok(base.clone());
    }
    Figment::new()
        .merge(Serialized::defaults(base))
        .merge(Serialized::defaults(serde_json::Value::Object(known)))
        .extract()
}

/// Maps `CONCIERGE_GATEKEEPER_SKIP_THRESHOLD` to `gatekeeper.skip_threshold`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: section and key names
/// both contain underscores.
fn env_provider() -> Env {
    Env::prefixed("CONCIERGE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("gatekeeper_skip_threshold"), "gatekeeper.skip_threshold");
        assert_eq!(map_env_key("anti_spam_enabled"), "anti_spam.enabled");
        assert_eq!(map_env_key("store_name"), "store.name");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("llm_api_key"), "llm.api_key");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn bot_overrides_merge_over_base() {
        let base = BotConfig::default();
        let overrides = serde_json::json!({
            "gatekeeper": {"skip_threshold": 0.5, "brand_keywords": ["tudor"]},
            "persona": {"tone": "friendly"}
        });
        let merged = merge_bot_overrides(&base, &overrides).unwrap();
        assert_eq!(merged.gatekeeper.skip_threshold, 0.5);
        assert_eq!(merged.gatekeeper.brand_keywords, vec!["tudor".to_string()]);
        assert_eq!(merged.gatekeeper.reply_window_seconds, 15);
        assert_eq!(merged.anti_spam, base.anti_spam);
    }

    #[test]
    fn non_object_overrides_are_ignored() {
        let base = BotConfig::default();
        let merged = merge_bot_overrides(&base, &serde_json::json!("nope")).unwrap();
        assert_eq!(merged, base);
    }
}
