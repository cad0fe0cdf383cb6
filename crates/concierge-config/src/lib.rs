// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Concierge commerce router.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! a file hierarchy lookup, `CONCIERGE_` environment variable overrides, per-turn
//! bot overrides, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use concierge_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Bot name: {}", config.bot.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str, merge_bot_overrides};
pub use model::{BotConfig, SpamAction};

/// Loads from the standard search locations and validates.
pub fn load_and_validate() -> Result<BotConfig, Vec<ConfigError>> {
    checked(loader::load_config(), collect_toml_sources)
}

/// Loads from an inline TOML document and validates.
pub fn load_and_validate_str(toml_content: &str) -> Result<BotConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Loads from an explicit file (plus env overrides) and validates.
pub fn load_and_validate_path(path: &Path) -> Result<BotConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Validates a loaded config, or turns the load failure into diagnostics.
/// Sources are only read back when there is something to point at.
fn checked(
    loaded: Result<BotConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BotConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::into_diagnostics(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Reads back every config file in the search path that exists.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::search_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let absolute = std::path::absolute(&path).unwrap_or(path);
            Some((absolute.display().to_string(), content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_flows_deserialize_from_toml_tables() {
        let toml_str = r#"
[case_flows.pawn]
trigger_intents = ["pawn_new", "pawn_inquiry"]
required_slots = ["item_photo"]

[case_flows.pawn.conditional_slots]
redeem = ["pawn_no"]
"#;
        let config: BotConfig = toml::from_str(toml_str).unwrap();
        let pawn = &config.case_flows["pawn"];
        assert_eq!(pawn.trigger_intents, vec!["pawn_new", "pawn_inquiry"]);
        assert_eq!(pawn.conditional_slots["redeem"], vec!["pawn_no"]);
    }

    #[test]
    fn case_flows_deny_unknown_fields() {
        let toml_str = r#"
[case_flows.repair]
trigger_intent = ["repair_new"]
"#;
        assert!(toml::from_str::<BotConfig>(toml_str).is_err());
    }
}
