// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concierge - conversational commerce router for luxury retail chat channels.
//!
//! This is the binary entry point.

mod check;
mod http;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use concierge_config::BotConfig;

/// Concierge - conversational commerce router.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to the standard search locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Load and validate configuration, then report problems.
    CheckConfig {
        /// File to check instead of `--config`.
        path: Option<PathBuf>,
    },
    /// Score a message with the admission heuristics.
    Classify {
        /// The message text.
        text: String,
    },
}

fn load(path: Option<&PathBuf>) -> Option<BotConfig> {
    let loaded = match path {
        Some(path) => concierge_config::load_and_validate_path(path),
        None => concierge_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            concierge_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => {
            let Some(config) = load(cli.config.as_ref()) else {
                return ExitCode::FAILURE;
            };
            match serve::run_serve(config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Some(Commands::CheckConfig { path }) => {
            let path = path.or(cli.config);
            match load(path.as_ref()) {
                Some(config) => {
                    println!("{}", check::summarize(&config));
                    ExitCode::SUCCESS
                }
                None => ExitCode::FAILURE,
            }
        }
        Some(Commands::Classify { text }) => {
            let Some(config) = load(cli.config.as_ref()) else {
                return ExitCode::FAILURE;
            };
            println!("{}", check::classify(&config, &text));
            ExitCode::SUCCESS
        }
        None => {
            println!("concierge: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["concierge", "--config", "bot.toml", "classify", "สนใจ rolex"]);
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        assert!(matches!(cli.command, Some(Commands::Classify { ref text }) if text == "สนใจ rolex"));

        let cli = Cli::parse_from(["concierge", "check-config", "other.toml"]);
        assert!(matches!(
            cli.command,
            Some(Commands::CheckConfig { path: Some(ref p) }) if p == &PathBuf::from("other.toml")
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = concierge_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8080);
    }
}
