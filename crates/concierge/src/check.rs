// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge check-config` and `concierge classify`.

use concierge_config::BotConfig;
use concierge_gate::{InfoScorer, is_gibberish};

/// One-paragraph summary of a valid configuration.
pub fn summarize(config: &BotConfig) -> String {
    let backend = config.backend.base_url.as_deref().unwrap_or("(not set)");
    let llm = if config.llm.enabled {
        config.llm.model.as_str()
    } else {
        "disabled"
    };
    format!(
        "config ok: bot={} llm={} backend={} database={} listen={}:{}",
        config.bot.name,
        llm,
        backend,
        config.storage.database_path,
        config.server.host,
        config.server.port
    )
}

/// Runs the stateless admission heuristics on `text`.
pub fn classify(config: &BotConfig, text: &str) -> String {
    let scorer = InfoScorer::new(&config.gatekeeper);
    let gibberish = is_gibberish(text);
    let score = scorer.score(text);
    let verdict = if gibberish {
        "drop"
    } else if score < config.gatekeeper.skip_threshold {
        "low_info"
    } else {
        "process"
    };
    format!("gibberish={gibberish} info_score={score:.2} threshold={:.2} verdict={verdict}",
        config.gatekeeper.skip_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_digits_are_dropped() {
        let out = classify(&BotConfig::default(), "55555555");
        assert!(out.starts_with("gibberish=true"), "{out}");
        assert!(out.ends_with("verdict=drop"), "{out}");
    }

    #[test]
    fn product_question_is_processed() {
        let out = classify(&BotConfig::default(), "มี Rolex Submariner สีเขียวไหมคะ");
        assert!(out.starts_with("gibberish=false"), "{out}");
        assert!(out.ends_with("verdict=process"), "{out}");
    }

    #[test]
    fn summary_names_the_backend() {
        let mut config = BotConfig::default();
        config.backend.base_url = Some("http://shop.internal".into());
        assert!(summarize(&config).contains("backend=http://shop.internal"));
    }
}
