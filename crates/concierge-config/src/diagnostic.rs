// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Loader failures from figment and semantic validation failures both end up
//! as [`ConfigError`] values. Unknown keys carry a "did you mean" hint picked
//! by Jaro-Winkler similarity, and keys found in a TOML file carry a span so
//! miette can point at the offending line.

#![allow(unused_assignments)] // miette's Diagnostic derive trips this lint

use std::io::IsTerminal;

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a known key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", section_label(.section))]
    #[diagnostic(code(concierge::config::unknown_key), help("{}", unknown_key_help(suggestion.as_deref(), valid_keys)))]
    UnknownKey {
        key: String,
        /// Dotted table path, empty for the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a known key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` should be {expected}, found {found}")]
    #[diagnostic(code(concierge::config::invalid_type))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing key `{key}`")]
    #[diagnostic(code(concierge::config::missing_key), help("set `{key}` in concierge.toml"))]
    MissingKey { key: String },

    #[error("{message}")]
    #[diagnostic(code(concierge::config::validation))]
    Validation { message: String },

    #[error("{0}")]
    #[diagnostic(code(concierge::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top-level table".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let known = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? known keys: {known}"),
        None => format!("known keys: {known}"),
    }
}

/// Converts a figment failure into one diagnostic per underlying error.
///
/// `sources` holds `(path, content)` pairs for the TOML files that fed the
/// figment, used to attach spans.
pub fn into_diagnostics(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            let source = source_of(&error, sources);
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let valid_keys: Vec<String> = expected.iter().map(|k| k.to_string()).collect();
                    let (span, src) = locate(source, &section, key);
                    ConfigError::UnknownKey {
                        suggestion: suggest_key(key, expected),
                        key: key.clone(),
                        section: section.join("."),
                        valid_keys,
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    // For type errors the path ends at the offending key.
                    let (table, key) = match section.split_last() {
                        Some((key, table)) => (table.to_vec(), key.clone()),
                        None => (Vec::new(), String::new()),
                    };
                    let (span, src) = locate(source, &table, &key);
                    ConfigError::InvalidType {
                        key: section.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: if section.is_empty() {
                        key.to_string()
                    } else {
                        format!("{}.{key}", section.join("."))
                    },
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// The TOML file an error came from, when it came from one we read.
fn source_of<'a>(
    error: &figment::Error,
    sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => Some(path.display().to_string()),
        _ => None,
    };
    match origin {
        Some(origin) => sources
            .iter()
            .find(|(path, _)| *path == origin)
            .map(|(path, content)| (path.as_str(), content.as_str())),
        // Inline strings have no file metadata; a single source is unambiguous.
        None if sources.len() == 1 => Some((sources[0].0.as_str(), sources[0].1.as_str())),
        None => None,
    }
}

fn locate(
    source: Option<(&str, &str)>,
    table: &[String],
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((path, content)) = source else {
        return (None, None);
    };
    match find_key_offset(content, table, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` inside the TOML table named by `table`.
///
/// Walks the document line by line, tracking the current `[header]`, and
/// returns the first `key =` assignment under the matching header. An empty
/// `table` means the keys before any header.
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .trim_end()
                .trim_end_matches(']')
                .trim_start_matches('[')
                .trim()
                .to_string();
        } else if current == wanted
            && let Some(rest) = trimmed.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest known key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (strsim::jaro_winkler(unknown, k), *k))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, k)| k.to_string())
}

/// Prints every diagnostic to stderr, colored when stderr is a terminal.
pub fn render_errors(errors: &[ConfigError]) {
    let theme = if std::io::stderr().is_terminal() {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    eprintln!(
        "{} configuration error{}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
}
