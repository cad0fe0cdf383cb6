// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Concierge.
//!
//! WAL-mode SQLite with embedded migrations. All queries run on the single
//! `tokio-rusqlite` background thread, so writes are serialized without
//! extra locking. [`SqliteStore`] implements the session, case and Quick
//! State store traits.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
