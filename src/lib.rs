//! # Feedstash
//!
//! Polls RSS/Atom feeds, stores every item once in SQLite, and keeps a
//! cleaned JSONL snapshot for downstream consumers.
//!
//! ## Architecture
//!
//! ```text
//! Poller → Fetcher → Normalizer → Store → Export
//! ```
//!
//! - [`fetcher`]: HTTP client with a bounded timeout
//! - [`normalizer`]: Namespace-agnostic RSS/Atom parsing and summary cleaning
//! - [`store`]: Append-only SQLite persistence, deduplicated on `guid`
//! - [`export`]: JSONL snapshot writer
//! - [`poller`]: The fetch/store/sleep loop
//!
//! ## Quick Start
//!
//! ```bash
//! # Poll the configured feeds every five minutes
//! feedstash poll --interval 5m
//!
//! # Poll a single feed once
//! feedstash poll --url https://blog.rust-lang.org/feed.xml --once
//!
//! # Export items fetched since a given time
//! feedstash export --out data/recent.jsonl --since 2025-10-25T00:00:00Z --limit 100
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher and normalizer.
pub mod app;

/// Command-line interface using clap.
///
/// - `poll` - Poll feeds into the database
/// - `export` - Write stored items to JSONL
/// - `config` - Show or create the config file
pub mod cli;

/// TOML configuration file.
pub mod config;

/// Core domain models.
///
/// - [`RawEntry`](domain::RawEntry): An entry as parsed from a feed
/// - [`Item`](domain::Item): A stored item
/// - [`SnapshotRecord`](domain::SnapshotRecord): One exported JSONL line
pub mod domain;

/// JSONL snapshot export.
pub mod export;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing and summary cleaning.
///
/// Converts RSS 0.9x/1.0/2.0 and Atom documents into
/// [`RawEntry`](domain::RawEntry) records.
pub mod normalizer;

/// Polling loop with cooperative cancellation.
pub mod poller;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
