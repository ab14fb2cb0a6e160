//! # novelrank
//!
//! Aggregated novel rankings from several book sites, cached locally.
//!
//! ## Architecture
//!
//! ```text
//! Providers → Aggregation → Refresh Coordinator → Store → CLI / Daemon
//! ```
//!
//! - [`provider`]: per-site scrapers behind a common async trait
//! - [`aggregate`]: concurrent fan-out, merge, dedup and ranking
//! - [`refresh`]: staleness checks and coalesced refreshes
//! - [`store`]: SQLite-backed key-value persistence
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch the rankings
//! novelrank refresh
//!
//! # Show science fiction only
//! novelrank list --category scifi
//!
//! # Keep the rankings fresh in the background
//! novelrank daemon
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// settings resolver and refresh coordinator.
pub mod app;

/// Provider fan-out and ranking.
///
/// - [`AggregationEngine`](aggregate::AggregationEngine): concurrent fetches bounded by a semaphore
/// - [`rank`](aggregate::rank): stable sort, dedup and truncation
pub mod aggregate;

/// Command-line interface using clap.
///
/// - `refresh [--force]` - Update the rankings
/// - `list [--category C]` - Show the ranked novels
/// - `status` - Cache diagnostics
/// - `settings show|set` - User settings
/// - `daemon` - Periodic refresh in the foreground
pub mod cli;

/// Configuration loaded from `~/.config/novelrank/config.toml`.
pub mod config;

/// Foreground daemon driving periodic freshness checks.
pub mod daemon;

/// Core domain models.
///
/// - [`Item`](domain::Item): a ranked novel
/// - [`Snapshot`](domain::Snapshot): the persisted ranking with its timestamp
/// - [`Settings`](domain::Settings): user preferences
pub mod domain;

/// Book site scrapers.
///
/// - [`Provider`](provider::Provider): async trait for one data source
/// - [`ProviderRegistry`](provider::ProviderRegistry): source ids, categories and lookup keys
/// - [`HttpFetcher`](provider::HttpFetcher): shared reqwest client
pub mod provider;

/// Staleness checks and single-flight refreshes.
pub mod refresh;

/// Settings stored alongside the cached rankings.
pub mod settings;

/// Key-value persistence.
///
/// - [`KeyValueStore`](store::KeyValueStore): async get/set/remove
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
