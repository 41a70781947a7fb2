//! # Montage
//!
//! Assembles pages from fragments fetched concurrently from many backends.
//!
//! ## Architecture
//!
//! ```text
//! Page → Fragment → ContentProvider → Fetcher
//!   ↓
//! Contents + Statistics
//! ```
//!
//! - [`provider`]: leaf providers and the combinators that race, select or merge them
//! - [`fragment`]: positions bound to providers, nested continuations, pages
//! - [`tracer`]: per-execution lifecycle events and the statistics derived from them
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the page plan of the config file
//! montage check
//!
//! # Fetch the page with parameters
//! montage fetch -p id=42
//!
//! # Same, as JSON with statistics
//! montage fetch -p id=42 --json
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Clients and page plans
//! - [`domain`]: Content model
//! - [`fetcher`]: HTTP transport and URL templates
//! - [`fragment`]: Fragments and pages
//! - [`provider`]: Content providers
//! - [`tracer`]: Tracing and statistics

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configured
/// clients, their transports and circuit breakers.
pub mod app;

/// Command-line interface using clap.
///
/// - `fetch [-p key=value]... [--json]` - Fetch the configured page
/// - `check` - Validate the configured page plan
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/montage/config.toml`, supporting:
/// - Named backend clients (timeouts, retries, circuit breaker)
/// - A declarative page plan
pub mod config;

/// Core content model.
///
/// - [`Content`](domain::Content): single, composite, error, missing or static content
/// - [`Contents`](domain::Contents): the result of a page, keyed by position
/// - [`Parameters`](domain::Parameters): immutable fetch input
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for backend requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Fragments and pages.
///
/// A [`Page`](fragment::Page) runs its fragments concurrently, bounded by a
/// worker count, and never fails because a backend did.
pub mod fragment;

/// Content providers and combinators.
pub mod provider;

/// Execution tracing and statistics.
pub mod tracer;
