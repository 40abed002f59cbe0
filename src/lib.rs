//! # pagesift
//!
//! Retrieves readable content from arbitrary, possibly bot-protected web
//! pages and normalizes it into a `{title, description, content}` record.
//!
//! ## Architecture
//!
//! Retrieval escalates through three tiers, each tried only when the cheaper
//! one failed or served a protection checkpoint:
//!
//! ```text
//! direct fetch → stealth browser render → plain browser render → extract
//! ```
//!
//! - [`fetcher`]: reqwest client with rotated browser headers
//! - [`scraper`]: checkpoint classifier, headless rendering, adaptive wait,
//!   content extraction and the pipeline tying them together
//! - [`server`]: axum endpoint exposing the pipeline
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape a page
//! pagesift scrape example.com/article
//!
//! # Serve POST /api/scrape on 127.0.0.1:3000
//! pagesift serve
//!
//! # Check a saved page for a bot-protection interstitial
//! pagesift classify page.html
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the configured pipeline
/// and the batch scraper together.
pub mod app;

/// Command-line interface using clap.
///
/// - `serve [--host] [--port]` - Run the HTTP endpoint
/// - `scrape <url>... [--json]` - Scrape URLs concurrently
/// - `classify <file>` - Classify a saved HTML page
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/pagesift/config.toml`, or the `--config` path.
pub mod config;

/// Core domain models.
///
/// - [`ScrapeRequest`](domain::ScrapeRequest): raw request, URL normalization
/// - [`ScrapedData`](domain::ScrapedData): normalized output
/// - [`Tier`](domain::Tier): which retrieval strategy produced the HTML
pub mod domain;

/// Direct HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for the direct tier
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`IdentityRotator`](fetcher::IdentityRotator): randomized browser headers
pub mod fetcher;

/// Retrieval pipeline and content extraction.
///
/// Uses headless Chrome via chromiumoxide when a direct fetch is blocked.
///
/// - [`ScrapePipeline`](scraper::ScrapePipeline): the escalation ladder
/// - [`CheckpointClassifier`](scraper::CheckpointClassifier): interstitial detection
/// - [`ContentExtractor`](scraper::ContentExtractor): readability with selector fallback
pub mod scraper;

/// HTTP server exposing `POST /api/scrape`.
pub mod server;
