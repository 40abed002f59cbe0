//! Retrieval and extraction of readable page content.
//!
//! # Architecture
//!
//! ```text
//! URL → direct fetch ──(error / non-2xx / checkpoint)──→ stealth render
//!          │                                                  │ (error)
//!          │                                                  ▼
//!          │                                             plain render ──(error)──→ Blocked
//!          ▼                                                  │
//!       extract ←─────────────────────────────────────────────┘
//! ```
//!
//! Rendering goes through the [`browser`] traits, so tests swap chromiumoxide
//! for a stub launcher.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pagesift::scraper::{ChromeLauncher, ScrapePipeline, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let pipeline = ScrapePipeline::from_config(&config, Arc::new(ChromeLauncher::new()))?;
//!
//! let outcome = pipeline.scrape("example.com/article").await?;
//! println!("{} ({})", outcome.data.title, outcome.method);
//! ```

pub mod batch;
pub mod browser;
pub mod checkpoint;
mod chrome;
mod config;
pub mod extractor;
pub mod pipeline;
pub mod render;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{ParallelScraper, DEFAULT_WORKERS};
pub use checkpoint::{CheckpointClassifier, CheckpointKind, CheckpointRule, CheckpointVerdict};
pub use chrome::ChromeLauncher;
pub use config::{ScraperConfig, WaitConfig};
pub use extractor::{ContentExtractor, Extraction, ExtractionResult};
pub use pipeline::{PipelineError, ScrapeOutcome, ScrapePipeline};
pub use render::{BrowserRenderer, RenderVariant};
pub use wait::{AdaptiveWait, WaitOutcome};

use crate::app::Result;
use crate::domain::Tier;
use async_trait::async_trait;

/// A browser-backed retrieval tier
#[async_trait]
pub trait Renderer: Send + Sync {
    fn tier(&self) -> Tier;

    /// Load `url` and return the settled HTML
    async fn render(&self, url: &str) -> Result<String>;
}
