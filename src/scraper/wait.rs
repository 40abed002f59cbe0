//! Adaptive wait for rendered pages.
//!
//! Polls the page until either the checkpoint is gone and some text has
//! rendered, or there is so much text that a detected checkpoint must be an
//! overlay. Between polls it sleeps a jittered delay and sometimes scrolls a
//! little. Running out of time is not an error: the caller still takes the
//! last HTML.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::scraper::browser::BrowserPage;
use crate::scraper::checkpoint::{CheckpointClassifier, CheckpointKind};
use crate::scraper::config::WaitConfig;

/// How the wait loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// No checkpoint and enough visible text
    Clean { text_len: usize },
    /// Checkpoint signature present alongside a large amount of text
    Overlay { kind: CheckpointKind, text_len: usize },
    /// Budget exhausted without meeting either condition
    TimedOut { polls: usize },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, WaitOutcome::TimedOut { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveWait {
    config: WaitConfig,
    classifier: Arc<CheckpointClassifier>,
}

impl AdaptiveWait {
    pub fn new(config: WaitConfig, classifier: Arc<CheckpointClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    pub async fn wait<R: Rng + Send>(
        &self,
        page: &dyn BrowserPage,
        rng: &mut R,
    ) -> Result<WaitOutcome> {
        let timeout = self.config.timeout();
        let start = Instant::now();
        let mut polls = 0;

        while start.elapsed() < timeout {
            polls += 1;

            let html = page.html().await?;
            let title = page.title().await?;
            let verdict = self.classifier.classify(&html, &title);
            let text_len = page.visible_text_len().await?;

            if !verdict.is_checkpoint && text_len > self.config.clean_text_threshold {
                info!("Page settled with {} chars of text", text_len);
                sleep(self.config.settle()).await;
                return Ok(WaitOutcome::Clean { text_len });
            }

            if verdict.is_checkpoint && text_len > self.config.overlay_text_threshold {
                info!(
                    "Checkpoint '{}' present but {} chars of text rendered, treating as overlay",
                    verdict.kind, text_len
                );
                return Ok(WaitOutcome::Overlay {
                    kind: verdict.kind,
                    text_len,
                });
            }

            if verdict.is_checkpoint {
                debug!(
                    "Checkpoint '{}' still present, {} chars of text",
                    verdict.kind, text_len
                );
            } else {
                debug!("No checkpoint but only {} chars of text", text_len);
            }

            if rng.random_bool(self.config.scroll_chance()) {
                let dy = random_between(rng, self.config.min_scroll_px, self.config.max_scroll_px);
                if let Err(e) = page.scroll_by(dy).await {
                    debug!("Scroll failed, page may still be loading: {}", e);
                }
            }

            let delay = random_between(rng, self.config.min_delay_ms, self.config.max_delay_ms);
            sleep(Duration::from_millis(delay)).await;
        }

        warn!("Timed out after {} polls waiting for content to settle", polls);
        Ok(WaitOutcome::TimedOut { polls })
    }
}

fn random_between<R, T>(rng: &mut R, a: T, b: T) -> T
where
    R: Rng,
    T: rand::distr::uniform::SampleUniform + PartialOrd + Copy,
{
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}
