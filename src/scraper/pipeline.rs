//! The escalation ladder: direct fetch, then stealth render, then plain render.
//!
//! Each tier runs only when the cheaper one before it failed or served a
//! checkpoint. Nothing is retried and no tier is revisited.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::{ExtractionMethod, PageSnapshot, ScrapeRequest, ScrapedData, Tier};
use crate::fetcher::{Fetcher, HttpFetcher, IdentityRotator};
use crate::scraper::browser::{BrowserLauncher, LaunchOptions};
use crate::scraper::checkpoint::CheckpointClassifier;
use crate::scraper::extractor::{page_title, ContentExtractor};
use crate::scraper::render::{BrowserRenderer, RenderVariant};
use crate::scraper::wait::AdaptiveWait;
use crate::scraper::{Renderer, ScraperConfig};

pub const BLOCKED_MESSAGE: &str = "This website has strong protection that could not be bypassed.";
pub const BLOCKED_SUGGESTION: &str =
    "Try accessing the website directly in your browser first, then try again later.";
pub const BLOCKED_TYPE: &str = "SCRAPING_BLOCKED";

/// Failures a caller gets to see. Everything else turns into escalation.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("URL is required")]
    MissingUrl,

    #[error("{msg}", msg = BLOCKED_MESSAGE)]
    Blocked { reason: String },

    #[error("Failed to retrieve page content.")]
    NoContent,
}

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub data: ScrapedData,
    pub method: ExtractionMethod,
    /// Tier whose HTML was extracted
    pub tier: Tier,
}

enum Stage {
    DirectFetch,
    FallbackStealth,
    FallbackPlain,
    Extract { html: String, tier: Tier },
}

pub struct ScrapePipeline {
    fetcher: Arc<dyn Fetcher>,
    stealth: Arc<dyn Renderer>,
    plain: Arc<dyn Renderer>,
    classifier: Arc<CheckpointClassifier>,
    extractor: Arc<ContentExtractor>,
}

impl ScrapePipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        stealth: Arc<dyn Renderer>,
        plain: Arc<dyn Renderer>,
        classifier: Arc<CheckpointClassifier>,
        extractor: Arc<ContentExtractor>,
    ) -> Self {
        Self {
            fetcher,
            stealth,
            plain,
            classifier,
            extractor,
        }
    }

    /// Wire the real tiers from configuration. Browser launch settings are
    /// resolved here once and shared by both render variants.
    pub fn from_config(config: &ScraperConfig, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let identity = Arc::new(IdentityRotator::new(config.rng_seed));
        let classifier = Arc::new(CheckpointClassifier::default());

        let fetcher = HttpFetcher::with_timeout(identity.clone(), config.direct_timeout())?;

        let options = LaunchOptions {
            executable_path: config.executable_path.clone(),
            args: config.launch_args.clone(),
            headless: config.headless,
            stealth: false,
        };
        let waiter = AdaptiveWait::new(config.wait.clone(), classifier.clone());

        let renderer = |variant| {
            Arc::new(BrowserRenderer::new(
                variant,
                launcher.clone(),
                options.clone(),
                identity.clone(),
                waiter.clone(),
                config.navigation_timeout(),
            ))
        };

        Ok(Self::new(
            Arc::new(fetcher),
            renderer(RenderVariant::Stealth),
            renderer(RenderVariant::Plain),
            classifier,
            Arc::new(ContentExtractor::new(config)),
        ))
    }

    pub async fn scrape(&self, url: &str) -> std::result::Result<ScrapeOutcome, PipelineError> {
        self.run(&ScrapeRequest::new(url)).await
    }

    pub async fn run(
        &self,
        request: &ScrapeRequest,
    ) -> std::result::Result<ScrapeOutcome, PipelineError> {
        let url = request.normalized_url().ok_or_else(|| {
            info!("Rejecting request without a URL");
            PipelineError::MissingUrl
        })?;
        info!("Scraping {}", url);

        let mut stage = Stage::DirectFetch;
        loop {
            stage = match stage {
                Stage::DirectFetch => self.direct(&url).await,
                Stage::FallbackStealth => match self.render(self.stealth.as_ref(), &url).await {
                    Some(html) => Stage::Extract {
                        html,
                        tier: Tier::Stealth,
                    },
                    None => Stage::FallbackPlain,
                },
                Stage::FallbackPlain => match self.render(self.plain.as_ref(), &url).await {
                    Some(html) => Stage::Extract {
                        html,
                        tier: Tier::Plain,
                    },
                    None => {
                        error!("All retrieval tiers failed for {}", url);
                        return Err(PipelineError::Blocked {
                            reason: format!(
                                "{} and {} rendering failed",
                                Tier::Stealth,
                                Tier::Plain
                            ),
                        });
                    }
                },
                Stage::Extract { html, tier } => return self.extract(&url, &html, tier),
            };
        }
    }

    async fn direct(&self, url: &str) -> Stage {
        info!("[{}] Attempting direct fetch", Tier::Direct);

        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("[{}] Fetch failed, escalating: {}", Tier::Direct, e);
                return Stage::FallbackStealth;
            }
        };

        if !response.is_success() {
            warn!("[{}] Status {}, escalating", Tier::Direct, response.status);
            return Stage::FallbackStealth;
        }

        let snapshot = PageSnapshot {
            title: page_title(&response.body),
            html: response.body,
        };
        let verdict = self.classifier.classify(&snapshot.html, &snapshot.title);
        if verdict.is_checkpoint {
            warn!(
                "[{}] Checkpoint in 200 response ({}), escalating",
                Tier::Direct,
                verdict.kind
            );
            return Stage::FallbackStealth;
        }

        info!("[{}] Content looks valid", Tier::Direct);
        Stage::Extract {
            html: snapshot.html,
            tier: Tier::Direct,
        }
    }

    async fn render(&self, renderer: &dyn Renderer, url: &str) -> Option<String> {
        info!("[{}] Trying browser render", renderer.tier());
        match renderer.render(url).await {
            Ok(html) => {
                info!("[{}] Render succeeded", renderer.tier());
                Some(html)
            }
            Err(e) => {
                warn!("[{}] Render failed: {}", renderer.tier(), e);
                None
            }
        }
    }

    fn extract(
        &self,
        url: &str,
        html: &str,
        tier: Tier,
    ) -> std::result::Result<ScrapeOutcome, PipelineError> {
        // Intentional: blank markup is a failed retrieval, not a placeholder page
        if html.trim().is_empty() {
            error!("[{}] No HTML to extract from {}", tier, url);
            return Err(PipelineError::NoContent);
        }

        let extraction = self.extractor.extract(html, url);
        info!(
            "Extracted {} via {} from {} HTML",
            url, extraction.method, tier
        );

        Ok(ScrapeOutcome {
            data: extraction.data,
            method: extraction.method,
            tier,
        })
    }
}
