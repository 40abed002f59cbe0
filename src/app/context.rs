use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::scraper::browser::BrowserLauncher;
use crate::scraper::{ChromeLauncher, ParallelScraper, ScrapePipeline};

pub struct AppContext {
    pub config: Config,
    pub pipeline: Arc<ScrapePipeline>,
    pub parallel_scraper: ParallelScraper,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let workers = config.scraper.max_concurrency;
        Self::with_workers(config, workers)
    }

    pub fn with_workers(config: Config, workers: usize) -> Result<Self> {
        Self::with_launcher(config, Arc::new(ChromeLauncher::new()), workers)
    }

    pub fn with_launcher(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
        workers: usize,
    ) -> Result<Self> {
        let pipeline = Arc::new(ScrapePipeline::from_config(&config.scraper, launcher)?);
        let parallel_scraper = ParallelScraper::with_workers(pipeline.clone(), workers);

        Ok(Self {
            config,
            pipeline,
            parallel_scraper,
        })
    }
}
