use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::scraper::pipeline::{PipelineError, ScrapeOutcome, ScrapePipeline};

pub const DEFAULT_WORKERS: usize = 4;

/// Runs independent pipelines for many URLs, a bounded number at a time
pub struct ParallelScraper {
    pipeline: Arc<ScrapePipeline>,
    semaphore: Arc<Semaphore>,
}

impl ParallelScraper {
    pub fn new(pipeline: Arc<ScrapePipeline>) -> Self {
        Self::with_workers(pipeline, DEFAULT_WORKERS)
    }

    pub fn with_workers(pipeline: Arc<ScrapePipeline>, workers: usize) -> Self {
        Self {
            pipeline,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Results come back in input order. A task that panics is logged and
    /// left out.
    pub async fn scrape_all(
        &self,
        urls: Vec<String>,
    ) -> Vec<(String, Result<ScrapeOutcome, PipelineError>)> {
        let mut handles = Vec::new();

        for url in urls {
            let pipeline = self.pipeline.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();

                let result = pipeline.scrape(&url).await;
                (url, result)
            });

            handles.push(handle);
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}
