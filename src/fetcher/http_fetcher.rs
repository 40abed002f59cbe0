use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::app::{Result, SiftError};
use crate::fetcher::{FetchResponse, Fetcher, IdentityRotator};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Direct HTTP fetcher with rotated browser headers
pub struct HttpFetcher {
    client: Client,
    identity: Arc<IdentityRotator>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(identity: Arc<IdentityRotator>) -> Result<Self> {
        Self::with_timeout(identity, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(identity: Arc<IdentityRotator>, timeout: Duration) -> Result<Self> {
        // Default redirect policy follows up to 10 hops
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self {
            client,
            identity,
            timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let headers = self.identity.next_headers();
        debug!("Fetching {} as {}", url, headers.user_agent);

        let response = self
            .client
            .get(url)
            .headers(headers.to_header_map())
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify_error(e))?;

        Ok(FetchResponse { status, body })
    }
}

impl HttpFetcher {
    fn classify_error(&self, e: reqwest::Error) -> SiftError {
        if e.is_timeout() {
            SiftError::Timeout(format!("direct fetch exceeded {}s", self.timeout.as_secs()))
        } else {
            SiftError::Http(e)
        }
    }
}
