pub mod http_fetcher;
pub mod identity;

pub use http_fetcher::HttpFetcher;
pub use identity::{HeaderSet, IdentityRotator, USER_AGENTS};

use async_trait::async_trait;

use crate::app::Result;

/// Raw response of a direct fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cheapest retrieval tier: one plain HTTP GET
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fails only on network or timeout errors; HTTP error statuses are
    /// returned in the response.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}
