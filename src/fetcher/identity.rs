//! Browser-realistic request identities.

use std::sync::{Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Desktop browser user agents to rotate through.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Headers sent alongside the user agent, modeled on a top-level navigation.
/// Accept-Encoding is left to reqwest, which only advertises what it decodes.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("dnt", "1"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
];

/// One randomized identity: a user agent plus the fixed browser headers
#[derive(Debug, Clone)]
pub struct HeaderSet {
    pub user_agent: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

impl HeaderSet {
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(self.user_agent),
        );
        for (name, value) in self.headers {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }
}

/// Seedable source of request identities.
///
/// Also hands out independent RNGs for anything else in a scrape that
/// needs randomness, so a fixed seed makes the whole pipeline repeatable.
pub struct IdentityRotator {
    rng: Mutex<StdRng>,
}

impl IdentityRotator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn next_headers(&self) -> HeaderSet {
        HeaderSet {
            user_agent: self.user_agent(),
            headers: BROWSER_HEADERS,
        }
    }

    /// Pick a user agent uniformly from [`USER_AGENTS`]
    pub fn user_agent(&self) -> &'static str {
        let idx = self.lock().random_range(0..USER_AGENTS.len());
        USER_AGENTS[idx]
    }

    /// Derive an owned RNG that can be carried across await points
    pub fn fork_rng(&self) -> StdRng {
        StdRng::from_rng(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self::new(None)
    }
}
