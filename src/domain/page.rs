use std::fmt;

use serde::{Deserialize, Serialize};

/// Incoming scrape request. The URL is raw user input and may lack a scheme.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeRequest {
    pub url: Option<String>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// The request URL with a scheme, or `None` when no URL was given
    pub fn normalized_url(&self) -> Option<String> {
        self.url.as_deref().and_then(normalize_url)
    }
}

/// Prefix `https://` when the input has no http(s) scheme.
///
/// Returns `None` for empty or whitespace-only input. Applying it to its own
/// output is a no-op.
pub fn normalize_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if has_http_scheme(raw) {
        Some(raw.to_string())
    } else {
        Some(format!("https://{}", raw))
    }
}

fn has_http_scheme(url: &str) -> bool {
    // Case-insensitive on purpose: `HTTP://x` is kept, not prefixed
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// HTML captured by one retrieval tier, with the title used for classification
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub html: String,
    pub title: String,
}

/// Normalized output of a successful scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedData {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
}

/// Which extraction path produced the [`ScrapedData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Readability,
    Fallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Readability => "readability",
            ExtractionMethod::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval tier, in increasing order of cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Direct,
    Stealth,
    Plain,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Direct => "direct",
            Tier::Stealth => "stealth",
            Tier::Plain => "plain",
        };
        f.write_str(name)
    }
}
