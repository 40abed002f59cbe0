use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the scrape pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Direct fetch timeout in seconds (default: 10)
    pub direct_timeout_secs: u64,

    /// Browser navigation timeout in seconds (default: 60)
    pub navigation_timeout_secs: u64,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Chrome/Chromium binary. Probed from well-known locations when unset.
    pub executable_path: Option<PathBuf>,

    /// Extra arguments passed to the browser on launch
    pub launch_args: Vec<String>,

    /// Seed for header rotation and wait-loop jitter. Random when unset.
    pub rng_seed: Option<u64>,

    /// CSS selectors to try for fallback content extraction, in priority order
    pub content_selectors: Vec<String>,

    /// CSS selectors for elements dropped from fallback content
    pub remove_selectors: Vec<String>,

    /// Maximum concurrent pipelines for batch scraping (default: 4)
    pub max_concurrency: usize,

    /// Adaptive wait tuning
    pub wait: WaitConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            direct_timeout_secs: 10,
            navigation_timeout_secs: 60,
            headless: true,
            executable_path: None,
            launch_args: vec![
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
            ],
            rng_seed: None,
            content_selectors: vec![
                "main".to_string(),
                "[role=\"main\"]".to_string(),
                ".main-content".to_string(),
                ".content".to_string(),
                "article".to_string(),
                ".post-content".to_string(),
                ".entry-content".to_string(),
                ".page-content".to_string(),
                "section".to_string(),
            ],
            remove_selectors: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
                "aside".to_string(),
            ],
            max_concurrency: 4,
            wait: WaitConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Get the direct fetch timeout as a Duration
    pub fn direct_timeout(&self) -> Duration {
        Duration::from_secs(self.direct_timeout_secs)
    }

    /// Get the navigation timeout as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Create a config that gives up sooner on slow or protected pages
    pub fn fast() -> Self {
        Self {
            direct_timeout_secs: 5,
            navigation_timeout_secs: 30,
            max_concurrency: 8,
            wait: WaitConfig {
                timeout_ms: 10_000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a config that waits longer for heavily protected pages
    pub fn thorough() -> Self {
        Self {
            direct_timeout_secs: 20,
            navigation_timeout_secs: 90,
            max_concurrency: 2,
            wait: WaitConfig {
                timeout_ms: 45_000,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Tuning for the adaptive wait loop.
///
/// The text thresholds are heuristics, not business rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Overall budget for the loop in milliseconds (default: 25000)
    pub timeout_ms: u64,

    /// Visible text length a checkpoint-free page must exceed (default: 200)
    pub clean_text_threshold: usize,

    /// Visible text length that overrides a detected checkpoint (default: 1500)
    pub overlay_text_threshold: usize,

    /// Extra pause after a clean success in milliseconds (default: 1000)
    pub settle_ms: u64,

    /// Chance of scrolling on each unsuccessful poll (default: 0.3)
    pub scroll_probability: f64,

    pub min_scroll_px: i64,
    pub max_scroll_px: i64,

    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 25_000,
            clean_text_threshold: 200,
            overlay_text_threshold: 1500,
            settle_ms: 1000,
            scroll_probability: 0.3,
            min_scroll_px: 25,
            max_scroll_px: 75,
            min_delay_ms: 1500,
            max_delay_ms: 2500,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Scroll chance as a valid probability. Non-finite values disable scrolling.
    pub fn scroll_chance(&self) -> f64 {
        if self.scroll_probability.is_finite() {
            self.scroll_probability.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.scroll_probability) {
            return Err(format!(
                "scraper.wait.scroll_probability must be between 0 and 1, got {}",
                self.scroll_probability
            ));
        }
        Ok(())
    }
}
