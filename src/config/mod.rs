//! Configuration management for pagesift.
//!
//! Configuration is read from `~/.config/pagesift/config.toml` at startup,
//! or from the path given with `--config`. If the default file doesn't
//! exist, a default configuration with comments is created.

use crate::scraper::ScraperConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
}

/// Where the HTTP endpoint listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing default file is created with comments. A missing explicit
    /// path is an error. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        Self::load_from(&config_path)
    }

    fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        config
            .scraper
            .wait
            .validate()
            .map_err(|message| ConfigError::Invalid {
                path: config_path.to_path_buf(),
                message,
            })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/pagesift/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pagesift").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# pagesift configuration
#
# Every key is optional; anything left out uses the value shown here.

[server]
host = "127.0.0.1"
port = 3000

[scraper]
# Direct HTTP fetch timeout in seconds
direct_timeout_secs = 10

# Browser navigation timeout in seconds
navigation_timeout_secs = 60

# Run the browser without a window
headless = true

# Chrome/Chromium binary. Well-known install paths are probed when unset.
# executable_path = "/usr/bin/chromium"

# Extra browser launch arguments
launch_args = ["--no-sandbox", "--disable-setuid-sandbox"]

# Fix the seed to make header rotation and wait jitter repeatable
# rng_seed = 42

# Maximum pipelines running at once for `pagesift scrape`
max_concurrency = 4

# Fallback extraction: selectors tried in order for the main content
content_selectors = [
    "main",
    "[role=\"main\"]",
    ".main-content",
    ".content",
    "article",
    ".post-content",
    ".entry-content",
    ".page-content",
    "section",
]

# Elements dropped from fallback content
remove_selectors = ["script", "style", "nav", "header", "footer", "aside"]

[scraper.wait]
# Total time to wait for rendered content to settle (milliseconds)
timeout_ms = 25000

# Visible text needed to accept a page with no checkpoint
clean_text_threshold = 200

# Visible text that marks a detected checkpoint as a dismissible overlay
overlay_text_threshold = 1500

# Extra wait after a clean page is detected (milliseconds)
settle_ms = 1000

# Chance of a small scroll between polls
scroll_probability = 0.3
min_scroll_px = 25
max_scroll_px = 75

# Delay between polls (milliseconds)
min_delay_ms = 1500
max_delay_ms = 2500
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}
