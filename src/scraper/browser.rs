//! Headless browser seam.
//!
//! Rendering is written against these traits so the chromiumoxide driver in
//! [`chrome`](super::chrome) can be swapped for a stub in tests.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::app::Result;

/// Launch parameters, resolved once when the pipeline is built
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub executable_path: Option<PathBuf>,
    pub args: Vec<String>,
    pub headless: bool,
    /// Patch automation fingerprints at launch
    pub stealth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DESKTOP_FULL_HD: Viewport = Viewport {
        width: 1920,
        height: 1080,
    };
    pub const LAPTOP: Viewport = Viewport {
        width: 1366,
        height: 768,
    };
}

/// Starts browser processes
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>>;
}

/// A running browser process. Must be closed by whoever launched it.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>>;

    async fn close(&mut self) -> Result<()>;
}

/// A single tab
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Install fingerprint masking scripts; call before navigating
    async fn apply_stealth(&self) -> Result<()>;

    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Navigate and resolve once the DOM is parsed. Has no deadline of its
    /// own; callers wrap it in their navigation timeout.
    async fn goto(&self, url: &str) -> Result<()>;

    async fn html(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Length of `document.body.innerText`
    async fn visible_text_len(&self) -> Result<usize>;

    async fn scroll_by(&self, dy: i64) -> Result<()>;
}
