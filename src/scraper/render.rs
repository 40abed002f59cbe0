use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::app::{Result, SiftError};
use crate::domain::Tier;
use crate::fetcher::IdentityRotator;
use crate::scraper::browser::{BrowserLauncher, BrowserSession, LaunchOptions, Viewport};
use crate::scraper::wait::AdaptiveWait;
use crate::scraper::Renderer;

/// Which browser profile a renderer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderVariant {
    /// Fingerprint patches, full HD viewport
    Stealth,
    /// Stock browser, laptop viewport
    Plain,
}

impl RenderVariant {
    pub fn viewport(&self) -> Viewport {
        match self {
            RenderVariant::Stealth => Viewport::DESKTOP_FULL_HD,
            RenderVariant::Plain => Viewport::LAPTOP,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            RenderVariant::Stealth => Tier::Stealth,
            RenderVariant::Plain => Tier::Plain,
        }
    }
}

/// Renders a page in a fresh browser process and returns its final HTML
pub struct BrowserRenderer {
    variant: RenderVariant,
    launcher: Arc<dyn BrowserLauncher>,
    options: LaunchOptions,
    identity: Arc<IdentityRotator>,
    waiter: AdaptiveWait,
    navigation_timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(
        variant: RenderVariant,
        launcher: Arc<dyn BrowserLauncher>,
        mut options: LaunchOptions,
        identity: Arc<IdentityRotator>,
        waiter: AdaptiveWait,
        navigation_timeout: Duration,
    ) -> Self {
        options.stealth = variant == RenderVariant::Stealth;
        Self {
            variant,
            launcher,
            options,
            identity,
            waiter,
            navigation_timeout,
        }
    }

    pub fn variant(&self) -> RenderVariant {
        self.variant
    }

    async fn render_in(&self, session: &dyn BrowserSession, url: &str) -> Result<String> {
        let page = session.new_page().await?;

        if self.variant == RenderVariant::Stealth {
            page.apply_stealth().await?;
        }
        page.set_user_agent(self.identity.user_agent()).await?;
        page.set_viewport(self.variant.viewport()).await?;

        info!("[{}] Navigating to {}", self.tier(), url);
        let budget = self.navigation_timeout.as_secs();
        tokio::time::timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| SiftError::Timeout(format!("navigation exceeded {}s", budget)))??;

        let mut rng = self.identity.fork_rng();
        let outcome = self.waiter.wait(page.as_ref(), &mut rng).await?;
        if !outcome.is_success() {
            warn!("[{}] Content never settled, using last snapshot", self.tier());
        }

        page.html().await
    }
}

#[async_trait]
impl Renderer for BrowserRenderer {
    fn tier(&self) -> Tier {
        self.variant.tier()
    }

    async fn render(&self, url: &str) -> Result<String> {
        info!("[{}] Launching browser", self.tier());
        let mut session = self.launcher.launch(&self.options).await?;

        let result = self.render_in(session.as_ref(), url).await;

        if let Err(e) = session.close().await {
            warn!("[{}] Failed to close browser: {}", self.tier(), e);
        }

        result
    }
}
