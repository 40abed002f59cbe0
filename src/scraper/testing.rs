//! Stubs shared by the scraper, server and batch tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{Result, SiftError};
use crate::domain::Tier;
use crate::fetcher::{FetchResponse, Fetcher};
use crate::scraper::browser::{
    BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions, Viewport,
};
use crate::scraper::checkpoint::CheckpointClassifier;
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::ContentExtractor;
use crate::scraper::pipeline::ScrapePipeline;
use crate::scraper::Renderer;

pub const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Sample Article</title>
    <meta name="description" content="A sample article about building reliable scrapers.">
</head>
<body>
    <nav><a href="/">Home</a> <a href="/about">About</a> <a href="/blog">Blog</a></nav>
    <article>
        <h1>Sample Article</h1>
        <div class="body">
            <p>Reliable content extraction starts with patience, because modern pages are assembled in stages, and the first response a server sends is rarely the document a reader eventually sees in their browser window.</p>
            <p>Publishers wrap articles in navigation, sidebars, cookie banners, and newsletter prompts, so a good extractor scores paragraphs by their length, their punctuation, and the density of links around them before deciding what matters.</p>
            <p>When a site sits behind a protection service, the scraper has to recognise the interstitial page, step up to a real browser, wait for the challenge to clear, and only then hand the settled markup to the extractor.</p>
            <p>Each step is more expensive than the last, which is why the cheap plain request always goes first, and the heavyweight headless browser, with all of its start-up cost, is only launched when nothing else has worked.</p>
        </div>
    </article>
    <footer>Copyright 2024 Example Media. All rights reserved.</footer>
</body>
</html>"#;

pub const CHECKPOINT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Just a moment...</title></head>
<body><h1>Checking your browser before accessing example.com</h1></body>
</html>"#;

/// Page whose snapshots advance once per `html()` call
pub struct ScriptedPage {
    frames: Vec<(&'static str, usize)>,
    polls: AtomicUsize,
    scrolls: Mutex<Vec<i64>>,
    fail: bool,
}

impl ScriptedPage {
    pub fn new(frames: Vec<(&'static str, usize)>) -> Self {
        Self {
            frames,
            polls: AtomicUsize::new(0),
            scrolls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![("", 0)])
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> Vec<i64> {
        self.scrolls.lock().unwrap().clone()
    }

    fn frame(&self) -> (&'static str, usize) {
        let idx = self.polls().saturating_sub(1).min(self.frames.len() - 1);
        self.frames[idx]
    }
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn apply_stealth(&self) -> Result<()> {
        Ok(())
    }

    async fn set_user_agent(&self, _user_agent: &str) -> Result<()> {
        Ok(())
    }

    async fn set_viewport(&self, _viewport: Viewport) -> Result<()> {
        Ok(())
    }

    async fn goto(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        if self.fail {
            return Err(SiftError::Browser("target closed".into()));
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame().0.to_string())
    }

    async fn title(&self) -> Result<String> {
        Ok(String::new())
    }

    async fn visible_text_len(&self) -> Result<usize> {
        Ok(self.frame().1)
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.scrolls.lock().unwrap().push(dy);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GotoBehavior {
    Load,
    /// Resolves after the given delay
    Slow(Duration),
    Fail,
    Hang,
}

/// What every page opened by a [`StubLauncher`] does
#[derive(Debug, Clone, Copy)]
pub struct PageBehavior {
    pub html: &'static str,
    pub text_len: usize,
    pub goto: GotoBehavior,
}

impl PageBehavior {
    pub fn article() -> Self {
        Self {
            html: ARTICLE_HTML,
            text_len: 900,
            goto: GotoBehavior::Load,
        }
    }

    pub fn checkpoint() -> Self {
        Self {
            html: CHECKPOINT_HTML,
            text_len: 50,
            goto: GotoBehavior::Load,
        }
    }

    pub fn failing_goto() -> Self {
        Self {
            goto: GotoBehavior::Fail,
            ..Self::article()
        }
    }

    pub fn slow_goto(delay: Duration) -> Self {
        Self {
            goto: GotoBehavior::Slow(delay),
            ..Self::article()
        }
    }

    pub fn hanging_goto() -> Self {
        Self {
            goto: GotoBehavior::Hang,
            ..Self::article()
        }
    }
}

pub struct StubLauncher {
    behavior: PageBehavior,
    fail_launch: bool,
    launches: AtomicUsize,
    closes: Arc<AtomicUsize>,
    options: Mutex<Option<LaunchOptions>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl StubLauncher {
    pub fn new(behavior: PageBehavior) -> Self {
        Self {
            behavior,
            fail_launch: false,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            options: Mutex::new(None),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(PageBehavior::article())
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<LaunchOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn page_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for StubLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self.options.lock().unwrap() = Some(options.clone());

        if self.fail_launch {
            return Err(SiftError::Browser("Failed to launch browser: no chrome".into()));
        }

        Ok(Box::new(StubSession {
            behavior: self.behavior,
            closes: self.closes.clone(),
            log: self.log.clone(),
        }))
    }
}

struct StubSession {
    behavior: PageBehavior,
    closes: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        Ok(Box::new(StubPage {
            behavior: self.behavior,
            log: self.log.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StubPage {
    behavior: PageBehavior,
    log: Arc<Mutex<Vec<String>>>,
}

impl StubPage {
    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl BrowserPage for StubPage {
    async fn apply_stealth(&self) -> Result<()> {
        self.record("stealth".into());
        Ok(())
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.record(format!("user-agent {}", user_agent));
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.record(format!("viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        match self.behavior.goto {
            GotoBehavior::Load => Ok(()),
            GotoBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            GotoBehavior::Fail => Err(SiftError::Browser("net::ERR_CONNECTION_RESET".into())),
            GotoBehavior::Hang => std::future::pending().await,
        }
    }

    async fn html(&self) -> Result<String> {
        Ok(self.behavior.html.to_string())
    }

    async fn title(&self) -> Result<String> {
        Ok(String::new())
    }

    async fn visible_text_len(&self) -> Result<usize> {
        Ok(self.behavior.text_len)
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.record(format!("scroll {}", dy));
        Ok(())
    }
}

pub enum FetchBehavior {
    Respond { status: u16, body: String },
    Fail(&'static str),
    Timeout,
}

pub struct StubFetcher {
    behavior: FetchBehavior,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(FetchBehavior::Respond {
            status: 200,
            body: body.to_string(),
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.behavior {
            FetchBehavior::Respond { status, body } => Ok(FetchResponse {
                status: *status,
                body: body.clone(),
            }),
            FetchBehavior::Fail(msg) => Err(SiftError::Other(msg.to_string())),
            FetchBehavior::Timeout => Err(SiftError::Timeout("direct fetch exceeded 10s".into())),
        }
    }
}

pub struct StubRenderer {
    tier: Tier,
    outcome: std::result::Result<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StubRenderer {
    pub fn succeeding(tier: Tier, html: &str) -> Self {
        Self {
            tier,
            outcome: Ok(html.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(tier: Tier, error: &str) -> Self {
        Self {
            tier,
            outcome: Err(error.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn render(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.outcome.clone().map_err(SiftError::Browser)
    }
}

pub fn stub_pipeline(
    fetcher: Arc<StubFetcher>,
    stealth: Arc<StubRenderer>,
    plain: Arc<StubRenderer>,
) -> ScrapePipeline {
    ScrapePipeline::new(
        fetcher,
        stealth,
        plain,
        Arc::new(CheckpointClassifier::default()),
        Arc::new(ContentExtractor::new(&ScraperConfig::default())),
    )
}
