use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{Result, SiftError};
use crate::scraper::browser::{
    BrowserLauncher, BrowserPage, BrowserSession, LaunchOptions, Viewport,
};

/// Common Chrome executable paths to check when none is configured.
const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

/// Always passed, on top of chromiumoxide's defaults.
const BASE_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-software-rasterizer",
];

const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Reports `"error"` for Chrome's own error page and `"loading"` until the
/// target document has replaced `about:blank`.
const READY_STATE_SCRIPT: &str = "location.protocol === 'chrome-error:' ? 'error' \
    : location.href === 'about:blank' ? 'loading' : document.readyState";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long a closed browser gets to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Runs before any page script on every document.
const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => false });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = window.chrome || { runtime: {} };
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
"#;

/// Launches local Chrome/Chromium processes through chromiumoxide
#[derive(Default)]
pub struct ChromeLauncher {
    detected: OnceCell<Option<PathBuf>>,
}

impl ChromeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn executable(&self, options: &LaunchOptions) -> Option<PathBuf> {
        if let Some(ref path) = options.executable_path {
            return Some(path.clone());
        }

        self.detected
            .get_or_init(|| async {
                let found = CHROME_PATHS
                    .iter()
                    .map(Path::new)
                    .find(|p| p.exists())
                    .map(Path::to_path_buf);
                match found {
                    Some(ref path) => info!("Found Chrome at: {}", path.display()),
                    None => debug!("No Chrome in well-known paths, deferring to chromiumoxide"),
                }
                found
            })
            .await
            .clone()
    }
}

/// Browser arguments for one launch, in the order they are passed.
fn launch_args(options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();
    if options.stealth {
        args.extend(STEALTH_ARGS.iter().map(|a| a.to_string()));
    }
    args.extend(options.args.iter().cloned());
    args
}

/// Fresh profile directory for one browser process. Removed on drop.
fn profile_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix("pagesift-chrome-")
        .tempdir()?)
}

fn browser_config(
    executable: Option<PathBuf>,
    options: &LaunchOptions,
    profile: &Path,
) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder().user_data_dir(profile);

    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }

    if !options.headless {
        builder = builder.with_head();
    }

    for arg in launch_args(options) {
        builder = builder.arg(arg);
    }

    builder
        .build()
        .map_err(|e| SiftError::Browser(format!("Failed to build browser config: {}", e)))
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        let profile = profile_dir()?;
        let executable = self.executable(options).await;
        let browser_config = browser_config(executable, options, profile.path())?;
        debug!("Launching browser with profile {}", profile.path().display());

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            SiftError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(ChromeSession {
            browser,
            handler,
            _profile: profile,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    // Declared last so the directory outlives the process
    _profile: TempDir,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| SiftError::Browser(format!("Failed to create page: {}", e)))?;

        Ok(Box::new(ChromePage { page }))
    }

    async fn close(&mut self) -> Result<()> {
        let result = shut_down(&mut self.browser, EXIT_GRACE).await;
        self.handler.abort();
        result
    }
}

/// The parts of a launched browser that shutdown needs
#[async_trait]
trait BrowserProcess: Send {
    async fn request_close(&mut self) -> Result<()>;

    async fn wait_exit(&mut self) -> std::io::Result<()>;

    async fn force_kill(&mut self) -> std::io::Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<()> {
        self.close()
            .await
            .map(|_| ())
            .map_err(|e| SiftError::Browser(format!("Failed to close browser: {}", e)))
    }

    async fn wait_exit(&mut self) -> std::io::Result<()> {
        self.wait().await.map(|_| ())
    }

    async fn force_kill(&mut self) -> std::io::Result<()> {
        self.kill().await.unwrap_or(Ok(()))
    }
}

/// Ask the browser to close and reap it. The process is killed when close is
/// refused or it has not exited within `grace`.
async fn shut_down<P: BrowserProcess + ?Sized>(process: &mut P, grace: Duration) -> Result<()> {
    let closed = process.request_close().await;
    if let Err(ref e) = closed {
        warn!("{}, killing the process", e);
        kill(process).await;
    }

    match tokio::time::timeout(grace, process.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Browser process did not exit cleanly: {}", e),
        Err(_) => {
            warn!(
                "Browser still running {}s after close, killing it",
                grace.as_secs()
            );
            kill(process).await;
        }
    }

    closed
}

async fn kill<P: BrowserProcess + ?Sized>(process: &mut P) {
    if let Err(e) = process.force_kill().await {
        warn!("Failed to kill browser process: {}", e);
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

struct ChromePage {
    page: Page,
}

impl ChromePage {
    async fn ready_state(&self) -> Result<String> {
        self.page
            .evaluate(READY_STATE_SCRIPT)
            .await?
            .into_value::<String>()
            .map_err(|e| SiftError::Browser(format!("Failed to read readyState: {}", e)))
    }
}

/// Whether the DOM has been parsed, given the value of [`READY_STATE_SCRIPT`].
fn dom_ready(state: &str) -> Result<bool> {
    match state {
        "error" => Err(SiftError::Browser(
            "Navigation failed: browser showed an error page".into(),
        )),
        "loading" => Ok(false),
        _ => Ok(true),
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn apply_stealth(&self) -> Result<()> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await?;
        Ok(())
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.page
            .set_user_agent(user_agent)
            .await
            .map_err(|e| SiftError::Browser(format!("Failed to set user agent: {}", e)))?;
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(SiftError::Browser)?;

        self.page.execute(params).await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        match self.page.goto(url).await {
            Ok(_) => return Ok(()),
            // chromiumoxide stops waiting for the load event after 30s.
            // The caller's timeout bounds the rest.
            Err(CdpError::Timeout) => {
                debug!("Load event still pending for {}, polling readyState", url)
            }
            Err(e) => return Err(SiftError::Browser(format!("Navigation failed: {}", e))),
        }

        loop {
            match self.ready_state().await {
                Ok(state) => {
                    if dom_ready(&state)? {
                        return Ok(());
                    }
                }
                Err(e) => debug!("readyState unavailable mid-navigation: {}", e),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn visible_text_len(&self) -> Result<usize> {
        self.page
            .evaluate("document.body ? document.body.innerText.length : 0")
            .await?
            .into_value::<usize>()
            .map_err(|e| SiftError::Browser(format!("Failed to read text length: {:?}", e)))
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", dy))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Process that only exits once killed, unless `exits` is set
    #[derive(Default)]
    struct FakeProcess {
        refuse_close: bool,
        exits: bool,
        kills: usize,
    }

    #[async_trait]
    impl BrowserProcess for FakeProcess {
        async fn request_close(&mut self) -> Result<()> {
            if self.refuse_close {
                return Err(SiftError::Browser("Failed to close browser: channel closed".into()));
            }
            Ok(())
        }

        async fn wait_exit(&mut self) -> std::io::Result<()> {
            if self.exits || self.kills > 0 {
                return Ok(());
            }
            std::future::pending().await
        }

        async fn force_kill(&mut self) -> std::io::Result<()> {
            self.kills += 1;
            Ok(())
        }
    }

    fn options(stealth: bool) -> LaunchOptions {
        LaunchOptions {
            args: vec!["--no-sandbox".into()],
            headless: true,
            stealth,
            ..Default::default()
        }
    }

    #[test]
    fn test_each_launch_gets_its_own_profile() {
        let first = profile_dir().unwrap();
        let second = profile_dir().unwrap();
        assert_ne!(first.path(), second.path());

        let config = browser_config(
            Some(PathBuf::from("/bin/true")),
            &options(false),
            first.path(),
        )
        .unwrap();
        assert_eq!(config.user_data_dir.as_deref(), Some(first.path()));
    }

    #[test]
    fn test_profile_removed_on_drop() {
        let profile = profile_dir().unwrap();
        let path = profile.path().to_path_buf();
        assert!(path.is_dir());

        drop(profile);
        assert!(!path.exists());
    }

    #[test]
    fn test_only_stealth_gets_stealth_args() {
        let stealth = launch_args(&options(true));
        let plain = launch_args(&options(false));

        for arg in STEALTH_ARGS {
            assert!(stealth.iter().any(|a| a == arg));
            assert!(!plain.iter().any(|a| a == arg));
        }
        // Configured args come last in both variants
        assert_eq!(stealth.last().map(String::as_str), Some("--no-sandbox"));
        assert_eq!(plain.last().map(String::as_str), Some("--no-sandbox"));
        assert!(plain.starts_with(&["--disable-gpu".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_shutdown_does_not_kill() {
        let mut process = FakeProcess {
            exits: true,
            ..Default::default()
        };

        assert!(shut_down(&mut process, EXIT_GRACE).await.is_ok());
        assert_eq!(process.kills, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_close_kills_before_waiting() {
        let mut process = FakeProcess {
            refuse_close: true,
            ..Default::default()
        };

        let started = tokio::time::Instant::now();
        let result = shut_down(&mut process, EXIT_GRACE).await;

        assert!(matches!(result, Err(SiftError::Browser(_))));
        assert_eq!(process.kills, 1);
        assert!(started.elapsed() < EXIT_GRACE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_exit_is_killed_after_grace() {
        let mut process = FakeProcess::default();

        let started = tokio::time::Instant::now();
        assert!(shut_down(&mut process, EXIT_GRACE).await.is_ok());

        assert_eq!(process.kills, 1);
        assert!(started.elapsed() >= EXIT_GRACE);
    }

    #[test]
    fn test_dom_ready_states() {
        assert!(!dom_ready("loading").unwrap());
        assert!(dom_ready("interactive").unwrap());
        assert!(dom_ready("complete").unwrap());
        assert!(matches!(dom_ready("error"), Err(SiftError::Browser(_))));
    }
}
