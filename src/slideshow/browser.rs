//! Headless Chrome page rendering over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::error::RenderError;
use super::extract::DEFAULT_SLIDE_SELECTOR;
use crate::auth::BrowserCookie;

/// Page opened first so cookies can be set on the platform origin.
pub const PLATFORM_HOME_URL: &str = "https://www.tiktok.com/";

/// Default wait for the slide selector (seconds).
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 10;

/// Interval between selector checks while waiting.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser flags. Hide the automation marker the platform checks for.
const CHROME_ARGS: [&str; 5] = [
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--start-maximized",
    "--enable-automation",
    "--disable-blink-features=AutomationControlled",
];

/// Produces the rendered HTML of a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads `url` with `cookies` and returns its HTML once the slides appear.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::PageLoadTimeout`] when the slides never appear,
    /// or a launch/protocol error.
    async fn render(&self, url: &str, cookies: &[BrowserCookie]) -> Result<String, RenderError>;
}

/// [`PageRenderer`] backed by a headless Chrome/Chromium.
///
/// Each call launches its own browser and tears it down before returning.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    executable: Option<PathBuf>,
    wait_selector: String,
    timeout: Duration,
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChromeRenderer {
    /// Creates a renderer. `executable` of `None` auto-detects the browser.
    #[must_use]
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            wait_selector: DEFAULT_SLIDE_SELECTOR.to_string(),
            timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
        }
    }

    /// Sets the selector awaited before the page is captured.
    #[must_use]
    pub fn with_wait_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_selector = selector.into();
        self
    }

    /// Sets how long to wait for the selector.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder().no_sandbox().args(CHROME_ARGS);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Launch)
    }

    async fn capture(
        &self,
        browser: &mut Browser,
        url: &str,
        cookies: &[BrowserCookie],
    ) -> Result<String, RenderError> {
        let page = browser.new_page(PLATFORM_HOME_URL).await?;

        let params = cookie_params(cookies);
        if !params.is_empty() {
            page.set_cookies(params).await?;
        }
        page.reload().await?;
        debug!(cookies = cookies.len(), "session cookies injected");

        page.goto(url).await?;
        self.wait_for_selector(&page).await?;

        let html = page.content().await?;
        info!(bytes = html.len(), "Captured rendered page");
        Ok(html)
    }

    async fn wait_for_selector(&self, page: &Page) -> Result<(), RenderError> {
        let poll = async {
            loop {
                if page.find_element(self.wait_selector.as_str()).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| RenderError::PageLoadTimeout {
                selector: self.wait_selector.clone(),
                timeout_secs: self.timeout.as_secs(),
            })
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    #[instrument(skip(self, cookies), fields(url = %url))]
    async fn render(&self, url: &str, cookies: &[BrowserCookie]) -> Result<String, RenderError> {
        let mut session = BrowserSession::launch(self.config()?).await?;
        let result = self.capture(&mut session.browser, url, cookies).await;
        session.close().await;
        result
    }
}

/// A running browser and the task driving its DevTools connection.
///
/// Dropping the session without [`close`](Self::close), e.g. when the render
/// future is cancelled, still aborts the handler task; `Browser` kills its
/// child process on drop.
struct BrowserSession {
    browser: Browser,
    handler: HandlerTask,
}

/// Owns the DevTools handler task and aborts it on drop.
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl BrowserSession {
    async fn launch(config: BrowserConfig) -> Result<Self, RenderError> {
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let handler = HandlerTask(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(error) = event {
                    debug!(error = %error, "browser handler stopped");
                    break;
                }
            }
        }));
        debug!("browser launched");
        Ok(Self { browser, handler })
    }

    async fn close(mut self) {
        if let Err(error) = self.browser.close().await {
            warn!(error = %error, "failed to close browser cleanly");
        }
        if let Err(error) = self.browser.wait().await {
            warn!(error = %error, "failed to reap browser process");
        }
        drop(self.handler);
        debug!("browser closed");
    }
}

fn cookie_params(cookies: &[BrowserCookie]) -> Vec<CookieParam> {
    cookies
        .iter()
        .filter_map(|cookie| {
            CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .build()
                .map_err(|error| {
                    warn!(name = %cookie.name, error = %error, "skipping cookie for browser");
                })
                .ok()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_defaults() {
        let renderer = ChromeRenderer::default();
        assert_eq!(renderer.wait_selector, DEFAULT_SLIDE_SELECTOR);
        assert_eq!(renderer.timeout, Duration::from_secs(10));
        assert!(renderer.executable.is_none());
    }

    #[test]
    fn test_renderer_overrides() {
        let renderer = ChromeRenderer::new(Some(PathBuf::from("/opt/chrome")))
            .with_wait_selector("img.slide")
            .with_timeout(Duration::from_secs(30));
        assert_eq!(renderer.wait_selector, "img.slide");
        assert_eq!(renderer.timeout, Duration::from_secs(30));
        assert_eq!(renderer.executable, Some(PathBuf::from("/opt/chrome")));
    }

    #[tokio::test]
    async fn test_handler_task_aborted_on_drop() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = HandlerTask(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        }));
        tokio::task::yield_now().await;

        drop(task);

        assert!(rx.await.is_err(), "aborting the task drops its sender");
    }

    #[test]
    fn test_cookie_params_carry_all_fields() {
        let cookies = vec![BrowserCookie {
            name: "sessionid".to_string(),
            value: "abc".to_string(),
            domain: ".tiktok.com".to_string(),
            path: "/".to_string(),
            secure: true,
        }];
        let params = cookie_params(&cookies);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "sessionid");
        assert_eq!(params[0].value, "abc");
        assert_eq!(params[0].domain.as_deref(), Some(".tiktok.com"));
        assert_eq!(params[0].path.as_deref(), Some("/"));
        assert_eq!(params[0].secure, Some(true));
    }
}
