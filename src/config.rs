//! Run configuration shared by the CLI and the library collaborators.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CookieRecord, load_cookies_into_jar};
use crate::download::{CONNECT_TIMEOUT_SECS, DownloadError, HttpClient, READ_TIMEOUT_SECS};
use crate::pipeline::Collaborators;
use crate::slideshow::{
    ChromeRenderer, DEFAULT_PAGE_TIMEOUT_SECS, DEFAULT_SLIDE_SELECTOR, ExtractError,
    SlideExtractor,
};
use crate::ytdlp::{DEFAULT_YTDLP_BINARY, DEFAULT_YTDLP_TIMEOUT_SECS, YtDlp};

/// Tunables for one run. Defaults match the CLI defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// `yt-dlp` executable.
    pub ytdlp_binary: PathBuf,
    /// `yt-dlp` subprocess timeout.
    pub ytdlp_timeout: Duration,
    /// Chrome/Chromium executable; `None` auto-detects.
    pub chrome_executable: Option<PathBuf>,
    /// Wait for the slide selector after navigation.
    pub page_timeout: Duration,
    /// CSS selector of slide images.
    pub slide_selector: String,
    /// HTTP connect timeout.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout per request.
    pub read_timeout_secs: u64,
    /// Show a progress bar for image batches.
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ytdlp_binary: PathBuf::from(DEFAULT_YTDLP_BINARY),
            ytdlp_timeout: Duration::from_secs(DEFAULT_YTDLP_TIMEOUT_SECS),
            chrome_executable: None,
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            slide_selector: DEFAULT_SLIDE_SELECTOR.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            show_progress: false,
        }
    }
}

impl RunConfig {
    /// Builds the production collaborators: one HTTP client (redirects and
    /// images) carrying the session cookies, `yt-dlp` and headless Chrome.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn collaborators(
        &self,
        cookie_records: &[CookieRecord],
    ) -> Result<Collaborators, DownloadError> {
        let jar = load_cookies_into_jar(cookie_records);
        let http = Arc::new(HttpClient::with_timeouts(
            Some(jar),
            self.connect_timeout_secs,
            self.read_timeout_secs,
        )?);
        let backend = YtDlp::new(self.ytdlp_binary.clone()).with_timeout(self.ytdlp_timeout);
        let renderer = ChromeRenderer::new(self.chrome_executable.clone())
            .with_wait_selector(self.slide_selector.clone())
            .with_timeout(self.page_timeout);

        Ok(Collaborators {
            redirects: http.clone(),
            backend: Arc::new(backend),
            renderer: Arc::new(renderer),
            images: http,
        })
    }

    /// Builds the extractor for the configured slide selector.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] if the selector does not parse.
    pub fn slide_extractor(&self) -> Result<SlideExtractor, ExtractError> {
        SlideExtractor::new(&self.slide_selector)
    }
}
