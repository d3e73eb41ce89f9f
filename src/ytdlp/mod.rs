//! `yt-dlp` media backend: metadata probe and video download.
//!
//! The backend runs as a subprocess. Cookies are passed through the Netscape
//! jar written by [`crate::auth::ensure_cookie_jar`].

mod error;

pub use error::BackendError;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Resolution string the backend reports for posts without a video stream.
pub const AUDIO_ONLY_RESOLUTION: &str = "audio only";

/// Default executable name, looked up on `PATH`.
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Default subprocess timeout (10 minutes).
pub const DEFAULT_YTDLP_TIMEOUT_SECS: u64 = 600;

/// Maximum stderr bytes kept in [`BackendError::Failed`].
const STDERR_TAIL_BYTES: usize = 2048;

/// Metadata reported by a probe. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoMetadata {
    /// Platform content ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Post title.
    #[serde(default)]
    pub title: Option<String>,
    /// Selected format resolution, e.g. `1080x1920` or `audio only`.
    #[serde(default)]
    pub resolution: Option<String>,
    /// File extension of the selected format.
    #[serde(default)]
    pub ext: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoMetadata {
    /// True when the selected format has no video stream.
    ///
    /// A missing resolution is not audio-only.
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        self.resolution.as_deref() == Some(AUDIO_ONLY_RESOLUTION)
    }
}

/// One video download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// Post URL.
    pub url: String,
    /// Backend output template, e.g. `out/[id]%(title).100B.%(ext)s`.
    pub output_template: PathBuf,
    /// Netscape cookie jar.
    pub cookie_jar: PathBuf,
}

/// Probes and downloads videos.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Reads metadata for `url` without downloading media.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend fails or prints invalid JSON.
    async fn probe(&self, url: &str, cookie_jar: &Path) -> Result<VideoMetadata, BackendError>;

    /// Downloads the video described by `request`.
    ///
    /// Returns the saved path when the backend reports it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend fails.
    async fn download_video(&self, request: &VideoRequest)
    -> Result<Option<PathBuf>, BackendError>;
}

/// `yt-dlp` subprocess backend.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(DEFAULT_YTDLP_BINARY)
    }
}

impl YtDlp {
    /// Creates a backend running `binary` with the default timeout.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(DEFAULT_YTDLP_TIMEOUT_SECS),
        }
    }

    /// Overrides the subprocess timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The executable this backend runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run(&self, url: &str, args: Vec<OsString>) -> Result<Output, BackendError> {
        debug!(binary = %self.binary.display(), ?args, "running yt-dlp");
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| BackendError::Timeout {
                binary: self.binary.clone(),
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|source| BackendError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BackendError::Failed {
                binary: self.binary.clone(),
                url: url.to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaBackend for YtDlp {
    #[instrument(skip(self, cookie_jar), fields(url = %url))]
    async fn probe(&self, url: &str, cookie_jar: &Path) -> Result<VideoMetadata, BackendError> {
        let output = self.run(url, probe_args(url, cookie_jar)).await?;
        let metadata = parse_metadata(&output.stdout).map_err(|source| {
            BackendError::InvalidMetadata {
                binary: self.binary.clone(),
                url: url.to_string(),
                source,
            }
        })?;
        debug!(
            resolution = metadata.resolution.as_deref().unwrap_or("<none>"),
            "metadata probed"
        );
        Ok(metadata)
    }

    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn download_video(
        &self,
        request: &VideoRequest,
    ) -> Result<Option<PathBuf>, BackendError> {
        info!("Downloading video");
        let output = self.run(&request.url, download_args(request)).await?;
        Ok(printed_path(&output.stdout))
    }
}

/// Arguments for a metadata-only probe with format `best`.
#[must_use]
pub fn probe_args(url: &str, cookie_jar: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
        "--no-warnings",
        "-f",
        "best",
        "--cookies",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(cookie_jar.as_os_str().to_owned());
    args.push(OsString::from(url));
    args
}

/// Arguments for a video download that prints the final file path.
#[must_use]
pub fn download_args(request: &VideoRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-f", "best", "--no-playlist", "--no-warnings", "--cookies"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(request.cookie_jar.as_os_str().to_owned());
    args.push(OsString::from("-o"));
    args.push(request.output_template.as_os_str().to_owned());
    args.push(OsString::from("--print"));
    args.push(OsString::from("after_move:filepath"));
    args.push(OsString::from(request.url.as_str()));
    args
}

fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, serde_json::Error> {
    serde_json::from_slice(stdout)
}

/// Last non-empty stdout line, which `--print after_move:filepath` emits.
fn printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
