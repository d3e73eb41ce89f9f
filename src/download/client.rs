//! HTTP client wrapper for redirect resolution and slide image downloads.
//!
//! One `HttpClient` is built per run and carries the session cookie jar, so the
//! short-link redirect and every image request share the browser's session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::cookie::Jar;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::resolver::RedirectResolver;
use crate::user_agent;

/// Streams one remote image to a file.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    /// Downloads `url` into `destination`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport, HTTP status or filesystem failure.
    /// No partial file is left behind on error.
    async fn download_image(&self, url: &str, destination: &Path) -> Result<u64, DownloadError>;
}

/// HTTP client for the run, with connection pooling and the session cookies.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeouts and an optional cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend or system
    /// configuration prevents building a client.
    pub fn new(cookie_jar: Option<Arc<Jar>>) -> Result<Self, DownloadError> {
        Self::with_timeouts(cookie_jar, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the client cannot be built.
    #[instrument(level = "debug", skip(cookie_jar))]
    pub fn with_timeouts(
        cookie_jar: Option<Arc<Jar>>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent());
        if let Some(jar) = cookie_jar {
            builder = builder.cookie_provider(jar);
        }
        let client = builder
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Downloads `url` to the exact path `destination`.
    ///
    /// An existing file at `destination` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (401/403/407 become `AuthRequired`)
    /// - Writing to disk fails
    #[instrument(skip(self), fields(url = %url, path = %destination.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::from_request(url, e))?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            if matches!(status_code, 401 | 403 | 407) {
                return Err(DownloadError::auth_required(url, status_code, host_of(url)));
            }
            return Err(DownloadError::http_status(url, status_code));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        match stream_to_file(&mut file, response, url, destination).await {
            Ok(bytes) => {
                info!(bytes, path = %destination.display(), "Downloaded image");
                Ok(bytes)
            }
            Err(error) => {
                drop(file);
                if let Err(cleanup) = tokio::fs::remove_file(destination).await {
                    warn!(
                        path = %destination.display(),
                        error = %cleanup,
                        "failed to remove partial download"
                    );
                }
                Err(error)
            }
        }
    }

    /// Follows redirects for `url` and returns the final URL.
    ///
    /// Only the final location matters; a non-2xx final status is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the request cannot be sent or times out.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn resolve_redirects(&self, url: &str) -> Result<String, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::from_request(url, e))?;

        let final_url = response.url().to_string();
        debug!(
            status = response.status().as_u16(),
            final_url = %final_url,
            "redirects followed"
        );
        Ok(final_url)
    }
}

#[async_trait]
impl ImageDownloader for HttpClient {
    async fn download_image(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        self.download_to_path(url, destination).await
    }
}

#[async_trait]
impl RedirectResolver for HttpClient {
    async fn final_url(&self, url: &str) -> Result<String, DownloadError> {
        self.resolve_redirects(url).await
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(std::string::ToString::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Streams the response body into `file`, returning the bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::from_request(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
