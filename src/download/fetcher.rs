//! Batch media fetching: slide images one by one, videos through the backend.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument, warn};

use super::client::ImageDownloader;
use super::error::DownloadError;
use super::filename::{plan_targets, video_output_template};
use crate::slideshow::SlideImage;
use crate::ytdlp::{BackendError, MediaBackend, VideoRequest};

/// One image that could not be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    /// Source URL of the image.
    pub url: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Result of one image batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Files written, in slide order.
    pub fetched: Vec<PathBuf>,
    /// Images that failed, in slide order.
    pub failed: Vec<FailedImage>,
}

impl FetchReport {
    /// Number of images attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.fetched.len() + self.failed.len()
    }

    /// True when at least one image was attempted and every attempt failed.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.fetched.is_empty() && !self.failed.is_empty()
    }
}

/// Progress bar for an image batch; hidden when `visible` is false.
#[must_use]
pub fn batch_progress(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Saves every slide image of one post into `dest_dir`.
///
/// Images are fetched sequentially. A failing image is logged and recorded in
/// the report; the rest of the batch still runs.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] only when `dest_dir` cannot be created.
#[instrument(skip(downloader, images, progress), fields(content_id = %content_id, images = images.len()))]
pub async fn fetch_images(
    downloader: &dyn ImageDownloader,
    content_id: &str,
    images: &[SlideImage],
    dest_dir: &Path,
    progress: &ProgressBar,
) -> Result<FetchReport, DownloadError> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| DownloadError::io(dest_dir, e))?;

    let targets = plan_targets(content_id, images, dest_dir);
    progress.set_length(targets.len() as u64);

    let mut report = FetchReport::default();
    for target in targets {
        progress.set_message(target.file_name.clone());
        let path = target.path();
        match downloader.download_image(&target.source_url, &path).await {
            Ok(bytes) => {
                info!(file = %target.file_name, bytes, "Saved slide image");
                report.fetched.push(path);
            }
            Err(error) => {
                warn!(url = %target.source_url, error = %error, "Image download failed");
                report.failed.push(FailedImage {
                    url: target.source_url,
                    reason: error.to_string(),
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        fetched = report.fetched.len(),
        failed = report.failed.len(),
        "Image batch finished"
    );
    Ok(report)
}

/// Downloads the video for `content_id` through the media backend.
///
/// Returns the saved file path when the backend reports it.
///
/// # Errors
///
/// Returns [`BackendError`] when the backend fails; no retry is attempted.
#[instrument(skip(backend), fields(content_id = %content_id, url = %url))]
pub async fn fetch_video(
    backend: &dyn MediaBackend,
    content_id: &str,
    url: &str,
    dest_dir: &Path,
    cookie_jar: &Path,
) -> Result<Option<PathBuf>, BackendError> {
    let request = VideoRequest {
        url: url.to_string(),
        output_template: video_output_template(dest_dir, content_id),
        cookie_jar: cookie_jar.to_path_buf(),
    };
    let saved = backend.download_video(&request).await?;
    match &saved {
        Some(path) => info!(path = %path.display(), "Saved video"),
        None => info!("Video download finished"),
    }
    Ok(saved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes the URL into the file; fails for URLs containing `fail`.
    #[derive(Default)]
    struct FakeDownloader {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageDownloader for FakeDownloader {
        async fn download_image(
            &self,
            url: &str,
            destination: &Path,
        ) -> Result<u64, DownloadError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("fail") {
                return Err(DownloadError::http_status(url, 404));
            }
            std::fs::write(destination, url).map_err(|e| DownloadError::io(destination, e))?;
            Ok(url.len() as u64)
        }
    }

    #[tokio::test]
    async fn test_fetch_images_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/out");
        let downloader = FakeDownloader::default();
        let images = vec![
            SlideImage::new("https://cdn/a.jpg?s=1", 0),
            SlideImage::new("https://cdn/fail.jpg", 1),
            SlideImage::new("https://cdn/c.jpg", 2),
        ];

        let report = fetch_images(&downloader, "42", &images, &out, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(
            report.fetched,
            vec![out.join("[42]-0-a.jpg"), out.join("[42]-2-c.jpg")]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "https://cdn/fail.jpg");
        assert!(report.failed[0].reason.contains("404"));
        assert_eq!(downloader.calls.lock().unwrap().len(), 3);
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn test_fetch_images_empty_batch_creates_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("empty");
        let downloader = FakeDownloader::default();

        let report = fetch_images(&downloader, "1", &[], &out, &ProgressBar::hidden())
            .await
            .unwrap();

        assert!(out.is_dir());
        assert_eq!(report.attempted(), 0);
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn test_fetch_images_uncreatable_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let downloader = FakeDownloader::default();

        let result = fetch_images(
            &downloader,
            "1",
            &[SlideImage::new("https://cdn/a.jpg", 0)],
            &blocker.join("sub"),
            &ProgressBar::hidden(),
        )
        .await;

        assert!(matches!(result, Err(DownloadError::Io { .. })));
        assert!(downloader.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_report_all_failed() {
        let report = FetchReport {
            fetched: vec![],
            failed: vec![FailedImage {
                url: "u".to_string(),
                reason: "r".to_string(),
            }],
        };
        assert!(report.all_failed());
        assert_eq!(report.attempted(), 1);
    }
}
