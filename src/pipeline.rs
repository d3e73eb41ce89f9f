//! One end-to-end run: resolve, classify, then fetch images or the video.
//!
//! Every external effect goes through a trait object in [`Collaborators`], so a
//! run can be exercised end to end with stubs.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::auth::{CookieError, CookieJarFile, CookieRecord, to_browser_cookies};
use crate::classifier::{Classifier, ClassifyError, ContentKind};
use crate::download::{
    DownloadError, FetchReport, ImageDownloader, batch_progress, fetch_images, fetch_video,
};
use crate::resolver::{ContentReference, RedirectResolver, ResolveError, VideoIdResolver};
use crate::slideshow::{PageRenderer, RenderError, SlideExtractor};
use crate::ytdlp::{BackendError, MediaBackend};

/// External effects of a run.
#[derive(Clone)]
pub struct Collaborators {
    /// Follows short-link redirects.
    pub redirects: Arc<dyn RedirectResolver>,
    /// Probes metadata and downloads videos.
    pub backend: Arc<dyn MediaBackend>,
    /// Renders slideshow pages.
    pub renderer: Arc<dyn PageRenderer>,
    /// Downloads slide images.
    pub images: Arc<dyn ImageDownloader>,
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// The user-supplied link.
    pub link: String,
    /// JSON cookie export; the Netscape jar is derived next to it.
    pub cookies_path: PathBuf,
    /// Records loaded from `cookies_path`.
    pub cookie_records: Vec<CookieRecord>,
    /// Output directory, created when missing.
    pub output_dir: PathBuf,
    /// Show a progress bar for image batches.
    pub show_progress: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A slideshow batch ran; some images may have failed.
    Slideshow {
        /// Content ID.
        content_id: String,
        /// Images found on the page.
        found: usize,
        /// Per-image results.
        report: FetchReport,
    },
    /// A slideshow page had no slide images.
    NoImages {
        /// Content ID.
        content_id: String,
    },
    /// A video was downloaded.
    Video {
        /// Content ID.
        content_id: String,
        /// Saved file, when the backend reported it.
        path: Option<PathBuf>,
    },
}

impl RunOutcome {
    /// Content ID of the run.
    #[must_use]
    pub fn content_id(&self) -> &str {
        match self {
            Self::Slideshow { content_id, .. }
            | Self::NoImages { content_id }
            | Self::Video { content_id, .. } => content_id,
        }
    }
}

/// Fatal errors of a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Content ID resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Cookie jar generation failed.
    #[error(transparent)]
    Cookies(#[from] CookieError),

    /// Classification failed.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The slideshow page could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: DownloadError,
    },

    /// The video download failed.
    #[error("video download failed for {content_id}: {source}")]
    VideoFetch {
        /// Content ID.
        content_id: String,
        /// The backend failure.
        #[source]
        source: BackendError,
    },
}

/// Runs one download.
///
/// The Netscape cookie jar is written only when the metadata probe or the
/// video download needs it, so a photo link never touches it.
///
/// # Errors
///
/// Returns [`PipelineError`] for every fatal condition. Individual image
/// failures are not fatal and appear in [`RunOutcome::Slideshow`].
#[instrument(skip(request, collaborators, extractor), fields(link = %request.link))]
pub async fn run(
    request: &RunRequest,
    collaborators: &Collaborators,
    extractor: &SlideExtractor,
) -> Result<RunOutcome, PipelineError> {
    let resolver = VideoIdResolver::new(Arc::clone(&collaborators.redirects));
    let reference = resolver
        .resolve_reference(&ContentReference::new(request.link.clone()))
        .await?;
    info!(content_id = reference.content_id(), "Processing post");

    let cookie_jar = CookieJarFile::new(&request.cookies_path, request.cookie_records.clone());

    let classifier = Classifier::with_default_rules(Arc::clone(&collaborators.backend));
    match classifier.classify(reference.raw_url(), &cookie_jar).await {
        Ok(ContentKind::Slideshow) => {
            run_slideshow(request, collaborators, extractor, &reference).await
        }
        Ok(ContentKind::Video) => run_video(request, collaborators, &cookie_jar, &reference).await,
        Err(ClassifyError::Cookies(error)) => Err(PipelineError::Cookies(error)),
        Err(error) => Err(error.into()),
    }
}

async fn run_slideshow(
    request: &RunRequest,
    collaborators: &Collaborators,
    extractor: &SlideExtractor,
    reference: &ContentReference,
) -> Result<RunOutcome, PipelineError> {
    let content_id = reference.require_content_id()?.to_string();
    let cookies = to_browser_cookies(&request.cookie_records);
    let html = collaborators
        .renderer
        .render(reference.raw_url(), &cookies)
        .await?;

    let images = extractor.extract(&html);
    if images.is_empty() {
        warn!(content_id = %content_id, "No images found");
        return Ok(RunOutcome::NoImages { content_id });
    }

    let progress = batch_progress(images.len(), request.show_progress);
    let report = fetch_images(
        collaborators.images.as_ref(),
        &content_id,
        &images,
        &request.output_dir,
        &progress,
    )
    .await
    .map_err(|source| PipelineError::OutputDir {
        path: request.output_dir.clone(),
        source,
    })?;

    Ok(RunOutcome::Slideshow {
        content_id,
        found: images.len(),
        report,
    })
}

async fn run_video(
    request: &RunRequest,
    collaborators: &Collaborators,
    cookie_jar: &CookieJarFile,
    reference: &ContentReference,
) -> Result<RunOutcome, PipelineError> {
    let content_id = reference.require_content_id()?.to_string();
    let path = fetch_video(
        collaborators.backend.as_ref(),
        &content_id,
        reference.raw_url(),
        &request.output_dir,
        cookie_jar.path()?,
    )
    .await
    .map_err(|source| {
        warn!(content_id = %content_id, error = %source, "Video download failed");
        PipelineError::VideoFetch {
            content_id: content_id.clone(),
            source,
        }
    })?;

    Ok(RunOutcome::Video { content_id, path })
}
