//! Slidegrab Core Library
//!
//! Resolves a TikTok share link to its 19-digit content ID, decides whether the
//! post is a video or a photo slideshow, and saves the media to disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - JSON cookie export loading and the derived cookie formats
//! - [`resolver`] - Content ID extraction and short-link resolution
//! - [`classifier`] - Priority-ordered video/slideshow classification rules
//! - [`slideshow`] - Slide image extraction and headless page rendering
//! - [`ytdlp`] - Metadata probe and video download through `yt-dlp`
//! - [`download`] - Streamed image downloads and deterministic file naming
//! - [`pipeline`] - One end-to-end run wiring the pieces together
//! - [`failure`] - User-facing What/Why/Fix descriptors for fatal errors

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod classifier;
pub mod config;
pub mod download;
pub mod failure;
pub mod pipeline;
pub mod resolver;
pub mod slideshow;
pub mod ytdlp;

mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use auth::{
    BrowserCookie, CookieError, CookieJarFile, CookieRecord, ensure_cookie_jar, load_cookie_records,
};
pub use classifier::{ClassifyError, Classifier, ContentKind};
pub use config::RunConfig;
pub use download::{DownloadError, FetchReport, HttpClient, ImageDownloader};
pub use pipeline::{Collaborators, PipelineError, RunOutcome, RunRequest, run};
pub use resolver::{ContentReference, RedirectResolver, ResolveError, VideoIdResolver};
pub use slideshow::{
    ChromeRenderer, ExtractError, PageRenderer, RenderError, SlideExtractor, SlideImage,
};
pub use ytdlp::{BackendError, MediaBackend, VideoMetadata, YtDlp};
