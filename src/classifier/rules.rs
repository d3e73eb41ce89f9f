//! Built-in classification rules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{ClassificationRule, ClassifyError, ContentKind, RulePriority};
use crate::auth::CookieJarFile;
use crate::ytdlp::MediaBackend;

/// Path segment that marks a photo post.
const SLIDESHOW_SEGMENT: &str = "photo";

/// Links with a `photo` path segment are slideshows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideshowPathRule;

impl SlideshowPathRule {
    fn matches(url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed
                .path_segments()
                .is_some_and(|mut segments| segments.any(|s| s == SLIDESHOW_SEGMENT)),
            Err(_) => url.contains(&format!("/{SLIDESHOW_SEGMENT}/")),
        }
    }
}

#[async_trait]
impl ClassificationRule for SlideshowPathRule {
    fn name(&self) -> &'static str {
        "slideshow-path"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::UrlShape
    }

    async fn evaluate(
        &self,
        url: &str,
        _cookie_jar: &CookieJarFile,
    ) -> Result<Option<ContentKind>, ClassifyError> {
        Ok(Self::matches(url).then_some(ContentKind::Slideshow))
    }
}

/// Probes metadata; posts whose best format is audio-only are slideshows
/// served under a video URL.
#[derive(Clone)]
pub struct AudioOnlyProbeRule {
    backend: Arc<dyn MediaBackend>,
}

impl AudioOnlyProbeRule {
    /// Creates the rule around a media backend.
    #[must_use]
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ClassificationRule for AudioOnlyProbeRule {
    fn name(&self) -> &'static str {
        "audio-only-probe"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::MetadataProbe
    }

    async fn evaluate(
        &self,
        url: &str,
        cookie_jar: &CookieJarFile,
    ) -> Result<Option<ContentKind>, ClassifyError> {
        let jar_path = cookie_jar.path()?;
        let metadata = self.backend.probe(url, jar_path).await.map_err(|source| {
            ClassifyError::MetadataProbe {
                url: url.to_string(),
                source,
            }
        })?;
        debug!(resolution = ?metadata.resolution, "probe result");
        Ok(Some(if metadata.is_audio_only() {
            ContentKind::Slideshow
        } else {
            ContentKind::Video
        }))
    }
}
