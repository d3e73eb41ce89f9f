//! Slide image extraction from rendered HTML.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::error::ExtractError;

/// CSS selector of slide `<img>` elements on a rendered photo post.
pub const DEFAULT_SLIDE_SELECTOR: &str = ".css-brxox6-ImgPhotoSlide.e10jea832";

/// Attribute on the image's parent element holding the slide position.
pub const SLIDE_INDEX_ATTR: &str = "data-swiper-slide-index";

/// One image of a slideshow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideImage {
    /// Absolute image URL, query string included.
    pub source_url: String,
    /// Position within the slideshow.
    pub slide_index: u32,
}

impl SlideImage {
    /// Creates a slide image.
    #[must_use]
    pub fn new(source_url: impl Into<String>, slide_index: u32) -> Self {
        Self {
            source_url: source_url.into(),
            slide_index,
        }
    }
}

/// Pulls slide images out of a rendered page.
#[derive(Debug, Clone)]
pub struct SlideExtractor {
    selector: Selector,
    selector_text: String,
}

impl SlideExtractor {
    /// Builds an extractor for `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] when `selector` is not valid CSS.
    pub fn new(selector: &str) -> Result<Self, ExtractError> {
        let parsed = Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            selector: parsed,
            selector_text: selector.to_string(),
        })
    }

    /// Builds an extractor for [`DEFAULT_SLIDE_SELECTOR`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] if the built-in selector does
    /// not parse.
    pub fn with_default_selector() -> Result<Self, ExtractError> {
        Self::new(DEFAULT_SLIDE_SELECTOR)
    }

    /// The selector text this extractor matches.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector_text
    }

    /// Returns the slide images of `html` in document order, deduplicated.
    ///
    /// Matches without a `src`, without an element parent, or whose parent has
    /// no valid [`SLIDE_INDEX_ATTR`] are skipped. An empty result is valid.
    #[must_use]
    pub fn extract(&self, html: &str) -> Vec<SlideImage> {
        let document = Html::parse_document(html);
        let mut images = Vec::new();

        for img in document.select(&self.selector) {
            let Some(src) = img.value().attr("src") else {
                debug!("skipping slide without src");
                continue;
            };
            let Some(parent) = img.parent().and_then(ElementRef::wrap) else {
                debug!(src, "skipping slide without parent element");
                continue;
            };
            let Some(index) = parent
                .value()
                .attr(SLIDE_INDEX_ATTR)
                .and_then(|raw| raw.trim().parse::<u32>().ok())
            else {
                debug!(src, "skipping slide without valid index");
                continue;
            };
            images.push(SlideImage::new(src, index));
        }

        let images = dedup_slides(images);
        info!(count = images.len(), "Extracted slide images");
        images
    }
}

/// Removes repeated `(source_url, slide_index)` pairs, keeping first-seen order.
#[must_use]
pub fn dedup_slides(images: Vec<SlideImage>) -> Vec<SlideImage> {
    let mut seen = HashSet::new();
    images
        .into_iter()
        .filter(|image| seen.insert(image.clone()))
        .collect()
}
