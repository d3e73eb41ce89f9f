//! Slideshow page rendering and slide image extraction.
//!
//! Photo posts only carry their image URLs after client-side rendering, so the
//! page is loaded in a headless browser ([`ChromeRenderer`]) and the resulting
//! HTML is queried by [`SlideExtractor`].

mod browser;
mod error;
mod extract;

pub use browser::{ChromeRenderer, DEFAULT_PAGE_TIMEOUT_SECS, PLATFORM_HOME_URL, PageRenderer};
pub use error::{ExtractError, RenderError};
pub use extract::{
    DEFAULT_SLIDE_SELECTOR, SLIDE_INDEX_ATTR, SlideExtractor, SlideImage, dedup_slides,
};
