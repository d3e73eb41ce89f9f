//! Error types for slideshow rendering and extraction.

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Errors raised while rendering a page in the headless browser.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The slide selector did not appear before the timeout.
    #[error(
        "page did not show slide images ('{selector}') within {timeout_secs}s\n  Suggestion: Retry, raise --page-timeout, or refresh the cookie export"
    )]
    PageLoadTimeout {
        /// The selector that was awaited.
        selector: String,
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// The browser could not be configured or started.
    #[error(
        "failed to launch browser: {0}\n  Suggestion: Install Chrome/Chromium or point --chrome at the executable"
    )]
    Launch(String),

    /// A DevTools protocol call failed.
    #[error("browser error: {0}")]
    Browser(#[from] CdpError),
}

/// Errors raised while building a [`super::SlideExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The slide selector is not valid CSS.
    #[error("invalid slide selector '{selector}': {reason}")]
    InvalidSelector {
        /// The rejected selector.
        selector: String,
        /// Parser message.
        reason: String,
    },
}
