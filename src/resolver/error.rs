//! Error types for content ID resolution.

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that can occur while turning a link into a content ID.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The link does not belong to the supported platform.
    #[error("not a TikTok URL: '{url}'\n  Suggestion: Pass a tiktok.com video or photo link")]
    NotATargetUrl {
        /// The rejected input.
        url: String,
    },

    /// No 19-digit content ID was found, even after following redirects.
    #[error(
        "no content ID found in '{url}' (resolved to '{resolved_url}')\n  Suggestion: Open the link in a browser and copy the full post URL"
    )]
    UnresolvableUrl {
        /// The input link.
        url: String,
        /// Where the redirect request ended up.
        resolved_url: String,
    },

    /// The single redirect-follow request failed.
    #[error("failed to follow redirects for '{url}': {source}")]
    Redirect {
        /// The input link.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: DownloadError,
    },
}

impl ResolveError {
    /// Creates a `NotATargetUrl` error.
    #[must_use]
    pub fn not_a_target_url(url: &str) -> Self {
        Self::NotATargetUrl {
            url: url.to_string(),
        }
    }

    /// Creates an `UnresolvableUrl` error.
    #[must_use]
    pub fn unresolvable(url: &str, resolved_url: &str) -> Self {
        Self::UnresolvableUrl {
            url: url.to_string(),
            resolved_url: resolved_url.to_string(),
        }
    }

    /// Creates a `Redirect` error.
    #[must_use]
    pub fn redirect(url: &str, source: DownloadError) -> Self {
        Self::Redirect {
            url: url.to_string(),
            source,
        }
    }
}
