//! Content ID resolution for share links.
//!
//! Full post URLs carry the 19-digit content ID in their path and resolve with
//! no network traffic. Short share links (`vm.tiktok.com/...`) are followed
//! through one redirect request and the final URL is matched again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use slidegrab_core::{HttpClient, VideoIdResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = VideoIdResolver::new(Arc::new(HttpClient::new(None)?));
//! let id = resolver.resolve("https://vm.tiktok.com/ZMabc123/").await?;
//! println!("content id: {id}");
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ResolveError;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::download::DownloadError;

/// Token a link must contain before any network request is made for it.
pub const PLATFORM_TOKEN: &str = "tiktok";

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static CONTENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"tiktok\.com/.*/(\d{19})(?:\?.*)?"));

/// Follows HTTP redirects and reports where they end.
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Performs one GET with redirect following and returns the final URL.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure.
    async fn final_url(&self, url: &str) -> Result<String, DownloadError>;
}

/// A user-supplied link and, once resolved, its content ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    raw_url: String,
    content_id: Option<String>,
}

impl ContentReference {
    /// Wraps an unresolved link.
    #[must_use]
    pub fn new(raw_url: impl Into<String>) -> Self {
        Self {
            raw_url: raw_url.into(),
            content_id: None,
        }
    }

    /// The link as given by the user.
    #[must_use]
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// The 19-digit content ID, if resolved.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// The content ID, or [`ResolveError::UnresolvableUrl`] while unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnresolvableUrl`] when no ID has been set.
    pub fn require_content_id(&self) -> Result<&str, ResolveError> {
        self.content_id()
            .ok_or_else(|| ResolveError::unresolvable(&self.raw_url, &self.raw_url))
    }

    /// Returns a resolved copy carrying `content_id`.
    #[must_use]
    pub fn with_content_id(&self, content_id: impl Into<String>) -> Self {
        Self {
            raw_url: self.raw_url.clone(),
            content_id: Some(content_id.into()),
        }
    }
}

/// Extracts the 19-digit content ID from a full post URL.
#[must_use]
pub fn extract_content_id(url: &str) -> Option<String> {
    CONTENT_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolves links to content IDs, following redirects for short links.
#[derive(Clone)]
pub struct VideoIdResolver {
    redirects: Arc<dyn RedirectResolver>,
}

impl VideoIdResolver {
    /// Creates a resolver that uses `redirects` for short links.
    #[must_use]
    pub fn new(redirects: Arc<dyn RedirectResolver>) -> Self {
        Self { redirects }
    }

    /// Returns the content ID for `url`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotATargetUrl`] when the link does not match and does
    ///   not mention the platform; no request is made.
    /// - [`ResolveError::Redirect`] when the redirect request fails.
    /// - [`ResolveError::UnresolvableUrl`] when the final URL carries no ID.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn resolve(&self, url: &str) -> Result<String, ResolveError> {
        if let Some(id) = extract_content_id(url) {
            debug!(content_id = %id, "content ID found in link");
            return Ok(id);
        }

        if !url.contains(PLATFORM_TOKEN) {
            return Err(ResolveError::not_a_target_url(url));
        }

        let final_url = self
            .redirects
            .final_url(url)
            .await
            .map_err(|source| ResolveError::redirect(url, source))?;
        debug!(final_url = %final_url, "short link resolved");

        let id = extract_content_id(&final_url)
            .ok_or_else(|| ResolveError::unresolvable(url, &final_url))?;
        info!(content_id = %id, "Resolved content ID");
        Ok(id)
    }

    /// Resolves a [`ContentReference`], returning a copy with the ID set.
    ///
    /// An already-resolved reference is returned as is.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn resolve_reference(
        &self,
        reference: &ContentReference,
    ) -> Result<ContentReference, ResolveError> {
        if reference.content_id().is_some() {
            return Ok(reference.clone());
        }
        let id = self.resolve(reference.raw_url()).await?;
        Ok(reference.with_content_id(id))
    }
}

impl std::fmt::Debug for VideoIdResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoIdResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRedirect {
        target: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl FixedRedirect {
        fn to(target: &str) -> Arc<Self> {
            Arc::new(Self {
                target: Ok(target.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                target: Err(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RedirectResolver for FixedRedirect {
        async fn final_url(&self, url: &str) -> Result<String, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.target
                .clone()
                .map_err(|status| DownloadError::http_status(url, status))
        }
    }

    const FULL_URL: &str = "https://www.tiktok.com/@someone/video/7301234567890123456?is_from_webapp=1";

    #[test]
    fn test_extract_content_id_full_url() {
        assert_eq!(
            extract_content_id(FULL_URL).as_deref(),
            Some("7301234567890123456")
        );
        assert_eq!(
            extract_content_id("https://www.tiktok.com/@a/photo/7301234567890123456").as_deref(),
            Some("7301234567890123456")
        );
    }

    #[test]
    fn test_extract_content_id_rejects_short_ids() {
        assert_eq!(
            extract_content_id("https://www.tiktok.com/@a/video/123456789"),
            None
        );
        assert_eq!(extract_content_id("https://vm.tiktok.com/ZMabc123/"), None);
    }

    #[tokio::test]
    async fn test_resolve_full_url_makes_no_request() {
        let redirects = FixedRedirect::to("unused");
        let resolver = VideoIdResolver::new(redirects.clone());

        let id = resolver.resolve(FULL_URL).await.unwrap();

        assert_eq!(id, "7301234567890123456");
        assert_eq!(redirects.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_foreign_url_fails_before_network() {
        let redirects = FixedRedirect::to("unused");
        let resolver = VideoIdResolver::new(redirects.clone());

        let result = resolver.resolve("https://example.com/watch?v=1").await;

        assert!(matches!(result, Err(ResolveError::NotATargetUrl { .. })));
        assert_eq!(redirects.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_short_link_follows_redirect_once() {
        let redirects =
            FixedRedirect::to("https://www.tiktok.com/@a/photo/7301234567890123456?lang=en");
        let resolver = VideoIdResolver::new(redirects.clone());

        let id = resolver
            .resolve("https://vm.tiktok.com/ZMabc123/")
            .await
            .unwrap();

        assert_eq!(id, "7301234567890123456");
        assert_eq!(redirects.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_short_link_without_id_is_unresolvable() {
        let redirects = FixedRedirect::to("https://www.tiktok.com/login");
        let resolver = VideoIdResolver::new(redirects.clone());

        let result = resolver.resolve("https://vm.tiktok.com/ZMabc123/").await;

        match result {
            Err(ResolveError::UnresolvableUrl { resolved_url, .. }) => {
                assert_eq!(resolved_url, "https://www.tiktok.com/login");
            }
            other => panic!("Expected UnresolvableUrl, got: {other:?}"),
        }
        assert_eq!(redirects.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_redirect_failure_is_not_retried() {
        let redirects = FixedRedirect::failing(503);
        let resolver = VideoIdResolver::new(redirects.clone());

        let result = resolver.resolve("https://vm.tiktok.com/ZMabc123/").await;

        assert!(matches!(result, Err(ResolveError::Redirect { .. })));
        assert_eq!(redirects.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_reference_sets_id_without_mutating_input() {
        let resolver = VideoIdResolver::new(FixedRedirect::to("unused"));
        let reference = ContentReference::new(FULL_URL);

        let resolved = resolver.resolve_reference(&reference).await.unwrap();

        assert_eq!(reference.content_id(), None);
        assert_eq!(resolved.content_id(), Some("7301234567890123456"));
        assert_eq!(resolved.raw_url(), FULL_URL);
    }

    #[test]
    fn test_require_content_id_unresolved_is_error() {
        let reference = ContentReference::new("https://vm.tiktok.com/ZMabc123/");
        assert!(matches!(
            reference.require_content_id(),
            Err(ResolveError::UnresolvableUrl { .. })
        ));
        let resolved = reference.with_content_id("7301234567890123456");
        assert_eq!(resolved.require_content_id().unwrap(), "7301234567890123456");
    }
}
