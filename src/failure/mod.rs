//! Failure classification and user-facing What/Why/Fix descriptors.
//!
//! Fatal run errors map to a descriptor by type. Per-image failures only carry
//! a message, so they are classified from the message text.

use crate::classifier::ClassifyError;
use crate::download::DownloadError;
use crate::pipeline::PipelineError;
use crate::resolver::ResolveError;
use crate::slideshow::RenderError;
use crate::ytdlp::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Auth,
    InputSource,
    Network,
    Tooling,
    Other,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Auth => "🔐",
            Self::InputSource => "❌",
            Self::Network => "🌐",
            Self::Tooling => "🧰",
            Self::Other => "⚠️",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication",
            Self::InputSource => "Input/Source",
            Self::Network => "Network",
            Self::Tooling => "External tool",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

const NOT_A_TARGET: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::InputSource,
    what: "Not a TikTok link",
    why: "The link has no content ID and does not point at tiktok.com.",
    fix: "Pass a tiktok.com post link or a vm.tiktok.com share link.",
};

const UNRESOLVABLE: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::InputSource,
    what: "Content ID not found",
    why: "The share link did not redirect to a post URL with a 19-digit ID.",
    fix: "Open the link in a browser and pass the full post URL instead.",
};

const REDIRECT_FAILED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Network,
    what: "Share link could not be followed",
    why: "The request that resolves the short link failed before reaching a post URL.",
    fix: "Check connectivity/VPN settings, then retry.",
};

const COOKIES: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Auth,
    what: "Cookie file unusable",
    why: "The JSON cookie export could not be read, or its Netscape jar could not be written.",
    fix: "Re-export cookies as JSON and make sure its directory is writable.",
};

const PROBE_FAILED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Tooling,
    what: "Metadata probe failed",
    why: "yt-dlp could not read the post, so video and slideshow cannot be told apart.",
    fix: "Update yt-dlp, refresh the cookie export, and retry.",
};

const UNDETERMINED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::InputSource,
    what: "Link is neither a video nor a slideshow",
    why: "No classification rule recognized the post.",
    fix: "Verify the link points at a single post.",
};

const PAGE_TIMEOUT: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Network,
    what: "Slideshow page did not load",
    why: "The slide images never appeared, usually because of a captcha, a login wall or a slow page.",
    fix: "Refresh the cookie export, raise --page-timeout, or retry later.",
};

const BROWSER_FAILED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Tooling,
    what: "Headless browser failed",
    why: "Chrome/Chromium could not be started or stopped responding.",
    fix: "Install Chrome/Chromium or point --chrome at the executable.",
};

const OUTPUT_DIR: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Other,
    what: "Output directory unavailable",
    why: "The output directory could not be created.",
    fix: "Choose a writable --output directory.",
};

const YTDLP_MISSING: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Tooling,
    what: "yt-dlp not available",
    why: "The yt-dlp executable could not be started.",
    fix: "Install yt-dlp or point --yt-dlp (SLIDEGRAB_YTDLP) at the executable.",
};

const VIDEO_FAILED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Tooling,
    what: "Video download failed",
    why: "yt-dlp exited with an error while downloading the video.",
    fix: "Update yt-dlp, refresh the cookie export, and retry.",
};

/// Returns the descriptor for a fatal run error.
#[must_use]
pub fn describe(error: &PipelineError) -> FailureDescriptor {
    match error {
        PipelineError::Resolve(ResolveError::NotATargetUrl { .. }) => NOT_A_TARGET,
        PipelineError::Resolve(ResolveError::UnresolvableUrl { .. }) => UNRESOLVABLE,
        PipelineError::Resolve(ResolveError::Redirect { source, .. }) => {
            match download_descriptor(source) {
                Some(descriptor) if descriptor.category == FailureCategory::Auth => descriptor,
                _ => REDIRECT_FAILED,
            }
        }
        PipelineError::Cookies(_) | PipelineError::Classify(ClassifyError::Cookies(_)) => COOKIES,
        PipelineError::Classify(ClassifyError::MetadataProbe { source, .. }) => {
            backend_descriptor(source, PROBE_FAILED)
        }
        PipelineError::Classify(ClassifyError::Undetermined { .. }) => UNDETERMINED,
        PipelineError::Render(RenderError::PageLoadTimeout { .. }) => PAGE_TIMEOUT,
        PipelineError::Render(RenderError::Launch(_) | RenderError::Browser(_)) => BROWSER_FAILED,
        PipelineError::OutputDir { .. } => OUTPUT_DIR,
        PipelineError::VideoFetch { source, .. } => backend_descriptor(source, VIDEO_FAILED),
    }
}

fn backend_descriptor(error: &BackendError, fallback: FailureDescriptor) -> FailureDescriptor {
    match error {
        BackendError::Spawn { .. } => YTDLP_MISSING,
        BackendError::Timeout { .. } => FailureDescriptor {
            category: FailureCategory::Network,
            what: "yt-dlp timed out",
            why: "yt-dlp did not finish within its time limit.",
            fix: "Check connectivity/VPN settings, then retry.",
        },
        BackendError::Failed { .. } | BackendError::InvalidMetadata { .. } => fallback,
    }
}

fn download_descriptor(error: &DownloadError) -> Option<FailureDescriptor> {
    match error {
        DownloadError::AuthRequired { status, .. } => Some(auth_descriptor(*status)),
        _ => None,
    }
}

fn auth_descriptor(status: u16) -> FailureDescriptor {
    if status == 407 {
        FailureDescriptor {
            category: FailureCategory::Auth,
            what: "Proxy authentication required",
            why: "The proxy rejected this request until valid proxy credentials are provided.",
            fix: "Configure your HTTP proxy settings or check proxy credentials.",
        }
    } else {
        FailureDescriptor {
            category: FailureCategory::Auth,
            what: "Authentication required",
            why: "The platform rejected the session cookies.",
            fix: "Export fresh cookies from a logged-in browser and pass them with --cookies.",
        }
    }
}

/// Classifies a per-image failure message into a category and descriptor.
#[must_use]
pub fn classify_failure(error: &str) -> FailureDescriptor {
    if error.starts_with("[AUTH]") {
        auth_descriptor(if error.contains("(HTTP 407)") { 407 } else { 403 })
    } else if error.contains("HTTP 404") {
        FailureDescriptor {
            category: FailureCategory::InputSource,
            what: "Image not found",
            why: "The image URL returned HTTP 404, which usually means its signature expired.",
            fix: "Rerun to fetch fresh image URLs.",
        }
    } else if error.contains("timeout") {
        FailureDescriptor {
            category: FailureCategory::Network,
            what: "Download timed out",
            why: "The remote host did not respond within the request timeout window.",
            fix: "Check network stability before retrying.",
        }
    } else if error.contains("network error") {
        FailureDescriptor {
            category: FailureCategory::Network,
            what: "Network request failed",
            why: "Connectivity, DNS, TLS, or VPN conditions interrupted the request.",
            fix: "Check connectivity/VPN settings, then retry.",
        }
    } else if error.contains("IO error") {
        FailureDescriptor {
            category: FailureCategory::Other,
            what: "File could not be written",
            why: "The image could not be saved to the output directory.",
            fix: "Check free disk space and permissions of the output directory.",
        }
    } else {
        FailureDescriptor {
            category: FailureCategory::Other,
            what: "Unhandled failure",
            why: "The error did not match a known category and needs closer inspection.",
            fix: "Inspect logs (-vv) and rerun.",
        }
    }
}

/// Extracts the domain from an `[AUTH]`-prefixed error string.
///
/// Expected format: `[AUTH] authentication required for {domain} (HTTP ...`
#[must_use]
pub fn extract_auth_domain(error: &str) -> Option<String> {
    let after_prefix = error.strip_prefix("[AUTH] authentication required for ")?;
    let end = after_prefix.find(" (HTTP")?;
    Some(after_prefix[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CookieError;
    use std::path::PathBuf;

    fn backend_failed() -> BackendError {
        BackendError::Failed {
            binary: PathBuf::from("yt-dlp"),
            url: "https://www.tiktok.com/@a/video/1".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "ERROR".to_string(),
        }
    }

    #[test]
    fn test_describe_not_a_target() {
        let error = PipelineError::from(ResolveError::not_a_target_url("https://example.com"));
        let d = describe(&error);
        assert_eq!(d.category, FailureCategory::InputSource);
        assert!(d.what.contains("Not a TikTok link"));
    }

    #[test]
    fn test_describe_redirect_auth_is_auth() {
        let source = DownloadError::auth_required("https://vm.tiktok.com/x", 403, "vm.tiktok.com");
        let error = PipelineError::from(ResolveError::redirect("https://vm.tiktok.com/x", source));
        assert_eq!(describe(&error).category, FailureCategory::Auth);
    }

    #[test]
    fn test_describe_redirect_network_is_network() {
        let source = DownloadError::timeout("https://vm.tiktok.com/x");
        let error = PipelineError::from(ResolveError::redirect("https://vm.tiktok.com/x", source));
        assert_eq!(describe(&error), REDIRECT_FAILED);
    }

    #[test]
    fn test_describe_jar_failure_during_classification_is_cookies() {
        let error = PipelineError::from(ClassifyError::Cookies(CookieError::io(
            "/proc/cookies.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        )));
        assert_eq!(describe(&error), COOKIES);
    }

    #[test]
    fn test_describe_metadata_failure() {
        let error = PipelineError::from(ClassifyError::MetadataProbe {
            url: "u".to_string(),
            source: backend_failed(),
        });
        assert_eq!(describe(&error), PROBE_FAILED);
    }

    #[test]
    fn test_describe_missing_ytdlp() {
        let error = PipelineError::VideoFetch {
            content_id: "1".to_string(),
            source: BackendError::Spawn {
                binary: PathBuf::from("yt-dlp"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            },
        };
        let d = describe(&error);
        assert_eq!(d.category, FailureCategory::Tooling);
        assert!(d.fix.contains("--yt-dlp"));
    }

    #[test]
    fn test_describe_video_failure() {
        let error = PipelineError::VideoFetch {
            content_id: "1".to_string(),
            source: backend_failed(),
        };
        assert_eq!(describe(&error), VIDEO_FAILED);
    }

    #[test]
    fn test_describe_page_timeout() {
        let error = PipelineError::from(RenderError::PageLoadTimeout {
            selector: ".x".to_string(),
            timeout_secs: 10,
        });
        let d = describe(&error);
        assert!(d.fix.contains("--page-timeout"));
    }

    #[test]
    fn test_classify_failure_auth() {
        let d = classify_failure("[AUTH] authentication required for p16.tiktokcdn.com (HTTP 403)");
        assert_eq!(d.category, FailureCategory::Auth);
        assert!(d.what.contains("Authentication"));
    }

    #[test]
    fn test_classify_failure_404() {
        let d = classify_failure("HTTP 404 downloading https://cdn/a.jpg");
        assert_eq!(d.category, FailureCategory::InputSource);
        assert!(d.what.contains("not found"));
    }

    #[test]
    fn test_classify_failure_timeout() {
        let d = classify_failure("timeout downloading https://cdn/a.jpg");
        assert_eq!(d.category, FailureCategory::Network);
    }

    #[test]
    fn test_classify_failure_other() {
        let d = classify_failure("HTTP 500 downloading https://cdn/a.jpg");
        assert_eq!(d.category, FailureCategory::Other);
    }

    #[test]
    fn test_extract_auth_domain_valid() {
        let msg = "[AUTH] authentication required for p16.tiktokcdn.com (HTTP 403)";
        assert_eq!(extract_auth_domain(msg).as_deref(), Some("p16.tiktokcdn.com"));
    }

    #[test]
    fn test_extract_auth_domain_non_auth_returns_none() {
        assert_eq!(extract_auth_domain("HTTP 404 not found"), None);
    }
}
