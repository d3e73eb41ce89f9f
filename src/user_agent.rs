//! Shared User-Agent string for HTTP traffic.
//!
//! The platform's CDN rejects requests that identify as a tool, so redirect
//! resolution and image downloads present the same desktop browser UA as the
//! headless browser session.

/// Desktop Chrome User-Agent sent with every HTTP request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// User-Agent for the HTTP client.
#[must_use]
pub(crate) fn default_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_is_browser_like() {
        let ua = default_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"), "unexpected UA: {ua}");
        assert!(ua.contains("Chrome/"));
        assert!(!ua.contains("slidegrab"), "UA must not identify the tool: {ua}");
    }
}
