//! In-memory `reqwest` cookie jar built from cookie records.
//!
//! The HTTP client uses this jar for the short-link redirect request and for
//! slide image downloads so both run with the same session as the browser.

use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, instrument, warn};

use super::CookieRecord;

/// Loads cookie records into a `reqwest::cookie::Jar`.
///
/// Each record is converted to a `Set-Cookie` header string and added with an
/// origin URL built from its domain, so the jar's own domain matching applies.
///
/// # Returns
///
/// An `Arc<Jar>` suitable for `reqwest::ClientBuilder::cookie_provider()`.
#[instrument(level = "debug", skip(records))]
pub fn load_cookies_into_jar(records: &[CookieRecord]) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());

    for record in records {
        if record.name.is_empty() || record.domain.is_empty() {
            warn!(
                name = %record.name,
                domain = %record.domain,
                "skipping cookie without name or domain for HTTP jar"
            );
            continue;
        }

        let set_cookie = build_set_cookie_string(record);
        if let Ok(url) = build_origin_url(record).parse::<url::Url>() {
            jar.add_cookie_str(&set_cookie, &url);
            debug!(domain = %record.domain, name = %record.name, "loaded cookie into jar");
        } else {
            warn!(
                domain = %record.domain,
                name = %record.name,
                "skipping cookie with unparseable domain"
            );
        }
    }

    jar
}

/// Builds a `Set-Cookie` header string from a record.
fn build_set_cookie_string(record: &CookieRecord) -> String {
    let mut parts = vec![
        format!("{}={}", record.name, record.value()),
        format!("Domain={}", record.domain),
        format!("Path={}", record.path),
    ];

    if record.secure {
        parts.push("Secure".to_string());
    }

    // 0 = session cookie, no Expires attribute
    let expires = record.expiry_secs();
    if expires > 0 {
        if let Some(expires_str) = unix_to_http_date(expires) {
            parts.push(format!("Expires={expires_str}"));
        } else {
            warn!(
                domain = %record.domain,
                name = %record.name,
                expires,
                "cookie expiry timestamp overflows SystemTime; treating as session cookie"
            );
        }
    }

    parts.join("; ")
}

/// Origin URL for `Jar::add_cookie_str`: `https` for secure cookies, leading
/// dot stripped from the domain.
fn build_origin_url(record: &CookieRecord) -> String {
    let scheme = if record.secure { "https" } else { "http" };
    let domain = record.domain.strip_prefix('.').unwrap_or(&record.domain);
    format!("{scheme}://{domain}{}", record.path)
}

fn unix_to_http_date(timestamp: u64) -> Option<String> {
    use std::time::{Duration, UNIX_EPOCH};

    let time = UNIX_EPOCH.checked_add(Duration::from_secs(timestamp))?;
    Some(httpdate::fmt_http_date(time))
}
