//! JSON cookie export loading.
//!
//! Browser extensions export cookies as a JSON array of objects carrying
//! `name`, `value`, `domain`, `path`, `secure` and `expirationDate`. The
//! records are loaded once per run and never mutated afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// A single cookie from a JSON cookie export.
///
/// Fields the adapter does not use are kept in [`CookieRecord::extra`] so the
/// record round-trips unchanged. The value is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct CookieRecord {
    /// Cookie name.
    #[serde(default)]
    pub name: String,
    /// Cookie value. Never logged.
    #[serde(default)]
    value: String,
    /// The domain the cookie belongs to (e.g., `.tiktok.com`).
    #[serde(default)]
    pub domain: String,
    /// The URL path scope, `/` when the export omits it.
    #[serde(default = "default_path")]
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Unix timestamp (possibly fractional) for expiry; absent for session cookies.
    #[serde(rename = "expirationDate", default)]
    pub expiration_date: Option<f64>,
    /// Remaining export fields (`hostOnly`, `sameSite`, `storeId`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    /// Creates a record with no expiry and no extra fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        secure: bool,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            secure,
            expiration_date: None,
            extra: Map::new(),
        }
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub fn with_expiration(mut self, expiration_date: f64) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    /// Returns the cookie value.
    ///
    /// Do not log the returned value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry in whole seconds, `0` for session cookies.
    #[must_use]
    pub fn expiry_secs(&self) -> u64 {
        self.expiration_date.map_or(0, normalized_expiry)
    }

    /// Whether the cookie also applies to subdomains (leading dot).
    #[must_use]
    pub fn includes_subdomains(&self) -> bool {
        self.domain.starts_with('.')
    }
}

impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expiration_date", &self.expiration_date)
            .finish_non_exhaustive()
    }
}

/// Cookie in the shape a browser session accepts for injection.
#[derive(Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value. Never logged.
    pub value: String,
    /// Domain the browser should attach the cookie to.
    pub domain: String,
    /// Path scope.
    pub path: String,
    /// HTTPS-only flag.
    pub secure: bool,
}

impl fmt::Debug for BrowserCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Errors that can occur while loading or adapting cookies.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The cookie file could not be read or the jar could not be written.
    #[error("cookie file I/O failed for {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cookie file is not a JSON cookie export.
    #[error("invalid cookie JSON in {path}: {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl CookieError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonCookiePayload {
    Array(Vec<CookieRecord>),
    Wrapped { cookies: Vec<CookieRecord> },
}

/// Loads cookie records from a JSON export file.
///
/// Accepts a bare array or an object with a `cookies` array.
///
/// # Errors
///
/// Returns [`CookieError::Io`] when the file cannot be read and
/// [`CookieError::Json`] when it is not a cookie export.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn load_cookie_records(path: &Path) -> Result<Vec<CookieRecord>, CookieError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CookieError::io(path, e))?;
    parse_cookie_records(&raw).map_err(|source| CookieError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses cookie records from JSON text.
///
/// # Errors
///
/// Returns the JSON error when the text is not a cookie export.
pub fn parse_cookie_records(input: &str) -> Result<Vec<CookieRecord>, serde_json::Error> {
    let records = match serde_json::from_str::<JsonCookiePayload>(input)? {
        JsonCookiePayload::Array(records) => records,
        JsonCookiePayload::Wrapped { cookies } => cookies,
    };
    debug!(count = records.len(), "parsed cookie records");
    Ok(records)
}

/// Converts records into cookies for browser session injection.
///
/// Records without a name or domain cannot be set on a page and are skipped.
#[must_use]
pub fn to_browser_cookies(records: &[CookieRecord]) -> Vec<BrowserCookie> {
    records
        .iter()
        .filter_map(|record| {
            if record.name.trim().is_empty() || record.domain.trim().is_empty() {
                warn!(
                    name = %record.name,
                    domain = %record.domain,
                    "skipping cookie without name or domain for browser session"
                );
                return None;
            }
            Some(BrowserCookie {
                name: record.name.clone(),
                value: record.value.clone(),
                domain: record.domain.clone(),
                path: record.path.clone(),
                secure: record.secure,
            })
        })
        .collect()
}

fn normalized_expiry(raw_expiry: f64) -> u64 {
    if !raw_expiry.is_finite() || raw_expiry <= 0.0 {
        return 0;
    }

    let truncated = raw_expiry.trunc();
    let integer_text = format!("{truncated:.0}");
    // Overflow → far-future; only reachable past u64::MAX seconds.
    integer_text.parse::<u64>().unwrap_or(u64::MAX)
}
