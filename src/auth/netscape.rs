//! Netscape cookie-jar file generation.
//!
//! `yt-dlp` reads cookies from the Netscape HTTP cookie file format: seven
//! TAB-separated fields per line (`domain`, `subdomains`, `path`, `secure`,
//! `expiry`, `name`, `value`). The jar lives next to the JSON export and acts as
//! a cache keyed on file presence: once it exists it is never rewritten.

use std::fmt::Write as _;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, instrument, warn};

use super::{CookieError, CookieRecord};

/// Header written at the top of every generated jar.
pub const NETSCAPE_HEADER: &str =
    "# Netscape HTTP Cookie File\n# This file is generated by a script\n\n";

/// Path of the jar derived from a JSON cookie export (same stem, `.txt`).
#[must_use]
pub fn cookie_jar_path(json_path: &Path) -> PathBuf {
    json_path.with_extension("txt")
}

/// Renders cookie records in Netscape format, header included.
///
/// Records whose fields contain a TAB or line break would corrupt the line
/// layout and are skipped.
#[must_use]
pub fn render_netscape(records: &[CookieRecord]) -> String {
    let mut out = String::from(NETSCAPE_HEADER);
    for record in records {
        if !fits_netscape_line(record) {
            warn!(name = %record.name, domain = %record.domain, "skipping cookie with TAB or line break");
            continue;
        }
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.domain,
            netscape_bool(record.includes_subdomains()),
            record.path,
            netscape_bool(record.secure),
            record.expiry_secs(),
            record.name,
            record.value(),
        );
    }
    out
}

fn netscape_bool(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

fn fits_netscape_line(record: &CookieRecord) -> bool {
    [
        record.domain.as_str(),
        record.path.as_str(),
        record.name.as_str(),
        record.value(),
    ]
    .iter()
    .all(|field| !field.contains(['\t', '\n', '\r']))
}

/// The Netscape jar of one JSON export, written on first use.
///
/// Only the metadata probe and the video download read the jar, so runs that
/// never reach them leave the filesystem untouched.
#[derive(Debug)]
pub struct CookieJarFile {
    json_path: PathBuf,
    records: Vec<CookieRecord>,
    path: OnceLock<PathBuf>,
}

impl CookieJarFile {
    /// Creates a handle for the jar derived from `json_path`. Nothing is written.
    #[must_use]
    pub fn new(json_path: impl Into<PathBuf>, records: Vec<CookieRecord>) -> Self {
        Self {
            json_path: json_path.into(),
            records,
            path: OnceLock::new(),
        }
    }

    /// Returns the jar path, writing the jar through [`ensure_cookie_jar`] on
    /// the first call.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Io`] when the jar cannot be created or written.
    pub fn path(&self) -> Result<&Path, CookieError> {
        if let Some(path) = self.path.get() {
            return Ok(path);
        }
        let path = ensure_cookie_jar(&self.json_path, &self.records)?;
        Ok(self.path.get_or_init(|| path))
    }

    /// True once [`path`](Self::path) has succeeded.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.path.get().is_some()
    }
}

/// Returns the Netscape jar for `json_path`, writing it from `records` only
/// when no jar exists yet.
///
/// An existing jar is returned untouched regardless of the JSON file's age.
///
/// # Errors
///
/// Returns [`CookieError::Io`] when the jar cannot be created or written.
#[instrument(level = "debug", skip(records), fields(json = %json_path.display()))]
pub fn ensure_cookie_jar(
    json_path: &Path,
    records: &[CookieRecord],
) -> Result<PathBuf, CookieError> {
    let jar_path = cookie_jar_path(json_path);
    if jar_path.exists() {
        info!(path = %jar_path.display(), "Netscape cookies found");
        return Ok(jar_path);
    }

    let file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&jar_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %jar_path.display(), "cookie jar appeared concurrently, reusing");
            return Ok(jar_path);
        }
        Err(err) => return Err(CookieError::io(&jar_path, err)),
    };

    let write_result = {
        let mut writer = BufWriter::new(file);
        writer
            .write_all(render_netscape(records).as_bytes())
            .and_then(|()| writer.flush())
    };
    if let Err(err) = write_result {
        // A half-written jar would be treated as a valid cache on the next run.
        let _ = fs::remove_file(&jar_path);
        return Err(CookieError::io(&jar_path, err));
    }

    info!(
        path = %jar_path.display(),
        cookies = records.len(),
        "Wrote Netscape cookie jar"
    );
    Ok(jar_path)
}
