//! Error types for the `yt-dlp` media backend.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while running the media backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend executable could not be started.
    #[error(
        "failed to start '{binary}': {source}\n  Suggestion: Install yt-dlp or point --yt-dlp at the executable"
    )]
    Spawn {
        /// The executable that was run.
        binary: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The backend did not finish in time and was killed.
    #[error("'{binary}' timed out after {timeout_secs}s for {url}")]
    Timeout {
        /// The executable that was run.
        binary: PathBuf,
        /// The URL being processed.
        url: String,
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// The backend exited with a failure status.
    #[error("'{binary}' failed ({status}) for {url}: {stderr}")]
    Failed {
        /// The executable that was run.
        binary: PathBuf,
        /// The URL being processed.
        url: String,
        /// Exit status description.
        status: String,
        /// Trailing stderr output.
        stderr: String,
    },

    /// The metadata printed by the backend was not valid JSON.
    #[error("invalid metadata from '{binary}' for {url}: {source}")]
    InvalidMetadata {
        /// The executable that was run.
        binary: PathBuf,
        /// The URL being processed.
        url: String,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}
