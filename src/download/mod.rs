//! Media fetching: streamed image downloads, video hand-off and output naming.

mod client;
mod constants;
mod error;
mod fetcher;
mod filename;

pub use client::{HttpClient, ImageDownloader};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub use fetcher::{FailedImage, FetchReport, batch_progress, fetch_images, fetch_video};
pub use filename::{
    DownloadTarget, plan_targets, slide_file_name, url_basename, video_output_template,
};
