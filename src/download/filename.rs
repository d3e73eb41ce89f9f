//! Output naming for slide images and videos.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::slideshow::SlideImage;

/// Basename used when a source URL ends in `/` or only carries a query.
const FALLBACK_BASENAME: &str = "image";

/// Where one slide image will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Content ID the image belongs to.
    pub content_id: String,
    /// Source URL of the image.
    pub source_url: String,
    /// File name inside `destination_dir`.
    pub file_name: String,
    /// Output directory.
    pub destination_dir: PathBuf,
}

impl DownloadTarget {
    /// Builds the target for one slide image.
    #[must_use]
    pub fn for_slide(content_id: &str, image: &SlideImage, destination_dir: &Path) -> Self {
        Self {
            content_id: content_id.to_string(),
            source_url: image.source_url.clone(),
            file_name: slide_file_name(content_id, image),
            destination_dir: destination_dir.to_path_buf(),
        }
    }

    /// Full output path.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.destination_dir.join(&self.file_name)
    }
}

/// Plans one target per image, in input order.
///
/// A later image whose file name equals an earlier one is dropped, so no two
/// targets of one batch write the same file.
#[must_use]
pub fn plan_targets(
    content_id: &str,
    images: &[SlideImage],
    destination_dir: &Path,
) -> Vec<DownloadTarget> {
    let mut seen = HashSet::new();
    images
        .iter()
        .map(|image| DownloadTarget::for_slide(content_id, image, destination_dir))
        .filter(|target| {
            let fresh = seen.insert(target.file_name.clone());
            if !fresh {
                debug!(
                    file = %target.file_name,
                    url = %target.source_url,
                    "dropping image with colliding file name"
                );
            }
            fresh
        })
        .collect()
}

/// `[{content_id}]-{slide_index}-{basename}`.
#[must_use]
pub fn slide_file_name(content_id: &str, image: &SlideImage) -> String {
    format!(
        "[{content_id}]-{}-{}",
        image.slide_index,
        url_basename(&image.source_url)
    )
}

/// Last `/` segment of `url` with any query string removed, sanitized for the
/// filesystem.
#[must_use]
pub fn url_basename(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    let name = last.split('?').next().unwrap_or(last);
    if name.is_empty() {
        return FALLBACK_BASENAME.to_string();
    }
    sanitize_filename(name)
}

/// yt-dlp output template for a video:
/// `{dest_dir}/[{content_id}]%(title).100B.%(ext)s`.
#[must_use]
pub fn video_output_template(destination_dir: &Path, content_id: &str) -> PathBuf {
    destination_dir.join(format!("[{content_id}]%(title).100B.%(ext)s"))
}

/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
