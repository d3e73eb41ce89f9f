//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use slidegrab_core::slideshow::{DEFAULT_PAGE_TIMEOUT_SECS, DEFAULT_SLIDE_SELECTOR};
use slidegrab_core::ytdlp::DEFAULT_YTDLP_BINARY;

/// Download TikTok videos and photo slideshows.
///
/// Resolves the link to its content ID, decides whether the post is a video or
/// a slideshow, and saves the media into the output directory using the
/// session from an exported cookie file.
#[derive(Parser, Debug)]
#[command(name = "slidegrab")]
#[command(author, version, about)]
pub struct Args {
    /// Post link (full tiktok.com URL or vm.tiktok.com share link)
    pub link: String,

    /// JSON cookie export from a logged-in browser
    #[arg(long, value_name = "PATH")]
    pub cookies: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable coloured log output
    #[arg(long)]
    pub no_color: bool,

    /// yt-dlp executable
    #[arg(long = "yt-dlp", env = "SLIDEGRAB_YTDLP", value_name = "PATH", default_value = DEFAULT_YTDLP_BINARY)]
    pub ytdlp: PathBuf,

    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long, env = "SLIDEGRAB_CHROME", value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Seconds to wait for slideshow images to render (1-120)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_PAGE_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=120))]
    pub page_timeout: u64,

    /// CSS selector of slideshow images
    #[arg(long, value_name = "CSS", default_value = DEFAULT_SLIDE_SELECTOR)]
    pub slide_selector: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LINK: &str = "https://www.tiktok.com/@user/video/7301234567890123456";

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["slidegrab", LINK, "--cookies", "c.json", "-o", "out"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_cli_required_args_parse() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.link, LINK);
        assert_eq!(args.cookies, PathBuf::from("c.json"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.no_color);
        assert_eq!(args.page_timeout, 10);
        assert_eq!(args.slide_selector, DEFAULT_SLIDE_SELECTOR);
    }

    #[test]
    fn test_cli_output_long_flag() {
        let args = Args::try_parse_from([
            "slidegrab",
            LINK,
            "--cookies",
            "c.json",
            "--output",
            "downloads",
        ])
        .unwrap();
        assert_eq!(args.output, PathBuf::from("downloads"));
    }

    #[test]
    fn test_cli_missing_cookies_rejected() {
        let result = Args::try_parse_from(["slidegrab", LINK, "-o", "out"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_missing_link_rejected() {
        let result = Args::try_parse_from(["slidegrab", "--cookies", "c.json", "-o", "out"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_and_no_color() {
        let args = parse(&["-q", "--no-color"]).unwrap();
        assert!(args.quiet);
        assert!(args.no_color);
    }

    #[test]
    fn test_cli_page_timeout_bounds() {
        assert_eq!(parse(&["--page-timeout", "1"]).unwrap().page_timeout, 1);
        assert_eq!(parse(&["--page-timeout", "120"]).unwrap().page_timeout, 120);

        let err = parse(&["--page-timeout", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = parse(&["--page-timeout", "121"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_tool_paths() {
        let args = parse(&["--yt-dlp", "/opt/yt-dlp", "--chrome", "/opt/chrome"]).unwrap();
        assert_eq!(args.ytdlp, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(args.chrome, Some(PathBuf::from("/opt/chrome")));
    }

    #[test]
    fn test_cli_slide_selector_override() {
        let args = parse(&["--slide-selector", "img.slide"]).unwrap();
        assert_eq!(args.slide_selector, "img.slide");
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["slidegrab", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["slidegrab", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = parse(&["--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
