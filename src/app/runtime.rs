use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use slidegrab_core::{PipelineError, RunConfig, RunRequest, load_cookie_records, pipeline};
use tracing::{debug, info};

use crate::app::{exit_handler, terminal};
use crate::cli::Args;
use crate::{ProcessExit, output};

pub(crate) async fn run_slidegrab(args: Args) -> Result<ProcessExit> {
    let default_level = terminal::default_log_level(args.verbose, args.quiet);
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(default_level, no_color);

    debug!(?args, "CLI arguments parsed");
    info!("Slidegrab starting");

    let config = run_config(&args);

    let cookie_records = match load_cookie_records(&args.cookies) {
        Ok(records) => records,
        Err(error) => {
            output::print_fatal(&PipelineError::from(error));
            return Ok(ProcessExit::Failure);
        }
    };
    debug!(count = cookie_records.len(), "Cookie records loaded");

    let collaborators = config
        .collaborators(&cookie_records)
        .context("failed to build HTTP client")?;
    let extractor = config
        .slide_extractor()
        .context("invalid --slide-selector")?;

    let request = RunRequest {
        link: args.link,
        cookies_path: args.cookies,
        cookie_records,
        output_dir: args.output,
        show_progress: config.show_progress,
    };

    match pipeline::run(&request, &collaborators, &extractor).await {
        Ok(outcome) => {
            output::print_outcome(&outcome, args.quiet);
            Ok(exit_handler::outcome_exit(&outcome))
        }
        Err(error) => {
            output::print_fatal(&error);
            Ok(ProcessExit::Failure)
        }
    }
}

fn run_config(args: &Args) -> RunConfig {
    RunConfig {
        ytdlp_binary: args.ytdlp.clone(),
        chrome_executable: args.chrome.clone(),
        page_timeout: Duration::from_secs(args.page_timeout),
        slide_selector: args.slide_selector.clone(),
        show_progress: terminal::should_show_progress(
            io::stderr().is_terminal(),
            args.quiet,
            terminal::is_dumb_terminal(),
        ),
        ..RunConfig::default()
    }
}
