//! CLI entry point for slidegrab.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod cli;
mod output;

use cli::Args;

/// Process outcome, mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested was saved, or there was nothing to save.
    Success,
    /// Some slide images were saved and some failed.
    Partial,
    /// A fatal error, or every slide image failed.
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

fn main() -> ExitCode {
    // Parse before tracing so --help works without logs
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Error: failed to start async runtime: {error}");
            return ProcessExit::Failure.into();
        }
    };

    match runtime.block_on(app::runtime::run_slidegrab(args)) {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}
