//! Exit code logic for the slidegrab process.
//!
//! Single responsibility: map a run result to the process exit outcome.

use slidegrab_core::RunOutcome;

use crate::ProcessExit;

/// Determines the process exit outcome from fetched and failed image counts.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome of a run that did not hit a fatal error.
pub(crate) fn outcome_exit(outcome: &RunOutcome) -> ProcessExit {
    match outcome {
        RunOutcome::Slideshow { report, .. } => {
            determine_exit_outcome(report.fetched.len(), report.failed.len())
        }
        RunOutcome::NoImages { .. } | RunOutcome::Video { .. } => ProcessExit::Success,
    }
}
