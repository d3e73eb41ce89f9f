//! CLI output formatting and display helpers.

use std::collections::BTreeMap;

use slidegrab_core::failure::{self, FailureCategory, FailureDescriptor};
use slidegrab_core::{PipelineError, RunOutcome};
use tracing::info;

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// Lines describing a successful run.
pub(crate) fn outcome_lines(outcome: &RunOutcome) -> Vec<String> {
    match outcome {
        RunOutcome::Slideshow {
            content_id,
            found,
            report,
        } => {
            let mut lines = vec![format!(
                "Saved {}/{} slide images for {content_id}",
                report.fetched.len(),
                found
            )];
            lines.extend(report.fetched.iter().map(|path| format!("  {}", path.display())));
            lines
        }
        RunOutcome::NoImages { content_id } => {
            vec![format!("No images found for {content_id}")]
        }
        RunOutcome::Video { content_id, path } => match path {
            Some(path) => vec![format!("Saved video for {content_id}: {}", path.display())],
            None => vec![format!("Saved video for {content_id}")],
        },
    }
}

/// Prints the run result to stdout; failures are printed even when quiet.
pub(crate) fn print_outcome(outcome: &RunOutcome, quiet: bool) {
    info!(content_id = outcome.content_id(), "Run complete");
    if !quiet {
        for line in outcome_lines(outcome) {
            println!("{line}");
        }
    }
    if let RunOutcome::Slideshow { report, .. } = outcome
        && !report.failed.is_empty()
    {
        let reasons: Vec<&str> = report.failed.iter().map(|f| f.reason.as_str()).collect();
        for line in render_failure_summary_lines(&reasons, terminal_width()) {
            println!("{line}");
        }
    }
}

/// What/Why/Fix block for a fatal error.
pub(crate) fn fatal_lines(error: &PipelineError, width: usize) -> Vec<String> {
    let descriptor = failure::describe(error);
    let mut lines = vec![format!(
        "{} {}: {}",
        descriptor.category.icon(),
        descriptor.category.label(),
        descriptor.what
    )];
    lines.push(format!("  Why: {}", descriptor.why));
    lines.push(format!("  Fix: {}", descriptor.fix));
    lines.push(format!("  Error: {}", first_line(&error.to_string())));
    lines
        .into_iter()
        .map(|line| truncate_to_width(&line, width))
        .collect()
}

pub(crate) fn print_fatal(error: &PipelineError) {
    for line in fatal_lines(error, terminal_width()) {
        eprintln!("{line}");
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

pub(crate) fn render_failure_summary_lines(failed_reasons: &[&str], width: usize) -> Vec<String> {
    if failed_reasons.is_empty() {
        return Vec::new();
    }

    let mut grouped: BTreeMap<FailureCategory, (usize, FailureDescriptor)> = BTreeMap::new();
    let mut auth_domains: BTreeMap<String, usize> = BTreeMap::new();

    for reason in failed_reasons {
        let descriptor = failure::classify_failure(reason);
        grouped
            .entry(descriptor.category)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, descriptor));

        if descriptor.category == FailureCategory::Auth
            && let Some(domain) = failure::extract_auth_domain(reason)
        {
            *auth_domains.entry(domain).or_insert(0) += 1;
        }
    }

    let mut lines = vec![truncate_to_width("Failed images by category:", width)];
    for (category, (count, descriptor)) in &grouped {
        let header = format!("- {} {}: {}", category.icon(), category.label(), count);
        lines.push(truncate_to_width(&header, width));
        lines.push(truncate_to_width(
            &format!("  What: {}", descriptor.what),
            width,
        ));

        let why_detail = if *category == FailureCategory::Auth && !auth_domains.is_empty() {
            let domains: Vec<String> = auth_domains
                .iter()
                .map(|(domain, count)| format!("{domain} ({count})"))
                .collect();
            format!(
                "{} Affected domains: {}",
                descriptor.why,
                domains.join(", ")
            )
        } else {
            descriptor.why.to_string()
        };
        lines.push(truncate_to_width(&format!("  Why: {why_detail}"), width));
        lines.push(truncate_to_width(
            &format!("  Fix: {}", descriptor.fix),
            width,
        ));
    }

    lines
}
