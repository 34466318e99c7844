//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Resizing input/ → output/ at 300x150
//! Working...
//! Failed
//!     broken.jpg: Failed to decode input/broken.jpg: ...
//! Resized 2 of 3 images (1 failed)
//! Done with errors
//! ```
//!
//! ## Presets
//!
//! ```text
//! iphone  1242x2688
//! mac     2560x1600
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Diagnostics go through
//! `tracing` on stderr, never through here.

use crate::batch::{JobRequest, RunResult};
use crate::config::BatchConfig;
use crate::status::Status;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "image" } else { "images" }
}

/// One-line summary of what is about to run.
pub fn format_job_header(request: &JobRequest) -> Vec<String> {
    vec![format!(
        "Resizing {} → {} at {}",
        request.input_dir.display(),
        request.output_dir.display(),
        request.size
    )]
}

/// Per-file failures (if any) followed by the tally line.
pub fn format_run_result(result: &RunResult) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.failures.is_empty() {
        lines.push("Failed".to_string());
        for failure in &result.failures {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                failure.file_name,
                failure.reason
            ));
        }
    }

    let total = result.total();
    if result.failed == 0 {
        lines.push(format!(
            "Resized {} of {} {}",
            result.succeeded,
            total,
            plural(total)
        ));
    } else {
        lines.push(format!(
            "Resized {} of {} {} ({} failed)",
            result.succeeded,
            total,
            plural(total),
            result.failed
        ));
    }
    lines
}

/// Presets with their sizes, names padded to a common width.
pub fn format_presets(config: &BatchConfig) -> Vec<String> {
    let width = config.presets.keys().map(String::len).max().unwrap_or(0);
    config
        .presets
        .iter()
        .map(|(name, [w, h])| {
            let marker = if config.target.preset.as_deref() == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            format!("{name:<width$}  {w}x{h}{marker}")
        })
        .collect()
}

pub fn format_status(status: Status) -> String {
    status.to_string()
}

pub fn print_job_header(request: &JobRequest) {
    for line in format_job_header(request) {
        println!("{}", line);
    }
}

pub fn print_run_result(result: &RunResult) {
    for line in format_run_result(result) {
        println!("{}", line);
    }
}

pub fn print_presets(config: &BatchConfig) {
    for line in format_presets(config) {
        println!("{}", line);
    }
}

pub fn print_status(status: Status) {
    println!("{}", format_status(status));
}
