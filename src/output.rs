//! CLI output formatting for all pipeline stages.
//!
//! Output is **result-centric**: each stage prints a title line, then its
//! outputs by position with paths shown relative to the working root, then
//! anything that needs attention (skipped files, notes), and finally the
//! one-line summary.
//!
//! ```text
//! Upscale
//!     001 Upscaled/Clipart-01.png
//!     002 Upscaled/Clipart-02.jpg
//!     Skipped: broken.png (Failed to decode broken.png: ...)
//!     Note: optimizer skipped: pngquant not found on PATH
//! upscale: 2 processed, 1 skipped
//! ```
//!
//! Each report kind has a `format_*` function (returns `Vec<String>`, pure)
//! and a `print_*` wrapper that writes to stdout. With `--json` a report is
//! printed as a single JSON object per line instead.

use crate::runner::StageCompletion;
use crate::stage::{StageId, StageReport};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `root` when it lives under it, otherwise as given.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn stage_title(stage: StageId) -> &'static str {
    match stage {
        StageId::Collage => "Collage",
        StageId::Upscale => "Upscale",
        StageId::Watermark => "Watermark",
        StageId::Slideshow => "Slideshow",
        StageId::LoopVideo => "Loop video",
        StageId::Archive => "Archive",
        StageId::Deliver => "Deliver",
    }
}

pub fn format_report(report: &StageReport, root: &Path) -> Vec<String> {
    let mut lines = vec![stage_title(report.stage).to_string()];
    for (i, output) in report.outputs.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(1),
            format_index(i + 1),
            display_path(output, root)
        ));
    }
    for skipped in &report.skipped {
        lines.push(format!(
            "{}Skipped: {} ({})",
            indent(1),
            display_path(&skipped.path, root),
            skipped.reason
        ));
    }
    for note in &report.notes {
        lines.push(format!("{}Note: {}", indent(1), note));
    }
    lines.push(report.summary());
    lines
}

pub fn print_report(report: &StageReport, root: &Path) {
    for line in format_report(report, root) {
        println!("{}", line);
    }
}

/// One-line JSON rendering of a report, for scripting.
pub fn format_report_json(report: &StageReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Single line for a runner completion.
pub fn format_completion(completion: &StageCompletion) -> String {
    let status = if completion.success { "done" } else { "FAILED" };
    format!("[{}] {}", status, completion.message)
}

pub fn print_completion(completion: &StageCompletion) {
    println!("{}", format_completion(completion));
}

/// Closing line for `build`.
pub fn format_build_summary(reports: &[StageReport]) -> String {
    let processed: usize = reports.iter().map(|r| r.processed).sum();
    let skipped: usize = reports.iter().map(|r| r.skipped.len()).sum();
    let mut line = format!("Built {} stages, {} inputs processed", reports.len(), processed);
    if skipped > 0 {
        line.push_str(&format!(", {} skipped", skipped));
    }
    line
}

/// Help shown by `interactive`.
pub fn format_stage_list() -> Vec<String> {
    let mut lines = vec!["Stages (one per line, empty line or `quit` to exit):".to_string()];
    for stage in StageId::ALL {
        lines.push(format!("{}{}", indent(1), stage));
    }
    lines
}
