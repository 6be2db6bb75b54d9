//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every generated image leads with its positional index within the rule, its
//! file name and its size. The source and target paths follow as indented
//! context lines, relative to the target root where possible.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! ios:icon (2 images)
//!     001 icon-60@2x.png 120x120
//!         Source: icon.png
//!         Target: Assets/Icon.appiconset/icon-60@2x.png
//!     002 icon-60@3x.png 180x180 (stretched)
//!         Source: icon.png
//!         Target: Assets/Icon.appiconset/icon-60@3x.png
//!         Retouched: fill, colorize
//! Contents.json: updated Assets/Icon.appiconset
//!
//! Generated 2 images, updated 1 Contents.json
//! ```
//!
//! ## Dry run
//!
//! Same layout as a run, built from the plan before anything is written.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects. The CLI
//! prints the lines.

use crate::generate::{GenerateEvent, GenerateReport, GenerationTask};
use crate::imaging::ImageTask;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lies inside it, else as given.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

fn rule_header(name: &str, task_count: usize) -> String {
    format!("{} ({})", name, plural(task_count, "image", "images"))
}

/// Names of the optional transforms a task asks for.
fn requested_optionals(task: &ImageTask) -> Vec<&'static str> {
    let set = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
    let mut names = Vec::new();
    if set(&task.fill_color) {
        names.push("fill");
    }
    if set(&task.colorize) {
        names.push("colorize");
    }
    if task.compose.is_some() {
        names.push("compose");
    }
    names
}

/// Image header plus `Source:`/`Target:` context lines.
fn image_lines(index: usize, task: &ImageTask, root: &Path) -> Vec<String> {
    let file_name = task
        .target
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| task.target.display().to_string());
    let stretched = if task.no_crop { " (stretched)" } else { "" };

    vec![
        format!(
            "{}{} {} {}x{}{}",
            indent(1),
            format_index(index),
            file_name,
            task.width,
            task.height,
            stretched
        ),
        format!("{}Source: {}", indent(2), task.original.display()),
        format!("{}Target: {}", indent(2), display_path(&task.target, root)),
    ]
}

// ============================================================================
// Run output
// ============================================================================

/// Format a single generation progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent, root: &Path) -> Vec<String> {
    match event {
        GenerateEvent::RuleStarted { name, task_count } => {
            vec![rule_header(name, *task_count)]
        }
        GenerateEvent::ImageGenerated {
            index,
            task,
            retouched,
        } => {
            let mut lines = image_lines(*index, task, root);
            if !retouched.is_empty() {
                lines.push(format!("{}Retouched: {}", indent(2), retouched.join(", ")));
            }
            lines
        }
        GenerateEvent::ContentsUpdated { directory } => {
            vec![format!(
                "{}: updated {}",
                crate::contents::CONTENTS_FILE_NAME,
                display_path(directory, root)
            )]
        }
        GenerateEvent::ContentsFailed { directory, error } => {
            vec![format!(
                "{}: failed {} ({})",
                crate::contents::CONTENTS_FILE_NAME,
                display_path(directory, root),
                error
            )]
        }
    }
}

/// One-line summary of a finished run.
pub fn format_summary(report: &GenerateReport) -> String {
    let mut summary = format!(
        "Generated {}",
        plural(report.generated.len(), "image", "images")
    );
    if !report.contents.updated.is_empty() {
        summary.push_str(&format!(
            ", updated {}",
            plural(
                report.contents.updated.len(),
                "Contents.json",
                "Contents.json files"
            )
        ));
    }
    if !report.contents.failed.is_empty() {
        summary.push_str(&format!(
            ", {} failed",
            plural(
                report.contents.failed.len(),
                "Contents.json",
                "Contents.json files"
            )
        ));
    }
    summary
}

// ============================================================================
// Dry run output
// ============================================================================

/// Format a plan without running it.
pub fn format_plan(tasks: &[GenerationTask], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for group in tasks.chunk_by(|a, b| a.rule_index == b.rule_index) {
        lines.push(rule_header(&group[0].rule, group.len()));
        for (position, task) in group.iter().enumerate() {
            lines.extend(image_lines(position + 1, &task.image, root));
            let optionals = requested_optionals(&task.image);
            if !optionals.is_empty() {
                lines.push(format!("{}Retouch: {}", indent(2), optionals.join(", ")));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Would generate {}",
        plural(tasks.len(), "image", "images")
    ));
    lines
}
