//! CLI output formatting for every command.
//!
//! Output is **document-centric**: each line leads with the document title
//! (or its URL when untitled), with paths and timestamps as indented context
//! lines. Paths are shown relative to the library root.
//!
//! # Output Format
//!
//! ## Lifecycle operations
//!
//! ```text
//! Added Rust Notes
//!     URL: https://example.org/library/notes/rust/
//!     Page: notes/rust/index.html
//! Index: 2 entries → index.json
//! Feeds: index.html, index.rss, index.atom
//! ```
//!
//! ## List
//!
//! ```text
//! Fixture Library (https://example.org/library/)
//! 001 Rust Notes
//!     URL: https://example.org/library/notes/rust/
//!     Published: 2024-03-09T14:05:00.000Z
//!     Updated: 2024-03-09T14:05:00.000Z
//! 1 entry
//! ```
//!
//! ## Init
//!
//! ```text
//! Created cms/config.toml
//! Skipped cms/templates/doc (exists)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::index::LibraryIndex;
use crate::lifecycle::{InitReport, Outcome};
use crate::template::iso_time;
use crate::types::DocumentMetadata;
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

/// Title of an entry, or its URL in parens when the document has none.
fn display_title(meta: &DocumentMetadata) -> String {
    if meta.title.trim().is_empty() {
        format!("({})", meta.url)
    } else {
        meta.title.clone()
    }
}

/// `path` relative to `root` when it lives there.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Lifecycle operations
// ============================================================================

fn operation_verb(operation: &str) -> &'static str {
    match operation {
        "add" => "Added",
        "index" => "Indexed",
        "remove" => "Removed",
        "update" => "Updated",
        "popup" => "Promoted",
        "reform" | "renovate" => "Rendered",
        _ => "Done",
    }
}

/// Format the result of a lifecycle operation.
pub fn format_outcome(outcome: &Outcome, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let verb = operation_verb(outcome.operation);

    match &outcome.entry {
        Some(entry) => {
            lines.push(format!("{} {}", verb, display_title(entry)));
            lines.push(format!("{}URL: {}", indent(1), entry.url));
            for page in &outcome.pages {
                lines.push(format!("{}Page: {}", indent(1), relative(page, root)));
            }
        }
        None => {
            lines.push(format!("{} {}", verb, plural(outcome.pages.len(), "page", "pages")));
            for page in &outcome.pages {
                lines.push(format!("{}{}", indent(1), relative(page, root)));
            }
        }
    }

    lines.push(format!(
        "Index: {} \u{2192} {}",
        plural(outcome.entries, "entry", "entries"),
        relative(&outcome.index, root)
    ));
    if !outcome.feeds.is_empty() {
        let feeds: Vec<String> = outcome.feeds.iter().map(|f| relative(f, root)).collect();
        lines.push(format!("Feeds: {}", feeds.join(", ")));
    }
    lines
}

/// Print the result of a lifecycle operation to stdout.
pub fn print_outcome(outcome: &Outcome, root: &Path) {
    for line in format_outcome(outcome, root) {
        println!("{}", line);
    }
}

// ============================================================================
// List
// ============================================================================

/// Format the index, front first.
pub fn format_index_listing(index: &LibraryIndex) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", index.title, index.url)];
    for (i, entry) in index.entries().iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), display_title(entry)));
        lines.push(format!("{}URL: {}", indent(1), entry.url));
        lines.push(format!("{}Published: {}", indent(1), iso_time(&entry.published)));
        lines.push(format!("{}Updated: {}", indent(1), iso_time(&entry.updated)));
    }
    lines.push(plural(index.len(), "entry", "entries"));
    lines
}

/// Print the index to stdout.
pub fn print_index_listing(index: &LibraryIndex) {
    for line in format_index_listing(index) {
        println!("{}", line);
    }
}

// ============================================================================
// Init
// ============================================================================

/// Format the files `init` created and skipped.
pub fn format_init(report: &InitReport, root: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .created
        .iter()
        .map(|p| format!("Created {}", relative(p, root)))
        .collect();
    lines.extend(
        report
            .skipped
            .iter()
            .map(|p| format!("Skipped {} (exists)", relative(p, root))),
    );
    lines
}

/// Print the `init` report to stdout.
pub fn print_init(report: &InitReport, root: &Path) {
    for line in format_init(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
