//! Turning one source document into index metadata plus a body fragment.
//!
//! The extractor is the only place that reads a source document. Everything it
//! derives from the HTML comes from the boundary scanner:
//!
//! - **Title**: [`scan::extract_title`], verbatim. An empty title is allowed
//!   but logged as a warning.
//! - **Body**: the [`scan::locate_body`] range, with one leading and one
//!   trailing line break removed so templates can place `$BODY$` on its own
//!   line. An empty or whitespace-only body is also a warning.
//!
//! The remaining metadata comes from configuration (author, library URL) and
//! from the instant the extractor was built with, so one invocation stamps
//! every document with the same time.

use crate::config::LibraryConfig;
use crate::naming;
use crate::scan;
use crate::types::{CONTENT_TYPE_HTML, DocumentMetadata};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// File holding a document's source inside its directory.
pub const SOURCE_FILENAME: &str = "source.html";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot read source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read `<doc_dir>/source.html`.
pub fn read_source(doc_dir: &Path) -> Result<String, ExtractError> {
    let path = doc_dir.join(SOURCE_FILENAME);
    fs::read_to_string(&path).map_err(|source| ExtractError::Read { path, source })
}

/// Remove one leading and one trailing line break (`\n`, `\r\n`, `\r` or `\n\r`).
///
/// Only a single break is stripped on each side; indentation and any further
/// blank lines are kept.
pub fn trim_line_breaks(text: &str) -> &str {
    let text = if let Some(rest) = text.strip_prefix("\r\n") {
        rest
    } else if let Some(rest) = text.strip_prefix(['\n', '\r']) {
        rest
    } else {
        text
    };
    if let Some(rest) = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix("\n\r"))
    {
        rest
    } else if let Some(rest) = text.strip_suffix(['\n', '\r']) {
        rest
    } else {
        text
    }
}

/// Body content of a source document, line-break trimmed.
pub fn body_entity(source: &str) -> &str {
    trim_line_breaks(scan::locate_body(source).slice(source))
}

/// Builds [`DocumentMetadata`] for documents of one library.
#[derive(Debug, Clone)]
pub struct Extractor<'c> {
    config: &'c LibraryConfig,
    base_url: String,
    now: DateTime<Utc>,
}

impl<'c> Extractor<'c> {
    pub fn new(config: &'c LibraryConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            base_url: config.base_url(),
            now,
        }
    }

    /// Extract metadata and body from `source`.
    ///
    /// `published` keeps an existing publication time (used when a document
    /// is updated); otherwise the document is published now.
    pub fn extract<'s>(
        &self,
        source: &'s str,
        doc_id: &str,
        published: Option<DateTime<Utc>>,
    ) -> (DocumentMetadata, &'s str) {
        let head = scan::scan(source);
        let body = trim_line_breaks(head.body_range(source).slice(source));

        if head.title.is_empty() {
            warn!(doc = doc_id, "empty title");
        }
        if body.trim().is_empty() {
            warn!(doc = doc_id, "empty body");
        }

        let meta = DocumentMetadata {
            url: naming::doc_url(&self.base_url, doc_id),
            title: head.title.text.to_string(),
            content_type: CONTENT_TYPE_HTML.to_string(),
            author: self.config.identity(),
            published: published.unwrap_or(self.now),
            updated: self.now,
        };
        (meta, body)
    }
}
