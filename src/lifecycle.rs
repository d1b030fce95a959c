//! Library lifecycle operations.
//!
//! Each invocation runs exactly one [`Operation`] against a library root:
//!
//! | operation  | requires                      | does                                        |
//! |------------|-------------------------------|---------------------------------------------|
//! | `add`      | directory exists, not indexed | extract, render page, insert at front       |
//! | `index`    | directory exists, not indexed | extract, insert at front (no page)          |
//! | `remove`   | indexed                       | drop from index                             |
//! | `update`   | directory exists, indexed     | re-extract keeping `published`, render page |
//! | `popup`    | indexed                       | move to front, refresh `updated`            |
//! | `reform`   | directory exists, indexed     | render page from stored metadata            |
//! | `renovate` | every entry under the library | render every page                           |
//!
//! After any successful operation the index is saved (with backup) and every
//! configured feed is regenerated.
//!
//! ## All or nothing
//!
//! An operation runs in two phases. The first checks preconditions, reads
//! every source and template it needs, and computes the new index and pages
//! in memory. The second writes pages, then the index, then the feeds. A
//! failure in the first phase leaves the library on disk exactly as it was.

use crate::config::{self, ConfigError, LibraryConfig};
use crate::extract::{self, ExtractError, Extractor};
use crate::generate::{self, GenerateError, TEMPLATES_DIR};
use crate::index::{INDEX_FILENAME, IndexError, LibraryIndex};
use crate::naming;
use crate::types::{self, DocumentMetadata};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid document id {0:?}")]
    InvalidDocId(String),
    #[error("document not found: {}", .0.display())]
    DocumentMissing(PathBuf),
    #[error("indexed url {0} is not under the library url {1}")]
    ForeignUrl(String, String),
}

/// One lifecycle operation and its document id, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add(String),
    Index(String),
    Remove(String),
    Update(String),
    Popup(String),
    Reform(String),
    Renovate,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add(_) => "add",
            Operation::Index(_) => "index",
            Operation::Remove(_) => "remove",
            Operation::Update(_) => "update",
            Operation::Popup(_) => "popup",
            Operation::Reform(_) => "reform",
            Operation::Renovate => "renovate",
        }
    }

    /// Document id with trailing slashes removed, if the operation takes one.
    pub fn doc_id(&self) -> Option<&str> {
        match self {
            Operation::Add(id)
            | Operation::Index(id)
            | Operation::Remove(id)
            | Operation::Update(id)
            | Operation::Popup(id)
            | Operation::Reform(id) => Some(naming::normalize_doc_id(id)),
            Operation::Renovate => None,
        }
    }
}

/// Where a library lives on disk.
#[derive(Debug, Clone)]
pub struct LibraryPaths {
    /// Library root: document directories, `index.json` and feeds.
    pub root: PathBuf,
    /// CMS directory: `config.toml` and `templates/`.
    pub cms: PathBuf,
}

impl LibraryPaths {
    /// `cms` is resolved against `root` unless it is absolute.
    pub fn new(root: impl Into<PathBuf>, cms: impl AsRef<Path>) -> Self {
        let root = root.into();
        let cms = root.join(cms);
        Self { root, cms }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.cms.join(TEMPLATES_DIR)
    }

    pub fn doc_dir(&self, doc_id: &str) -> PathBuf {
        self.root.join(doc_id)
    }
}

/// What an operation changed.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub operation: &'static str,
    /// The entry the operation acted on (for `remove`, the dropped entry).
    pub entry: Option<DocumentMetadata>,
    /// Rendered pages, in write order.
    pub pages: Vec<PathBuf>,
    pub index: PathBuf,
    pub feeds: Vec<PathBuf>,
    /// Index size after the operation.
    pub entries: usize,
}

/// A loaded library: configuration, index and the clock instant of this run.
#[derive(Debug)]
pub struct Library {
    paths: LibraryPaths,
    config: LibraryConfig,
    index: LibraryIndex,
    now: DateTime<Utc>,
}

/// Changes computed by the first phase of an operation.
struct Plan {
    index: LibraryIndex,
    entry: Option<DocumentMetadata>,
    pages: Vec<(String, String)>,
}

impl Library {
    /// Load config from the CMS directory and the index from the root.
    pub fn open(paths: LibraryPaths) -> Result<Self, LifecycleError> {
        let config = config::load_config(&paths.cms)?;
        Self::with_config(paths, config, types::current_instant())
    }

    /// Load the index with an explicit config and clock instant.
    pub fn with_config(
        paths: LibraryPaths,
        config: LibraryConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        let index = LibraryIndex::load(&paths.root, &config, now)?;
        debug!(root = %paths.root.display(), entries = index.len(), "opened library");
        Ok(Self {
            paths,
            config,
            index,
            now,
        })
    }

    pub fn paths(&self) -> &LibraryPaths {
        &self.paths
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn index(&self) -> &LibraryIndex {
        &self.index
    }

    /// Run one operation to completion.
    pub fn run(&mut self, op: &Operation) -> Result<Outcome, LifecycleError> {
        let plan = self.plan(op)?;
        let feeds = generate::load_feeds(&self.paths.templates_dir(), &self.config.feeds.formats)?;

        let mut pages = Vec::with_capacity(plan.pages.len());
        for (doc_id, html) in &plan.pages {
            pages.push(generate::write_document(&self.paths.root, doc_id, html)?);
        }
        plan.index.save(&self.paths.root)?;
        info!(entries = plan.index.len(), "wrote index");
        let feeds = generate::write_feeds(&self.paths.root, &feeds, &plan.index)?;

        self.index = plan.index;
        Ok(Outcome {
            operation: op.name(),
            entry: plan.entry,
            pages,
            index: self.paths.root.join(INDEX_FILENAME),
            feeds,
            entries: self.index.len(),
        })
    }

    fn plan(&self, op: &Operation) -> Result<Plan, LifecycleError> {
        let mut index = self.index.clone();
        let extractor = Extractor::new(&self.config, self.now);
        let mut pages = Vec::new();

        let entry = match op {
            Operation::Add(_) | Operation::Index(_) => {
                let doc_id = self.doc_id(op)?;
                let url = naming::doc_url(&index.url, doc_id);
                self.require_dir(doc_id)?;
                if index.contains(&url) {
                    return Err(IndexError::AlreadyIndexed(url).into());
                }
                let source = extract::read_source(&self.paths.doc_dir(doc_id))?;
                let (meta, body) = extractor.extract(&source, doc_id, None);
                if matches!(op, Operation::Add(_)) {
                    let template = generate::load_doc_template(&self.paths.templates_dir())?;
                    let html = generate::render_document(&template, &index, &meta, body);
                    pages.push((doc_id.to_string(), html));
                }
                index.insert_front(meta.clone())?;
                Some(meta)
            }
            Operation::Remove(_) => {
                let doc_id = self.doc_id(op)?;
                let url = naming::doc_url(&index.url, doc_id);
                require_indexed(&index, &url)?;
                Some(index.remove(&url)?)
            }
            Operation::Update(_) => {
                let doc_id = self.doc_id(op)?;
                let url = naming::doc_url(&index.url, doc_id);
                self.require_dir(doc_id)?;
                let published = require_indexed(&index, &url)?.published;
                let source = extract::read_source(&self.paths.doc_dir(doc_id))?;
                let (meta, body) = extractor.extract(&source, doc_id, Some(published));
                let template = generate::load_doc_template(&self.paths.templates_dir())?;
                let html = generate::render_document(&template, &index, &meta, body);
                pages.push((doc_id.to_string(), html));
                index.replace(&url, meta.clone())?;
                Some(meta)
            }
            Operation::Popup(_) => {
                let doc_id = self.doc_id(op)?;
                let url = naming::doc_url(&index.url, doc_id);
                require_indexed(&index, &url)?;
                Some(index.promote_front(&url, self.now)?.clone())
            }
            Operation::Reform(_) => {
                let doc_id = self.doc_id(op)?;
                let url = naming::doc_url(&index.url, doc_id);
                self.require_dir(doc_id)?;
                let meta = require_indexed(&index, &url)?.clone();
                let source = extract::read_source(&self.paths.doc_dir(doc_id))?;
                let template = generate::load_doc_template(&self.paths.templates_dir())?;
                let html =
                    generate::render_document(&template, &index, &meta, extract::body_entity(&source));
                pages.push((doc_id.to_string(), html));
                Some(meta)
            }
            Operation::Renovate => {
                let targets = self.renovate_targets(&index)?;
                if !targets.is_empty() {
                    let template = generate::load_doc_template(&self.paths.templates_dir())?;
                    for (doc_id, meta) in targets {
                        let source = extract::read_source(&self.paths.doc_dir(&doc_id))?;
                        let html = generate::render_document(
                            &template,
                            &index,
                            meta,
                            extract::body_entity(&source),
                        );
                        pages.push((doc_id, html));
                    }
                }
                None
            }
        };

        Ok(Plan {
            index,
            entry,
            pages,
        })
    }

    /// Every indexed document with its id, checked to live under the library
    /// URL, to name a directory inside the root and to still have one.
    fn renovate_targets<'i>(
        &self,
        index: &'i LibraryIndex,
    ) -> Result<Vec<(String, &'i DocumentMetadata)>, LifecycleError> {
        index
            .entries()
            .iter()
            .map(|meta| -> Result<_, LifecycleError> {
                let doc_id = naming::doc_id_from_url(&index.url, &meta.url).ok_or_else(|| {
                    LifecycleError::ForeignUrl(meta.url.clone(), index.url.clone())
                })?;
                let doc_id = valid_doc_id(doc_id)?;
                self.require_dir(doc_id)?;
                Ok((doc_id.to_string(), meta))
            })
            .collect()
    }

    fn doc_id<'o>(&self, op: &'o Operation) -> Result<&'o str, LifecycleError> {
        valid_doc_id(op.doc_id().unwrap_or_default())
    }

    fn require_dir(&self, doc_id: &str) -> Result<(), LifecycleError> {
        let dir = self.paths.doc_dir(doc_id);
        if dir.is_dir() {
            Ok(())
        } else {
            Err(LifecycleError::DocumentMissing(dir))
        }
    }
}

fn valid_doc_id(doc_id: &str) -> Result<&str, LifecycleError> {
    if naming::is_valid_doc_id(doc_id) {
        Ok(doc_id)
    } else {
        Err(LifecycleError::InvalidDocId(doc_id.to_string()))
    }
}

fn require_indexed<'i>(
    index: &'i LibraryIndex,
    url: &str,
) -> Result<&'i DocumentMetadata, LifecycleError> {
    index
        .get(url)
        .ok_or_else(|| IndexError::NotIndexed(url.to_string()).into())
}

// ============================================================================
// Scaffolding
// ============================================================================

/// Files written and left alone by [`init`].
#[derive(Debug, Default)]
pub struct InitReport {
    pub created: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Scaffold `config.toml` and the stock templates into the CMS directory.
///
/// Existing files are never overwritten.
pub fn init(paths: &LibraryPaths) -> Result<InitReport, LifecycleError> {
    let templates_dir = paths.templates_dir();
    let files = std::iter::once((
        paths.cms.join(config::CONFIG_FILENAME),
        config::stock_config_toml().to_string(),
    ))
    .chain(
        generate::stock_templates()
            .into_iter()
            .map(|t| (templates_dir.join(t.path), t.content)),
    );

    let mut report = InitReport::default();
    for (path, content) in files {
        if path.exists() {
            debug!(path = %path.display(), "exists, skipping");
            report.skipped.push(path);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        info!(path = %path.display(), "created");
        report.created.push(path);
    }
    Ok(report)
}
