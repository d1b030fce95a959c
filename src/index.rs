//! The library index: an ordered, unique-by-URL list of document metadata.
//!
//! The index is persisted at the library root as `index.json`, a compact JSON
//! object carrying the library header and the resource list:
//!
//! ```json
//! {"url":"https://example.org/","title":"Librarium",
//!  "editor":{"display_name":"Ada","uris":[]},
//!  "updated":"2024-03-09T14:05:00.000Z",
//!  "resources":[{"url":"…","title":"…","type":"text/html", …}]}
//! ```
//!
//! Only `resources` is authoritative on disk. The header (`url`, `title`,
//! `editor`) is rebuilt from the current configuration on every load and
//! `updated` is the instant of the running invocation, so editing the config
//! and touching any document is enough to republish the header.
//!
//! ## Ordering
//!
//! The front of the list is the most recently touched document. New entries
//! go to the front, `popup` moves an entry to the front, `update` keeps the
//! entry where it is.
//!
//! ## Lookup
//!
//! A runtime `url → position` map is rebuilt after every mutation. It is never
//! serialized and callers never see it; each mutating method leaves the index
//! consistent on return.
//!
//! ## Backups
//!
//! [`LibraryIndex::save`] copies the previous `index.json` to `index.json~`
//! before overwriting it. Only one generation is kept.

use crate::config::LibraryConfig;
use crate::types::{DocumentMetadata, Identity, serialize_millis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the index file at the library root.
pub const INDEX_FILENAME: &str = "index.json";

/// Previous generation of the index, written before each save.
pub const BACKUP_FILENAME: &str = "index.json~";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document already indexed: {0}")]
    AlreadyIndexed(String),
    #[error("document not indexed: {0}")]
    NotIndexed(String),
}

/// The persisted index together with its runtime lookup.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryIndex {
    /// Library base URL, always ending in `/`.
    pub url: String,
    pub title: String,
    pub editor: Identity,
    #[serde(serialize_with = "serialize_millis")]
    pub updated: DateTime<Utc>,
    resources: Vec<DocumentMetadata>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

/// The part of `index.json` read back on load.
#[derive(Deserialize)]
struct StoredIndex {
    #[serde(default)]
    resources: Vec<DocumentMetadata>,
}

impl LibraryIndex {
    /// Build an index for `config` holding `resources` in the given order.
    ///
    /// A URL listed more than once keeps its first (most recent) entry.
    pub fn new(
        config: &LibraryConfig,
        updated: DateTime<Utc>,
        resources: Vec<DocumentMetadata>,
    ) -> Self {
        let mut index = Self {
            url: config.base_url(),
            title: config.library.title.clone(),
            editor: config.identity(),
            updated,
            resources: Vec::with_capacity(resources.len()),
            lookup: HashMap::new(),
        };
        for entry in resources {
            if index.lookup.contains_key(&entry.url) {
                warn!(url = %entry.url, "dropping duplicate index entry");
                continue;
            }
            index.lookup.insert(entry.url.clone(), index.resources.len());
            index.resources.push(entry);
        }
        index
    }

    /// Load `index.json` from the library root.
    ///
    /// A missing file is an empty library. A file that exists but does not
    /// parse is an error: silently starting over would drop every entry on
    /// the next save.
    pub fn load(
        root: &Path,
        config: &LibraryConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, IndexError> {
        let path = root.join(INDEX_FILENAME);
        if !path.exists() {
            debug!(path = %path.display(), "no index yet");
            return Ok(Self::new(config, now, Vec::new()));
        }
        let content = fs::read_to_string(&path)?;
        let stored: StoredIndex = serde_json::from_str(&content)?;
        Ok(Self::new(config, now, stored.resources))
    }

    /// Write `index.json` to the library root, keeping the previous version
    /// as `index.json~`.
    pub fn save(&self, root: &Path) -> Result<(), IndexError> {
        let path = root.join(INDEX_FILENAME);
        if path.exists() {
            fs::copy(&path, root.join(BACKUP_FILENAME))?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Entries, front (most recent) first.
    pub fn entries(&self) -> &[DocumentMetadata] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn position(&self, url: &str) -> Option<usize> {
        self.lookup.get(url).copied()
    }

    pub fn get(&self, url: &str) -> Option<&DocumentMetadata> {
        self.position(url).map(|i| &self.resources[i])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lookup.contains_key(url)
    }

    /// Insert `entry` at the front. Fails if its URL is already indexed.
    pub fn insert_front(&mut self, entry: DocumentMetadata) -> Result<(), IndexError> {
        if self.contains(&entry.url) {
            return Err(IndexError::AlreadyIndexed(entry.url));
        }
        self.resources.insert(0, entry);
        self.rebuild_lookup();
        Ok(())
    }

    /// Remove the entry for `url`, returning it.
    pub fn remove(&mut self, url: &str) -> Result<DocumentMetadata, IndexError> {
        let pos = self.require(url)?;
        let removed = self.resources.remove(pos);
        self.rebuild_lookup();
        Ok(removed)
    }

    /// Replace the entry for `url` in place, returning the old entry.
    ///
    /// The new entry normally carries the same URL. If it does not, its URL
    /// must not belong to another entry.
    pub fn replace(
        &mut self,
        url: &str,
        entry: DocumentMetadata,
    ) -> Result<DocumentMetadata, IndexError> {
        let pos = self.require(url)?;
        if entry.url != url && self.contains(&entry.url) {
            return Err(IndexError::AlreadyIndexed(entry.url));
        }
        let old = std::mem::replace(&mut self.resources[pos], entry);
        self.rebuild_lookup();
        Ok(old)
    }

    /// Move the entry for `url` to the front and set its `updated` time.
    pub fn promote_front(
        &mut self,
        url: &str,
        now: DateTime<Utc>,
    ) -> Result<&DocumentMetadata, IndexError> {
        let pos = self.require(url)?;
        let mut entry = self.resources.remove(pos);
        entry.updated = now;
        self.resources.insert(0, entry);
        self.rebuild_lookup();
        Ok(&self.resources[0])
    }

    fn require(&self, url: &str) -> Result<usize, IndexError> {
        self.position(url)
            .ok_or_else(|| IndexError::NotIndexed(url.to_string()))
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.url.clone(), i))
            .collect();
    }
}
