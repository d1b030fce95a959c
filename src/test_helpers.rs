//! Shared test utilities for the librarium test suite.
//!
//! Provides a throwaway library built from `fixtures/library/`, a fixed clock
//! instant, and lookup helpers over the index.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, paths) = setup_library();
//! let config = config::load_config(&paths.cms).unwrap();
//! let mut library = Library::with_config(paths.clone(), config, fixed_now()).unwrap();
//! library.run(&Operation::Add("notes/rust".into())).unwrap();
//!
//! assert_eq!(entry_titles(library.index()), vec!["Rust Notes"]);
//! let entry = find_entry(library.index(), "Rust Notes");
//! assert_eq!(entry.published, fixed_now());
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::extract::SOURCE_FILENAME;
use crate::index::LibraryIndex;
use crate::lifecycle::LibraryPaths;
use crate::types::DocumentMetadata;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/library/` to a temp directory and return it with its paths.
///
/// The copy holds `cms/config.toml`, the full template set and a few
/// unindexed documents. Tests mutate it freely; keep the `TempDir` alive for
/// the duration of the test.
pub fn setup_library() -> (TempDir, LibraryPaths) {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/library");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    let paths = LibraryPaths::new(tmp.path(), "cms");
    (tmp, paths)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// The clock instant tests run at: 2024-03-09 14:05:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
}

/// Create (or overwrite) `<root>/<doc_id>/source.html`.
pub fn write_doc(paths: &LibraryPaths, doc_id: &str, source: &str) {
    let dir = paths.doc_dir(doc_id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(SOURCE_FILENAME), source).unwrap();
}

/// Read a file relative to the library root. Panics with the path on failure.
pub fn read(paths: &LibraryPaths, rel: &str) -> String {
    let path = paths.root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Read a file relative to the CMS directory.
pub fn read_cms(paths: &LibraryPaths, rel: &str) -> String {
    let path = paths.cms.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

// =========================================================================
// Index lookups: panic with the available titles on a miss
// =========================================================================

/// Find an index entry by title. Panics if not found.
pub fn find_entry<'a>(index: &'a LibraryIndex, title: &str) -> &'a DocumentMetadata {
    index
        .entries()
        .iter()
        .find(|e| e.title == title)
        .unwrap_or_else(|| {
            let titles = entry_titles(index);
            panic!("entry '{title}' not found. Available: {titles:?}")
        })
}

/// All entry titles in index order.
pub fn entry_titles(index: &LibraryIndex) -> Vec<&str> {
    index.entries().iter().map(|e| e.title.as_str()).collect()
}
