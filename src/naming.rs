//! Document identifier conventions.
//!
//! A document is identified by its directory path relative to the library
//! root, e.g. `notes/2024/rust`. Everything else derives from that id:
//!
//! ```text
//! id          notes/2024/rust
//! source      <root>/notes/2024/rust/source.html
//! page        <root>/notes/2024/rust/index.html
//! permalink   <library url>notes/2024/rust/
//! ```
//!
//! Ids are taken from the command line as typed, so trailing slashes are
//! dropped (`notes/2024/rust/` and `notes/2024/rust` name the same document).
//! Ids recovered from indexed permalinks go through the same check as typed
//! ones: a valid id is a non-empty relative path of plain directory names.

use std::path::{Component, Path};

/// Strip trailing `/` from a user-supplied document id.
pub fn normalize_doc_id(arg: &str) -> &str {
    arg.trim_end_matches('/')
}

/// Whether `doc_id` names a directory inside the library root.
///
/// Rejects the empty id, absolute paths, and any `.` or `..` component.
pub fn is_valid_doc_id(doc_id: &str) -> bool {
    !doc_id.is_empty()
        && Path::new(doc_id)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Library URL with exactly the trailing `/` the permalinks are built on.
///
/// - `"https://example.org/lib"` → `"https://example.org/lib/"`
/// - `"https://example.org/lib/"` → unchanged
pub fn library_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Permalink of a document: `base + id + "/"`.
pub fn doc_url(base: &str, doc_id: &str) -> String {
    format!("{base}{doc_id}/")
}

/// Recover the document id from a permalink built on `base`.
///
/// Returns `None` when the URL does not live under `base`, which happens when
/// the library URL was changed after documents were indexed.
pub fn doc_id_from_url<'a>(base: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(base).map(normalize_doc_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_dropped() {
        assert_eq!(normalize_doc_id("notes/rust/"), "notes/rust");
        assert_eq!(normalize_doc_id("notes/rust//"), "notes/rust");
        assert_eq!(normalize_doc_id("notes/rust"), "notes/rust");
    }

    #[test]
    fn plain_relative_ids_are_valid() {
        assert!(is_valid_doc_id("notes"));
        assert!(is_valid_doc_id("notes/2024/rust"));
    }

    #[test]
    fn ids_leaving_the_root_are_invalid() {
        for id in ["", "/", "/etc", "../x", "notes/../../x", "./notes", "notes/./rust"] {
            assert!(!is_valid_doc_id(id), "accepted {id:?}");
        }
    }

    #[test]
    fn base_url_gets_single_trailing_slash() {
        assert_eq!(library_base_url("https://example.org/lib"), "https://example.org/lib/");
        assert_eq!(library_base_url("https://example.org/lib/"), "https://example.org/lib/");
    }

    #[test]
    fn doc_url_appends_slash() {
        assert_eq!(
            doc_url("https://example.org/", "notes/rust"),
            "https://example.org/notes/rust/"
        );
    }

    #[test]
    fn doc_id_roundtrips_through_url() {
        let base = "https://example.org/lib/";
        let url = doc_url(base, "a/b");
        assert_eq!(doc_id_from_url(base, &url), Some("a/b"));
    }

    #[test]
    fn foreign_url_has_no_doc_id() {
        assert_eq!(
            doc_id_from_url("https://example.org/lib/", "https://other.org/a/"),
            None
        );
    }
}
