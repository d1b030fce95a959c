//! Page and feed generation.
//!
//! Every output is a text template with `$TOKEN$` placeholders, expanded by
//! [`crate::template::Substitution`]. Templates live in the CMS directory so
//! a library can restyle itself without rebuilding:
//!
//! ```text
//! cms/templates/
//! ├── doc                      # one page per document
//! └── indices/
//!     ├── html/{entire,item}   # listing feeds: container + per-entry
//!     ├── rss/{entire,item}
//!     └── atom/{entire,item}
//! ```
//!
//! ## Generated files
//!
//! ```text
//! <root>/
//! ├── index.html  index.rss  index.atom   # one per configured feed format
//! └── notes/rust/
//!     ├── source.html                     # hand-written input
//!     └── index.html                      # rendered page
//! ```
//!
//! ## Tokens
//!
//! - **Page**: `$PERMALINK$ $TITLE$ $AUTHOR$ $CONTACT$ $BTIME$ $PUBLISHED$
//!   $MTIME$ $UPDATED$ $BODY$ $LIBURL$ $LIBTITLE$`
//! - **Feed container**: `$TITLE$ $URL$ $EDITOR$ $CONTACT$ $MTIME$ $UPDATED$
//!   $ENTRIES$` (the entries are inserted at the first `$ENTRIES$` only)
//! - **Feed item**: `$URL$ $TITLE$ $AUTHOR$ $BTIME$ $PUBLISHED$ $MTIME$
//!   $UPDATED$`
//!
//! URL tokens are URI-encoded; `*TIME` tokens are ISO 8601 and the
//! `$PUBLISHED$`/`$UPDATED$` family are HTTP dates. Titles and bodies are
//! inserted verbatim: they are already HTML taken from the source documents.
//!
//! ## Stock templates
//!
//! [`stock_templates`] provides a starter set written by `init`. The HTML
//! ones are built with [maud](https://maud.lambda.xyz/); the XML feeds are
//! plain strings.

use crate::config::FeedFormat;
use crate::index::LibraryIndex;
use crate::template::{Substitution, encode_uri, http_time, iso_time};
use crate::types::DocumentMetadata;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Template directory inside the CMS directory.
pub const TEMPLATES_DIR: &str = "templates";

/// Page template file name inside the template directory.
pub const DOC_TEMPLATE: &str = "doc";

/// Rendered page file name inside a document directory.
pub const PAGE_FILENAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn read_template(path: PathBuf) -> Result<String, GenerateError> {
    fs::read_to_string(&path).map_err(|source| GenerateError::Template { path, source })
}

// ============================================================================
// Document pages
// ============================================================================

/// Read the page template from `templates_dir`.
pub fn load_doc_template(templates_dir: &Path) -> Result<String, GenerateError> {
    read_template(templates_dir.join(DOC_TEMPLATE))
}

/// Expand the page template for one document.
///
/// `$LIBURL$` and `$LIBTITLE$` come from the index header, so pages and feeds
/// always agree on the library they belong to.
pub fn render_document(
    template: &str,
    library: &LibraryIndex,
    meta: &DocumentMetadata,
    body: &str,
) -> String {
    Substitution::new()
        .token("PERMALINK", encode_uri(&meta.url))
        .token("TITLE", meta.title.as_str())
        .token("AUTHOR", meta.author.display_name.as_str())
        .token("CONTACT", encode_uri(meta.author.contact()))
        .token("BTIME", iso_time(&meta.published))
        .token("PUBLISHED", http_time(&meta.published))
        .token("MTIME", iso_time(&meta.updated))
        .token("UPDATED", http_time(&meta.updated))
        .token("BODY", body)
        .token("LIBURL", encode_uri(&library.url))
        .token("LIBTITLE", library.title.as_str())
        .apply(template)
}

/// Write a rendered page to `<root>/<doc_id>/index.html`.
pub fn write_document(root: &Path, doc_id: &str, html: &str) -> Result<PathBuf, GenerateError> {
    let path = root.join(doc_id).join(PAGE_FILENAME);
    fs::write(&path, html)?;
    info!(doc = doc_id, path = %path.display(), "generated page");
    Ok(path)
}

// ============================================================================
// Listing feeds
// ============================================================================

/// The container and per-entry templates of one feed format.
#[derive(Debug, Clone)]
pub struct FeedTemplates {
    pub format: FeedFormat,
    pub entire: String,
    pub item: String,
}

impl FeedTemplates {
    /// Directory holding the templates of `format`.
    pub fn dir(templates_dir: &Path, format: FeedFormat) -> PathBuf {
        templates_dir.join("indices").join(format.as_str())
    }

    pub fn load(templates_dir: &Path, format: FeedFormat) -> Result<Self, GenerateError> {
        let dir = Self::dir(templates_dir, format);
        Ok(Self {
            format,
            entire: read_template(dir.join("entire"))?,
            item: read_template(dir.join("item"))?,
        })
    }
}

fn render_feed_item(template: &str, doc: &DocumentMetadata) -> String {
    Substitution::new()
        .token("URL", encode_uri(&doc.url))
        .token("TITLE", doc.title.as_str())
        .token("AUTHOR", doc.author.display_name.as_str())
        .token("BTIME", iso_time(&doc.published))
        .token("PUBLISHED", http_time(&doc.published))
        .token("MTIME", iso_time(&doc.updated))
        .token("UPDATED", http_time(&doc.updated))
        .apply(template)
}

/// Expand a feed: one item per index entry, in index order, inside the
/// container template.
pub fn render_feed(templates: &FeedTemplates, index: &LibraryIndex) -> String {
    let entries: Vec<String> = index
        .entries()
        .iter()
        .map(|doc| render_feed_item(&templates.item, doc))
        .collect();
    let entries = entries.join("\n");

    Substitution::new()
        .token("TITLE", index.title.as_str())
        .token("URL", encode_uri(&index.url))
        .token("EDITOR", index.editor.display_name.as_str())
        .token("CONTACT", encode_uri(index.editor.contact()))
        .token("MTIME", iso_time(&index.updated))
        .token("UPDATED", http_time(&index.updated))
        .token_once("ENTRIES", entries.trim())
        .apply(&templates.entire)
}

/// Read the templates of every feed in `formats`.
pub fn load_feeds(
    templates_dir: &Path,
    formats: &[FeedFormat],
) -> Result<Vec<FeedTemplates>, GenerateError> {
    formats
        .iter()
        .map(|&format| FeedTemplates::load(templates_dir, format))
        .collect()
}

/// Write each feed to `<root>/index.<format>`.
pub fn write_feeds(
    root: &Path,
    feeds: &[FeedTemplates],
    index: &LibraryIndex,
) -> Result<Vec<PathBuf>, GenerateError> {
    let mut written = Vec::with_capacity(feeds.len());
    for feed in feeds {
        let path = root.join(feed.format.output_filename());
        fs::write(&path, render_feed(feed, index))?;
        info!(format = %feed.format, entries = index.len(), "wrote feed");
        written.push(path);
    }
    Ok(written)
}

// ============================================================================
// Stock templates
// ============================================================================

/// A template file `init` can scaffold, relative to the template directory.
#[derive(Debug, Clone)]
pub struct StockTemplate {
    pub path: PathBuf,
    pub content: String,
}

/// The starter template set: the page template plus both templates of every
/// feed format.
pub fn stock_templates() -> Vec<StockTemplate> {
    let mut templates = vec![StockTemplate {
        path: PathBuf::from(DOC_TEMPLATE),
        content: stock_doc_page().into_string() + "\n",
    }];
    for format in FeedFormat::ALL {
        let (entire, item) = match format {
            FeedFormat::Html => (
                stock_html_listing().into_string() + "\n",
                stock_html_item().into_string() + "\n",
            ),
            FeedFormat::Rss => (RSS_ENTIRE.to_string(), RSS_ITEM.to_string()),
            FeedFormat::Atom => (ATOM_ENTIRE.to_string(), ATOM_ITEM.to_string()),
        };
        let dir = Path::new("indices").join(format.as_str());
        templates.push(StockTemplate {
            path: dir.join("entire"),
            content: entire,
        });
        templates.push(StockTemplate {
            path: dir.join("item"),
            content: item,
        });
    }
    templates
}

fn stock_head(title: &str) -> Markup {
    html! {
        meta charset="UTF-8";
        meta name="viewport" content="width=device-width, initial-scale=1.0";
        title { (title) }
        link rel="alternate" type="application/rss+xml" href="$LIBURL$index.rss";
        link rel="alternate" type="application/atom+xml" href="$LIBURL$index.atom";
    }
}

fn stock_doc_page() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                (stock_head("$TITLE$ - $LIBTITLE$"))
                link rel="canonical" href="$PERMALINK$";
            }
            body {
                header { a href="$LIBURL$" { "$LIBTITLE$" } }
                article {
                    h1 { "$TITLE$" }
                    p.byline {
                        a href="$CONTACT$" { "$AUTHOR$" }
                        ", "
                        time datetime="$BTIME$" { "$PUBLISHED$" }
                    }
                    (PreEscaped("\n$BODY$\n"))
                }
                footer {
                    "Last updated "
                    time datetime="$MTIME$" { "$UPDATED$" }
                }
            }
        }
    }
}

fn stock_html_listing() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "$TITLE$" }
                link rel="alternate" type="application/rss+xml" href="$URL$index.rss";
                link rel="alternate" type="application/atom+xml" href="$URL$index.atom";
            }
            body {
                h1 { "$TITLE$" }
                ul.entries { (PreEscaped("\n$ENTRIES$\n")) }
                footer {
                    "Edited by "
                    a href="$CONTACT$" { "$EDITOR$" }
                    ", last updated "
                    time datetime="$MTIME$" { "$UPDATED$" }
                }
            }
        }
    }
}

fn stock_html_item() -> Markup {
    html! {
        li {
            a href="$URL$" { "$TITLE$" }
            " "
            time datetime="$MTIME$" { "$UPDATED$" }
        }
    }
}

const RSS_ENTIRE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>$TITLE$</title>
<link>$URL$</link>
<description>$TITLE$</description>
<managingEditor>$EDITOR$</managingEditor>
<lastBuildDate>$UPDATED$</lastBuildDate>
$ENTRIES$
</channel>
</rss>
"#;

const RSS_ITEM: &str = r#"<item>
<title>$TITLE$</title>
<link>$URL$</link>
<guid>$URL$</guid>
<author>$AUTHOR$</author>
<pubDate>$PUBLISHED$</pubDate>
</item>
"#;

const ATOM_ENTIRE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>$TITLE$</title>
<id>$URL$</id>
<link href="$URL$"/>
<link rel="self" href="$URL$index.atom"/>
<updated>$MTIME$</updated>
<author><name>$EDITOR$</name><uri>$CONTACT$</uri></author>
$ENTRIES$
</feed>
"#;

const ATOM_ITEM: &str = r#"<entry>
<title>$TITLE$</title>
<id>$URL$</id>
<link href="$URL$"/>
<published>$BTIME$</published>
<updated>$MTIME$</updated>
<author><name>$AUTHOR$</name></author>
</entry>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use crate::types::{CONTENT_TYPE_HTML, Identity};
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 14, 5, 0).unwrap()
    }

    fn library(resources: Vec<DocumentMetadata>) -> LibraryIndex {
        let mut config = LibraryConfig::default();
        config.library.url = "https://example.org/my lib".to_string();
        config.library.title = "Shelf".to_string();
        config.user.display_name = "Ada".to_string();
        config.user.uris = vec!["mailto:ada@example.org".to_string()];
        LibraryIndex::new(&config, at(9), resources)
    }

    fn doc(id: &str, title: &str) -> DocumentMetadata {
        DocumentMetadata {
            url: format!("https://example.org/my lib/{id}/"),
            title: title.to_string(),
            content_type: CONTENT_TYPE_HTML.to_string(),
            author: Identity {
                display_name: "Grace".to_string(),
                uris: vec!["https://grace.example/é".to_string()],
            },
            published: at(1),
            updated: at(2),
        }
    }

    fn feed(entire: &str, item: &str) -> FeedTemplates {
        FeedTemplates {
            format: FeedFormat::Html,
            entire: entire.to_string(),
            item: item.to_string(),
        }
    }

    // =========================================================================
    // Document pages
    // =========================================================================

    #[test]
    fn render_document_expands_page_tokens() {
        let template = "$PERMALINK$|$TITLE$|$AUTHOR$|$CONTACT$|$BTIME$|$PUBLISHED$|\
                        $MTIME$|$UPDATED$|$BODY$|$LIBURL$|$LIBTITLE$";
        let out = render_document(template, &library(vec![]), &doc("a b", "T"), "<p>x</p>");
        assert_eq!(
            out,
            "https://example.org/my%20lib/a%20b/|T|Grace|https://grace.example/%C3%A9|\
             2024-03-01T14:05:00.000Z|Fri, 01 Mar 2024 14:05:00 GMT|\
             2024-03-02T14:05:00.000Z|Sat, 02 Mar 2024 14:05:00 GMT|<p>x</p>|\
             https://example.org/my%20lib/|Shelf"
        );
    }

    #[test]
    fn render_document_without_contact_is_empty() {
        let mut meta = doc("a", "T");
        meta.author.uris.clear();
        let out = render_document("[$CONTACT$]", &library(vec![]), &meta, "");
        assert_eq!(out, "[]");
    }

    #[test]
    fn render_document_is_deterministic() {
        let lib = library(vec![]);
        let meta = doc("a", "T");
        let first = render_document("<h1>$TITLE$</h1>$BODY$", &lib, &meta, "<p>b</p>");
        let second = render_document("<h1>$TITLE$</h1>$BODY$", &lib, &meta, "<p>b</p>");
        assert_eq!(first, second);
    }

    #[test]
    fn body_containing_tokens_is_not_expanded() {
        let out = render_document("$BODY$", &library(vec![]), &doc("a", "T"), "cost: $TITLE$");
        assert_eq!(out, "cost: $TITLE$");
    }

    #[test]
    fn write_document_targets_doc_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("notes/a")).unwrap();
        let path = write_document(tmp.path(), "notes/a", "<p>page</p>").unwrap();
        assert_eq!(path, tmp.path().join("notes/a/index.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>page</p>");
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    #[test]
    fn render_feed_joins_items_in_index_order() {
        let lib = library(vec![doc("b", "Second"), doc("a", "First")]);
        let out = render_feed(&feed("<ul>$ENTRIES$</ul>", "<li>$TITLE$</li>\n"), &lib);
        assert_eq!(out, "<ul><li>Second</li>\n\n<li>First</li></ul>");
    }

    #[test]
    fn render_feed_expands_container_tokens() {
        let lib = library(vec![]);
        let out = render_feed(
            &feed("$TITLE$|$URL$|$EDITOR$|$CONTACT$|$MTIME$|$UPDATED$", ""),
            &lib,
        );
        assert_eq!(
            out,
            "Shelf|https://example.org/my%20lib/|Ada|mailto:ada@example.org|\
             2024-03-09T14:05:00.000Z|Sat, 09 Mar 2024 14:05:00 GMT"
        );
    }

    #[test]
    fn render_feed_item_tokens() {
        let lib = library(vec![doc("x", "X")]);
        let out = render_feed(
            &feed("$ENTRIES$", "$URL$|$TITLE$|$AUTHOR$|$BTIME$|$PUBLISHED$|$MTIME$|$UPDATED$"),
            &lib,
        );
        assert_eq!(
            out,
            "https://example.org/my%20lib/x/|X|Grace|2024-03-01T14:05:00.000Z|\
             Fri, 01 Mar 2024 14:05:00 GMT|2024-03-02T14:05:00.000Z|\
             Sat, 02 Mar 2024 14:05:00 GMT"
        );
    }

    #[test]
    fn entries_inserted_at_first_placeholder_only() {
        let lib = library(vec![doc("a", "A")]);
        let out = render_feed(&feed("$ENTRIES$ and $ENTRIES$", "$TITLE$"), &lib);
        assert_eq!(out, "A and $ENTRIES$");
    }

    #[test]
    fn empty_index_renders_empty_entries() {
        let out = render_feed(&feed("<ul>$ENTRIES$</ul>", "<li>$TITLE$</li>"), &library(vec![]));
        assert_eq!(out, "<ul></ul>");
    }

    #[test]
    fn item_titles_with_tokens_stay_literal() {
        let lib = library(vec![doc("a", "$ENTRIES$")]);
        let out = render_feed(&feed("[$ENTRIES$]", "$TITLE$"), &lib);
        assert_eq!(out, "[$ENTRIES$]");
    }

    #[test]
    fn write_feeds_writes_each_format() {
        let tmp = TempDir::new().unwrap();
        let templates = tmp.path().join("templates");
        for format in FeedFormat::ALL {
            let dir = FeedTemplates::dir(&templates, format);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("entire"), format!("{format}:$ENTRIES$")).unwrap();
            fs::write(dir.join("item"), "$TITLE$").unwrap();
        }
        let lib = library(vec![doc("a", "A")]);

        let feeds = load_feeds(&templates, &FeedFormat::ALL).unwrap();
        let written = write_feeds(tmp.path(), &feeds, &lib).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(tmp.path().join("index.rss")).unwrap(), "rss:A");
        assert_eq!(fs::read_to_string(tmp.path().join("index.atom")).unwrap(), "atom:A");
        assert_eq!(fs::read_to_string(tmp.path().join("index.html")).unwrap(), "html:A");
    }

    #[test]
    fn load_feeds_reports_missing_template() {
        let tmp = TempDir::new().unwrap();
        let templates = tmp.path().join("templates");
        let html_dir = FeedTemplates::dir(&templates, FeedFormat::Html);
        fs::create_dir_all(&html_dir).unwrap();
        fs::write(html_dir.join("entire"), "$ENTRIES$").unwrap();
        fs::write(html_dir.join("item"), "$TITLE$").unwrap();

        assert_eq!(load_feeds(&templates, &[FeedFormat::Html]).unwrap().len(), 1);
        let err = load_feeds(&templates, &[FeedFormat::Html, FeedFormat::Rss]).unwrap_err();
        assert!(matches!(&err, GenerateError::Template { path, .. } if path.ends_with("rss/entire")));
    }

    // =========================================================================
    // Stock templates
    // =========================================================================

    #[test]
    fn stock_templates_cover_doc_and_every_feed() {
        let paths: Vec<PathBuf> = stock_templates().into_iter().map(|t| t.path).collect();
        assert!(paths.contains(&PathBuf::from("doc")));
        for format in FeedFormat::ALL {
            let dir = Path::new("indices").join(format.as_str());
            assert!(paths.contains(&dir.join("entire")), "missing {format} entire");
            assert!(paths.contains(&dir.join("item")), "missing {format} item");
        }
        assert_eq!(paths.len(), 7);
    }

    #[test]
    fn stock_doc_template_keeps_tokens_raw() {
        let doc_template = stock_doc_page().into_string();
        assert!(doc_template.starts_with("<!DOCTYPE html>"));
        assert!(doc_template.contains("\n$BODY$\n"));
        assert!(doc_template.contains(r#"href="$PERMALINK$""#));
        assert!(doc_template.contains("<title>$TITLE$ - $LIBTITLE$</title>"));
    }

    #[test]
    fn stock_templates_render_completely() {
        let lib = library(vec![doc("a", "A")]);
        let stock = stock_templates();
        let find = |p: &str| {
            stock
                .iter()
                .find(|t| t.path == Path::new(p))
                .map(|t| t.content.clone())
                .unwrap()
        };

        let page = render_document(&find("doc"), &lib, &lib.entries()[0], "<p>hi</p>");
        assert!(page.contains("<p>hi</p>"));
        assert!(!page.contains('$'), "unexpanded token in page: {page}");

        for format in FeedFormat::ALL {
            let dir = format!("indices/{format}");
            let templates = FeedTemplates {
                format,
                entire: find(&format!("{dir}/entire")),
                item: find(&format!("{dir}/item")),
            };
            let out = render_feed(&templates, &lib);
            assert!(!out.contains('$'), "unexpanded token in {format} feed: {out}");
            assert!(out.contains("https://example.org/my%20lib/a/"));
        }
    }
}
