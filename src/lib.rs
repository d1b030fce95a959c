//! # Librarium
//!
//! A small CMS for a library of hand-written HTML documents. Each document is
//! a directory with a `source.html`; Librarium reads its title and body,
//! keeps an ordered index of every published document, renders each one
//! through a page template and rebuilds HTML, RSS and Atom listings.
//!
//! # Architecture: One Operation per Run
//!
//! Every invocation loads the config and the index, runs one lifecycle
//! operation in memory, then writes the results:
//!
//! ```text
//! source.html ─► scan ─► extract ─► index ─► generate ─► index.json
//!                (title, body)      (order)   (template)   <doc>/index.html
//!                                                          index.{html,rss,atom}
//! ```
//!
//! Nothing is written until every precondition has been checked and every
//! source and template has been read, so a failed operation leaves the
//! library as it was.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Head/body boundary scanner for loosely-formed HTML: title text and body range |
//! | [`extract`] | Turns one source document into index metadata plus its body fragment |
//! | [`index`] | The ordered, unique-by-URL document index and its `index.json` persistence |
//! | [`template`] | Single-pass `$TOKEN$` substitution, URI encoding and date formats |
//! | [`generate`] | Page and feed rendering from the CMS templates, plus the stock template set |
//! | [`lifecycle`] | The `add`/`index`/`remove`/`update`/`popup`/`reform`/`renovate` operations and `init` |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`naming`] | Document id, permalink and directory conventions |
//! | [`types`] | Shared serialized types (`DocumentMetadata`, `Identity`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No HTML Parser
//!
//! Source documents are fragments people type by hand: `<html>`, `<head>` and
//! `<body>` are optional and often missing. A tree-building parser would
//! normalize them into something else. The [`scan`] module instead walks the
//! head region with a small explicit state machine and takes the rest of the
//! document verbatim, so the body that ends up on the page is byte-for-byte
//! what the author wrote.
//!
//! ## Templates on Disk
//!
//! Page and feed templates are plain text files under `cms/templates/`, not
//! compiled in, so a library can change its look without a new binary. The
//! stock set that `init` writes is generated with Maud.
//!
//! ## The Index Is the Source of Order
//!
//! The filesystem says which documents exist; `index.json` says which are
//! published and in what order. New and promoted documents go to the front,
//! and every listing follows the index order.

pub mod config;
pub mod extract;
pub mod generate;
pub mod index;
pub mod lifecycle;
pub mod naming;
pub mod output;
pub mod scan;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
