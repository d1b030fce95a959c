//! Library configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the CMS directory (`cms/config.toml` by default) and is layered on top of
//! the stock defaults, so it only needs the keys that differ.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [library]
//! url = "https://example.org/"   # Base URL every permalink is built on
//! title = "Librarium"            # Library title ($LIBTITLE$, feed titles)
//!
//! [user]
//! display_name = "Anonymous"     # Editor and author of new documents
//! uris = []                      # First entry becomes $CONTACT$
//!
//! [feeds]
//! formats = ["html", "rss", "atom"]  # Listing feeds regenerated after each change
//! ```
//!
//! Unknown keys are rejected to catch typos early. The config is loaded once
//! per invocation and handed by reference to everything that needs it.

use crate::naming;
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the CMS directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Library configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Where the library is published and what it is called.
    pub library: LibrarySection,
    /// Identity recorded as editor of the index and author of new documents.
    pub user: UserConfig,
    /// Listing feeds to regenerate.
    pub feeds: FeedsConfig,
}

impl LibraryConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "library.url must not be empty".into(),
            ));
        }
        if self.library.url.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "library.url must not contain whitespace".into(),
            ));
        }
        for (i, format) in self.feeds.formats.iter().enumerate() {
            if self.feeds.formats[..i].contains(format) {
                return Err(ConfigError::Validation(format!(
                    "feeds.formats lists \"{format}\" twice"
                )));
            }
        }
        Ok(())
    }

    /// Library URL normalized to end in `/`.
    pub fn base_url(&self) -> String {
        naming::library_base_url(&self.library.url)
    }

    /// The configured user as stored in index entries.
    pub fn identity(&self) -> Identity {
        Identity {
            display_name: self.user.display_name.clone(),
            uris: self.user.uris.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibrarySection {
    pub url: String,
    pub title: String,
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            url: "https://example.org/".to_string(),
            title: "Librarium".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub display_name: String,
    pub uris: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            display_name: "Anonymous".to_string(),
            uris: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedsConfig {
    pub formats: Vec<FeedFormat>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            formats: FeedFormat::ALL.to_vec(),
        }
    }
}

/// A listing feed: templates under `templates/indices/<name>/`, output `index.<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Html,
    Rss,
    Atom,
}

impl FeedFormat {
    pub const ALL: [FeedFormat; 3] = [FeedFormat::Html, FeedFormat::Rss, FeedFormat::Atom];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedFormat::Html => "html",
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "atom",
        }
    }

    /// File the feed is written to, relative to the library root.
    pub fn output_filename(self) -> String {
        format!("index.{}", self.as_str())
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LibraryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LibraryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LibraryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given CMS directory.
pub fn load_config(cms_dir: &Path) -> Result<LibraryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(cms_dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` and `init` commands.
pub fn stock_config_toml() -> &'static str {
    r##"# Librarium Configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Library
# ---------------------------------------------------------------------------
[library]
# Base URL of the published library. Every permalink is this URL followed by
# the document directory and a slash. A missing trailing slash is added.
url = "https://example.org/"

# Library title, available to templates as $LIBTITLE$ and feed $TITLE$.
title = "Librarium"

# ---------------------------------------------------------------------------
# User
# ---------------------------------------------------------------------------
[user]
# Editor of the index and author of every document added from now on.
display_name = "Anonymous"

# Contact URIs. The first one is published as $CONTACT$.
# uris = ["mailto:me@example.org"]
uris = []

# ---------------------------------------------------------------------------
# Feeds
# ---------------------------------------------------------------------------
[feeds]
# Listing feeds rebuilt after every change. Each needs
# templates/indices/<format>/entire and templates/indices/<format>/item.
formats = ["html", "rss", "atom"]
"##
}
