//! Shared types persisted in `index.json` and consumed by every stage.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// The only content type documents are published as.
pub const CONTENT_TYPE_HTML: &str = "text/html";

/// A person: the library editor or a document author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    /// Contact URIs; the first one is what templates show.
    #[serde(default)]
    pub uris: Vec<String>,
}

impl Identity {
    /// Primary contact URI, or empty when none is configured.
    pub fn contact(&self) -> &str {
        self.uris.first().map(String::as_str).unwrap_or_default()
    }
}

/// One entry of the library index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Permalink: library base URL + document id + `/`. Unique within an index.
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub author: Identity,
    #[serde(serialize_with = "serialize_millis")]
    pub published: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub updated: DateTime<Utc>,
}

/// Write an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`, milliseconds always present.
pub fn serialize_millis<S: Serializer>(
    at: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// The current instant at the millisecond precision stored in the index.
pub fn current_instant() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
