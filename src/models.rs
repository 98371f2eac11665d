//! Data models shared by the collector, the search pass and the outputs.
//!
//! - [`NormalizedRecord`]: the uniform shape every source is reduced to
//! - [`ClassifiedRecord`]: a record plus the category the classifier gave it
//! - [`AggregatedBatch`]: one day's records as persisted and reported

use serde::{Deserialize, Serialize};

/// Tag for records produced by the config-driven fetch engine.
pub const API_SOURCE_TAG: &str = "api";

/// Tag for records that came from the search provider.
pub const SEARCH_SOURCE_TAG: &str = "search";

/// Score given to every engine-fetched record; sources carry no native score.
pub const API_SCORE: f64 = 0.9;

/// Maximum number of characters kept in [`NormalizedRecord::content`].
pub const CONTENT_CAP: usize = 200;

/// A news item in source-independent form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub content: String,
    /// Canonical URL, empty when the item had no identifier.
    pub url: String,
    pub score: f64,
    pub source_tag: String,
}

impl NormalizedRecord {
    /// Host part of [`url`](Self::url), e.g. `"www.aibase.com"`.
    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// A record with its report category attached.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub category: String,
}

/// One day's collection: what the daily run persists and the monthly report
/// reads back.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggregatedBatch {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// First non-empty answer returned by the search provider, if any.
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub articles: Vec<ClassifiedRecord>,
}
