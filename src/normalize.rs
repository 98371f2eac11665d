//! Raw item → [`NormalizedRecord`] conversion driven by a source's path rules.

use crate::config::SourceConfig;
use crate::models::{API_SCORE, API_SOURCE_TAG, CONTENT_CAP, NormalizedRecord};
use crate::path::resolve_str;
use crate::template::Placeholders;
use crate::utils::truncate_chars;
use serde_json::Value;
use tracing::debug;

/// Normalize one raw item, or `None` when it has no usable title.
pub fn normalize_item(item: &Value, source: &SourceConfig) -> Option<NormalizedRecord> {
    let title = resolve_str(item, &source.title_path);
    if title.is_empty() {
        return None;
    }

    let summary = resolve_str(item, &source.summary_path);
    let id = resolve_str(item, &source.id_path);
    let url = if id.is_empty() {
        String::new()
    } else {
        Placeholders::for_item(id).apply(&source.url_template)
    };

    Some(NormalizedRecord {
        title,
        content: truncate_chars(&summary, CONTENT_CAP),
        url,
        score: API_SCORE,
        source_tag: API_SOURCE_TAG.to_string(),
    })
}

/// Normalize every item of a source, preserving order and dropping untitled
/// ones.
pub fn normalize_items(items: &[Value], source: &SourceConfig) -> Vec<NormalizedRecord> {
    let records: Vec<NormalizedRecord> = items
        .iter()
        .filter_map(|item| normalize_item(item, source))
        .collect();
    let dropped = items.len() - records.len();
    if dropped > 0 {
        debug!(source = %source.name, dropped, "Dropped items without a title");
    }
    records
}
