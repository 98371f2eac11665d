//! Assembly of a day's [`AggregatedBatch`] from collected and searched records.

use crate::classify::{CategoryTable, classify};
use crate::models::{AggregatedBatch, ClassifiedRecord, NormalizedRecord};
use crate::search::TopicSearch;

/// Attach a category to every record, keeping order.
pub fn classify_records(records: Vec<NormalizedRecord>, table: &CategoryTable) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| {
            let category = classify(&record.title, &record.content, table).to_string();
            ClassifiedRecord { record, category }
        })
        .collect()
}

/// Build the day's batch: engine records first, then search hits.
pub fn build_batch(
    date: &str,
    collected: Vec<NormalizedRecord>,
    searched: TopicSearch,
    table: &CategoryTable,
) -> AggregatedBatch {
    let mut records = collected;
    records.extend(searched.records);
    AggregatedBatch {
        date: date.to_string(),
        highlight: searched.highlight,
        articles: classify_records(records, table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DEFAULT_CATEGORY;
    use crate::models::{API_SCORE, API_SOURCE_TAG, SEARCH_SOURCE_TAG};

    fn record(title: &str, tag: &str, score: f64) -> NormalizedRecord {
        NormalizedRecord {
            title: title.into(),
            content: String::new(),
            url: String::new(),
            score,
            source_tag: tag.into(),
        }
    }

    #[test]
    fn test_build_batch_merges_and_classifies() {
        let table = CategoryTable::from_pairs([("大模型", vec!["GPT"])]);
        let collected = vec![record("OpenAI releases GPT-5", API_SOURCE_TAG, API_SCORE)];
        let searched = TopicSearch {
            records: vec![record("unrelated text", SEARCH_SOURCE_TAG, 0.42)],
            highlight: Some("Answer".into()),
        };

        let batch = build_batch("2025-05-06", collected, searched, &table);
        assert_eq!(batch.date, "2025-05-06");
        assert_eq!(batch.highlight.as_deref(), Some("Answer"));
        assert_eq!(batch.articles.len(), 2);
        assert_eq!(batch.articles[0].category, "大模型");
        assert_eq!(batch.articles[0].record.source_tag, API_SOURCE_TAG);
        assert_eq!(batch.articles[1].category, DEFAULT_CATEGORY);
        assert_eq!(batch.articles[1].record.score, 0.42);
    }

    #[test]
    fn test_classification_leaves_record_untouched() {
        let table = CategoryTable::from_pairs([("Chips", vec!["gpu"])]);
        let plain = record("New GPU", API_SOURCE_TAG, API_SCORE);
        let classified = classify_records(vec![plain.clone()], &table);
        assert_eq!(classified[0].record, plain);
        assert_eq!(classified[0].category, "Chips");
    }
}
