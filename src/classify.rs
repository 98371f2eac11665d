//! First-match keyword classification of records into report categories.

use crate::config::OrderedMap;
use serde::Deserialize;

/// Category given to records that match no configured keyword.
pub const DEFAULT_CATEGORY: &str = "Other";

/// One category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered category → keywords table.
///
/// Both category order and keyword order are kept exactly as configured;
/// classification is first match, not best match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OrderedMap<Vec<String>>")]
pub struct CategoryTable(Vec<Category>);

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self(categories)
    }

    /// Convenience constructor from `(name, keywords)` pairs.
    pub fn from_pairs<'a, I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, K)>,
        K: IntoIterator<Item = &'a str>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(name, keywords)| Category {
                    name: name.to_string(),
                    keywords: keywords.into_iter().map(String::from).collect(),
                })
                .collect(),
        )
    }

    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<OrderedMap<Vec<String>>> for CategoryTable {
    fn from(map: OrderedMap<Vec<String>>) -> Self {
        Self(
            map.0
                .into_iter()
                .map(|(name, keywords)| Category { name, keywords })
                .collect(),
        )
    }
}

/// Assign `title` + `content` to exactly one category.
///
/// Matching is a case-insensitive substring test against the title and
/// content joined by a space. Empty keywords never match.
pub fn classify<'a>(title: &str, content: &str, table: &'a CategoryTable) -> &'a str {
    let haystack = format!("{title} {content}").to_lowercase();
    table
        .0
        .iter()
        .find(|category| {
            category
                .keywords
                .iter()
                .filter(|k| !k.is_empty())
                .any(|k| haystack.contains(&k.to_lowercase()))
        })
        .map(|category| category.name.as_str())
        .unwrap_or(DEFAULT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CategoryTable {
        CategoryTable::from_pairs([
            ("大模型", vec!["GPT", "Claude", "大模型"]),
            ("Chips", vec!["nvidia", "GPU"]),
            ("Products", vec!["release", "launch"]),
        ])
    }

    #[test]
    fn test_classify_matches_keyword() {
        assert_eq!(classify("OpenAI releases GPT-5", "", &table()), "大模型");
    }

    #[test]
    fn test_classify_falls_back_to_default() {
        assert_eq!(classify("unrelated text", "", &table()), DEFAULT_CATEGORY);
        assert_eq!(classify("anything", "", &CategoryTable::default()), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_first_category_wins_over_later_matches() {
        // "release" (Products) and "GPU" (Chips) both match; Chips is declared first.
        assert_eq!(classify("New GPU release", "", &table()), "Chips");
    }

    #[test]
    fn test_case_insensitive_and_uses_content() {
        assert_eq!(classify("Quarterly results", "NVIDIA beat estimates", &table()), "Chips");
        assert_eq!(classify("claude gets tools", "", &table()), "大模型");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let t = table();
        let first = classify("Gemini launch", "GPT rival", &t);
        let second = classify("Gemini launch", "GPT rival", &t);
        assert_eq!(first, second);
        assert_eq!(first, "大模型");
    }

    #[test]
    fn test_empty_keyword_does_not_match_everything() {
        let t = CategoryTable::from_pairs([("Catch", vec![""]), ("Chips", vec!["gpu"])]);
        assert_eq!(classify("gpu news", "", &t), "Chips");
        assert_eq!(classify("other", "", &t), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_table_deserializes_in_declared_order() {
        let t: CategoryTable = serde_yaml::from_str(
            r#"
Zeta: [z]
Alpha: [a, b]
"#,
        )
        .unwrap();
        let names: Vec<_> = t.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!(t.categories()[1].keywords, vec!["a", "b"]);
    }
}
