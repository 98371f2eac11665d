//! Declarative configuration: sources, categories and run settings.
//!
//! The whole application is driven by one YAML document:
//!
//! ```yaml
//! version: 1
//! max_items: 20
//! categories:
//!   LLMs: ["GPT", "Claude", "Gemini"]
//! sources:
//!   daily:
//!     - name: aibase
//!       endpoint: https://api.example.com/news
//!       params: { page: "{page}", t: "{ts}" }
//!       list_path: data.list
//!       title_path: title
//!       summary_path: description
//!       id_path: oid
//!       url_template: https://example.com/news/{oid}
//! ```
//!
//! Mapping order is significant for `sources` and `categories`, so both are
//! read into ordered lists rather than hash maps. Unknown keys are ignored
//! everywhere.

use crate::classify::CategoryTable;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Highest configuration schema version this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

pub const DEFAULT_MAX_PAGES: u32 = 3;

/// Browser-like identification sent with every source request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// HTTP method of a source endpoint.
///
/// Anything other than `POST` (in any case) is treated as `GET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("post") {
            Method::Post
        } else {
            Method::Get
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One configured content source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SourceEntry")]
pub struct SourceConfig {
    pub name: String,
    pub enabled: bool,
    pub endpoint: String,
    pub method: Method,
    pub headers: Map<String, Value>,
    pub params: Map<String, Value>,
    pub body_template: Option<String>,
    pub list_path: String,
    pub title_path: String,
    pub summary_path: String,
    pub id_path: String,
    pub url_template: String,
    pub max_pages: u32,
}

impl SourceConfig {
    /// An enabled GET source with default paths.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let request = RequestSpec {
            endpoint: endpoint.into(),
            ..RequestSpec::default()
        };
        Self::from_parts(name.into(), true, request)
    }

    /// The body template for POST sources.
    ///
    /// Falls back to a string `json` param, then to an empty object.
    pub fn post_body_template(&self) -> &str {
        self.body_template
            .as_deref()
            .or_else(|| self.params.get("json").and_then(Value::as_str))
            .unwrap_or("{}")
    }

    fn from_parts(name: String, enabled: bool, r: RequestSpec) -> Self {
        Self {
            name,
            enabled,
            endpoint: r.endpoint,
            method: r.method,
            headers: r.headers,
            params: r.params,
            body_template: r.body_template,
            list_path: r.list_path,
            title_path: r.title_path,
            summary_path: r.summary_path,
            id_path: r.id_path,
            url_template: r.url_template,
            max_pages: r.max_pages,
        }
    }
}

/// On-disk shape of a source entry.
///
/// Request fields may sit inline or be nested under `api:` or `pagination:`;
/// a nested block takes precedence over inline fields.
#[derive(Deserialize)]
struct SourceEntry {
    #[serde(default)]
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    api: Option<RequestSpec>,
    #[serde(default)]
    pagination: Option<RequestSpec>,
    #[serde(flatten)]
    inline: RequestSpec,
}

impl From<SourceEntry> for SourceConfig {
    fn from(e: SourceEntry) -> Self {
        let request = e.api.or(e.pagination).unwrap_or(e.inline);
        SourceConfig::from_parts(e.name, e.enabled, request)
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RequestSpec {
    #[serde(alias = "api_url")]
    endpoint: String,
    method: Method,
    headers: Map<String, Value>,
    params: Map<String, Value>,
    body_template: Option<String>,
    list_path: String,
    title_path: String,
    summary_path: String,
    #[serde(alias = "oid_path")]
    id_path: String,
    url_template: String,
    max_pages: u32,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            method: Method::Get,
            headers: Map::new(),
            params: Map::new(),
            body_template: None,
            list_path: "data".into(),
            title_path: "title".into(),
            summary_path: "description".into(),
            id_path: "oid".into(),
            url_template: String::new(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A named, ordered list of sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
    pub name: String,
    pub sources: Vec<SourceConfig>,
}

/// Source groups in declared order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "OrderedMap<Option<Vec<SourceConfig>>>")]
pub struct SourceGroups(Vec<SourceGroup>);

impl SourceGroups {
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self(groups)
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.0
    }

    /// Every source in group-then-source order, disabled ones included.
    pub fn sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.0.iter().flat_map(|g| g.sources.iter())
    }
}

impl From<OrderedMap<Option<Vec<SourceConfig>>>> for SourceGroups {
    fn from(map: OrderedMap<Option<Vec<SourceConfig>>>) -> Self {
        Self(
            map.0
                .into_iter()
                .map(|(name, sources)| SourceGroup {
                    name,
                    sources: sources.unwrap_or_default(),
                })
                .collect(),
        )
    }
}

/// A YAML/JSON mapping read as key/value pairs in document order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderedMap<V>(pub(crate) Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap(Vec::new()))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    entries.push((k, v));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

/// Settings for the search-provider pass of the daily run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub topics: Vec<String>,
    pub depth: String,
    pub max_results: usize,
    pub query_suffix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            topics: [
                "AI 大模型",
                "GPT",
                "Claude",
                "Gemini",
                "OpenAI",
                "Anthropic",
                "Google AI",
                "Microsoft AI",
                "Meta AI",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            depth: "basic".into(),
            max_results: 10,
            query_suffix: "AI news".into(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub max_items: usize,
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub search: SearchConfig,
    pub categories: CategoryTable,
    pub sources: SourceGroups,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            max_items: 20,
            concurrency: 4,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.into(),
            search: SearchConfig::default(),
            categories: CategoryTable::default(),
            sources: SourceGroups::default(),
        }
    }
}

/// Parse a configuration document.
pub fn parse_config(text: &str) -> Result<AppConfig, Box<dyn Error>> {
    let config: AppConfig = serde_yaml::from_str(text)?;
    if config.version > SUPPORTED_VERSION {
        warn!(
            version = config.version,
            supported = SUPPORTED_VERSION,
            "Config schema is newer than this build; unknown fields are ignored"
        );
    }
    Ok(config)
}

/// Read and parse the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid
/// configuration document.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_config(path: &Path) -> Result<AppConfig, Box<dyn Error>> {
    let text = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&text)?;
    info!(
        groups = config.sources.groups().len(),
        sources = config.sources.sources().count(),
        categories = config.categories.len(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_defaults() {
        let groups: SourceGroups = serde_yaml::from_str(
            r#"
daily:
  - name: minimal
    endpoint: https://x/api
"#,
        )
        .unwrap();
        let s = &groups.groups()[0].sources[0];
        assert!(s.enabled);
        assert_eq!(s.method, Method::Get);
        assert_eq!(s.list_path, "data");
        assert_eq!(s.title_path, "title");
        assert_eq!(s.summary_path, "description");
        assert_eq!(s.id_path, "oid");
        assert_eq!(s.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_groups_keep_declared_order() {
        let groups: SourceGroups = serde_yaml::from_str(
            r#"
web:
  - name: w1
daily:
  - name: d1
  - name: d2
empty:
"#,
        )
        .unwrap();
        let names: Vec<_> = groups.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["web", "daily", "empty"]);
        let sources: Vec<_> = groups.sources().map(|s| s.name.as_str()).collect();
        assert_eq!(sources, vec!["w1", "d1", "d2"]);
    }

    #[test]
    fn test_nested_api_block_and_aliases() {
        let groups: SourceGroups = serde_yaml::from_str(
            r#"
daily:
  - name: nested
    enabled: false
    api:
      api_url: https://x/api
      method: post
      oid_path: item.id
      max_pages: 5
      params:
        size: 20
        json: '{"page": {page}}'
"#,
        )
        .unwrap();
        let s = &groups.groups()[0].sources[0];
        assert!(!s.enabled);
        assert_eq!(s.endpoint, "https://x/api");
        assert_eq!(s.method, Method::Post);
        assert_eq!(s.id_path, "item.id");
        assert_eq!(s.max_pages, 5);
        assert_eq!(s.params.get("size"), Some(&json!(20)));
        assert_eq!(s.post_body_template(), r#"{"page": {page}}"#);
    }

    #[test]
    fn test_pagination_block_is_accepted() {
        let groups: SourceGroups = serde_yaml::from_str(
            r#"
web:
  - name: paged
    pagination:
      endpoint: https://y/api
      list_path: result.rows
"#,
        )
        .unwrap();
        let s = &groups.groups()[0].sources[0];
        assert_eq!(s.endpoint, "https://y/api");
        assert_eq!(s.list_path, "result.rows");
    }

    #[test]
    fn test_body_template_preferred_over_json_param() {
        let mut s = SourceConfig::new("s", "https://x");
        assert_eq!(s.post_body_template(), "{}");
        s.params.insert("json".into(), json!("{\"a\":1}"));
        assert_eq!(s.post_body_template(), "{\"a\":1}");
        s.body_template = Some("{\"b\":2}".into());
        assert_eq!(s.post_body_template(), "{\"b\":2}");
    }

    #[test]
    fn test_parse_config_ignores_unknown_fields() {
        let config = parse_config(
            r#"
version: 2
shiny_new_option: true
max_items: 5
categories:
  LLMs: [GPT]
  Chips: [Nvidia]
sources:
  daily:
    - name: a
      endpoint: https://a
      future_field: 1
"#,
        )
        .unwrap();
        assert_eq!(config.max_items, 5);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.sources.sources().count(), 1);
        assert_eq!(config.search.max_results, 10);
    }

    #[test]
    fn test_method_parsing_is_lenient() {
        assert_eq!(Method::from("POST".to_string()), Method::Post);
        assert_eq!(Method::from(" post ".to_string()), Method::Post);
        assert_eq!(Method::from("get".to_string()), Method::Get);
        assert_eq!(Method::from("PATCH".to_string()), Method::Get);
    }
}
