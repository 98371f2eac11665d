//! Search-provider client with exponential backoff retry logic.
//!
//! The daily run supplements the config-driven sources with a topic search:
//! one query per configured topic, each returning an optional free-text
//! answer and a ranked list of results.
//!
//! # Architecture
//!
//! - [`SearchProvider`]: core trait for a topic search
//! - [`TavilyClient`]: HTTP implementation against the Tavily search API
//! - [`RetrySearch`]: decorator that adds retry logic to any provider
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at the base delay, doubling per attempt
//! - Delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Only the search pass retries; source fetching never does.

use crate::config::SearchConfig;
use crate::models::{CONTENT_CAP, NormalizedRecord, SEARCH_SOURCE_TAG};
use crate::utils::truncate_chars;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// A provider's answer to one query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Trait for async topic search.
#[allow(async_fn_in_trait)]
pub trait SearchProvider {
    /// Run a single query.
    async fn search(&self, query: &str) -> Result<SearchResponse, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`SearchProvider`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetrySearch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetrySearch<T>
where
    T: SearchProvider,
{
    /// Wrap `inner`, retrying up to `max_retries` times after the first
    /// failure.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetrySearch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySearch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> RetrySearch<T> {
    /// Delay before retry number `retry` (1-based), jitter excluded.
    fn backoff(&self, retry: usize) -> StdDuration {
        let shift = retry.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

impl<T> SearchProvider for RetrySearch<T>
where
    T: SearchProvider,
{
    #[instrument(level = "info", skip_all, fields(%query, retries = tracing::field::Empty))]
    async fn search(&self, query: &str) -> Result<SearchResponse, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut retries = 0usize;

        loop {
            let result = self.inner.search(query).await;
            let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;
            match result {
                Ok(resp) => {
                    if retries > 0 {
                        tracing::Span::current().record("retries", retries);
                        info!(retries, elapsed_ms_total, "Search recovered after retrying");
                    }
                    return Ok(resp);
                }
                Err(e) if retries >= self.max_retries => {
                    tracing::Span::current().record("retries", retries);
                    error!(
                        retries,
                        elapsed_ms_total,
                        error = %e,
                        "Search failed; topic will be skipped"
                    );
                    return Err(e);
                }
                Err(e) => {
                    retries += 1;
                    let jitter = StdDuration::from_millis(rng().random_range(0..=250));
                    let delay = self.backoff(retries) + jitter;
                    warn!(
                        retry = retries,
                        max = self.max_retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "Search failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Tavily search API client.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    depth: String,
    max_results: usize,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
    include_raw_content: bool,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, settings: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: TAVILY_ENDPOINT.to_string(),
            api_key: api_key.into(),
            depth: settings.depth.clone(),
            max_results: settings.max_results,
        })
    }

    /// Point the client at a different search URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SearchProvider for TavilyClient {
    #[instrument(level = "info", skip_all, fields(%query))]
    async fn search(&self, query: &str) -> Result<SearchResponse, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.depth,
            max_results: self.max_results,
            include_answer: true,
            include_raw_content: false,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            results = response.results.len(),
            "Search completed"
        );
        Ok(response)
    }
}

/// Records and highlight gathered from a topic search pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicSearch {
    pub records: Vec<NormalizedRecord>,
    /// The first non-empty answer among successful searches.
    pub highlight: Option<String>,
}

/// Query every topic in order, skipping topics whose search fails.
#[instrument(level = "info", skip_all, fields(topics = settings.topics.len()))]
pub async fn search_topics<P: SearchProvider>(provider: &P, settings: &SearchConfig) -> TopicSearch {
    let mut out = TopicSearch::default();

    for topic in &settings.topics {
        let query = format!("{} {}", topic, settings.query_suffix).trim().to_string();
        match provider.search(&query).await {
            Ok(resp) => {
                info!(%topic, results = resp.results.len(), "Topic searched");
                if out.highlight.is_none() {
                    out.highlight = resp.answer.filter(|a| !a.trim().is_empty());
                }
                out.records.extend(resp.results.into_iter().map(|hit| NormalizedRecord {
                    title: hit.title,
                    content: truncate_chars(&hit.content, CONTENT_CAP),
                    url: hit.url,
                    score: hit.score,
                    source_tag: SEARCH_SOURCE_TAG.to_string(),
                }));
            }
            Err(e) => {
                error!(%topic, error = %e, "Topic search failed; skipping");
            }
        }
    }

    out.records.retain(|r| !r.title.is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        responses: Mutex<Vec<Result<SearchResponse, String>>>,
        queries: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(mut responses: Vec<Result<SearchResponse, String>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl SearchProvider for Canned {
        async fn search(&self, query: &str) -> Result<SearchResponse, Box<dyn Error>> {
            self.queries.lock().unwrap().push(query.to_string());
            match self.responses.lock().unwrap().pop() {
                Some(Ok(r)) => Ok(r),
                Some(Err(e)) => Err(e.into()),
                None => Ok(SearchResponse::default()),
            }
        }
    }

    fn hit(title: &str, score: f64) -> SearchHit {
        SearchHit {
            title: title.into(),
            url: format!("https://news.example.com/{title}"),
            content: "x".repeat(300),
            score,
        }
    }

    fn settings(topics: &[&str]) -> SearchConfig {
        SearchConfig {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..SearchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_search_topics_merges_in_topic_order() {
        let provider = Canned::new(vec![
            Err("boom".into()),
            Ok(SearchResponse {
                answer: Some("".into()),
                results: vec![hit("a", 0.5)],
            }),
            Ok(SearchResponse {
                answer: Some("Big week for models".into()),
                results: vec![hit("b", 0.7), hit("", 0.9)],
            }),
        ]);

        let out = search_topics(&provider, &settings(&["GPT", "Claude", "Gemini"])).await;
        let titles: Vec<_> = out.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(out.highlight.as_deref(), Some("Big week for models"));
        assert!(out.records.iter().all(|r| r.content.chars().count() == CONTENT_CAP));
        assert!(out.records.iter().all(|r| r.source_tag == SEARCH_SOURCE_TAG));
        assert_eq!(out.records[1].score, 0.7);
        assert_eq!(
            *provider.queries.lock().unwrap(),
            vec!["GPT AI news", "Claude AI news", "Gemini AI news"]
        );
    }

    #[tokio::test]
    async fn test_retry_search_recovers_after_failures() {
        struct Flaky(AtomicUsize);
        impl SearchProvider for Flaky {
            async fn search(&self, _query: &str) -> Result<SearchResponse, Box<dyn Error>> {
                if self.0.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".into())
                } else {
                    Ok(SearchResponse::default())
                }
            }
        }

        let retry = RetrySearch::new(Flaky(AtomicUsize::new(0)), 3, StdDuration::from_millis(1));
        assert!(retry.search("q").await.is_ok());
        assert_eq!(retry.inner.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_search_gives_up() {
        let retry = RetrySearch::new(
            Canned::new(vec![Err("a".into()), Err("b".into())]),
            1,
            StdDuration::from_millis(1),
        );
        assert!(retry.search("q").await.is_err());
        assert_eq!(retry.inner.queries.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let retry = RetrySearch::new(Canned::new(vec![]), 10, StdDuration::from_secs(4));
        assert_eq!(retry.backoff(1), StdDuration::from_secs(4));
        assert_eq!(retry.backoff(2), StdDuration::from_secs(8));
        assert_eq!(retry.backoff(3), StdDuration::from_secs(16));
        assert_eq!(retry.backoff(4), StdDuration::from_secs(30));
        assert_eq!(retry.backoff(40), StdDuration::from_secs(30));
    }

    #[tokio::test]
    async fn test_tavily_client_posts_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "api_key": "k",
                "query": "GPT AI news",
                "search_depth": "basic",
                "max_results": 10,
                "include_answer": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"answer": "A summary", "results": [{"title": "T", "url": "https://u", "content": "C", "score": 0.81}]}"#,
            )
            .create_async()
            .await;

        let client = TavilyClient::new("k", &SearchConfig::default())
            .unwrap()
            .with_endpoint(format!("{}/search", server.url()));
        let resp = client.search("GPT AI news").await.unwrap();
        assert_eq!(resp.answer.as_deref(), Some("A summary"));
        assert_eq!(resp.results[0].score, 0.81);
        mock.assert_async().await;
    }
}
