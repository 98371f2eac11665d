//! Paginated fetching of one configured source.
//!
//! A source is driven page by page, starting at 1:
//!
//! 1. `{ts}` and `{page}` are substituted into headers and params (and, for
//!    POST, into the body template, which is then parsed as JSON).
//! 2. The request goes out through a [`Transport`].
//! 3. The item list is located in the response with `list_path`.
//!
//! Pagination stops on the first of: no endpoint configured (no request at
//! all), a transport/decoding failure, an empty or missing list, or
//! `max_pages` reached. Items from pages fetched before a failure are kept.
//!
//! Nothing in this module returns an error to its caller; failures are logged
//! and reported through [`StopReason`].

use crate::config::{DEFAULT_USER_AGENT, Method, SourceConfig};
use crate::path::resolve_list;
use crate::template::{Placeholders, unresolved};
use crate::utils::truncate_for_log;
use chrono::Utc;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Why fetching a single page failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection problems, timeouts and non-2xx statuses.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Body template is not valid JSON after substitution: {0}")]
    BodyTemplate(serde_json::Error),
}

/// A fully substituted request for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub method: Method,
    pub url: String,
    pub page: u32,
    pub headers: Vec<(String, String)>,
    /// Query parameters; only sent for GET.
    pub query: Vec<(String, String)>,
    /// JSON body; only set for POST.
    pub body: Option<Value>,
}

/// Something that can execute a [`PageRequest`] and decode its JSON body.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &PageRequest) -> Result<Value, FetchError>;
}

impl<T: Transport> Transport for &T {
    async fn send(&self, request: &PageRequest) -> Result<Value, FetchError> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given per-request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// 30 second timeout and the default browser User-Agent.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }
}

impl Transport for ReqwestTransport {
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url, page = request.page))]
    async fn send(&self, request: &PageRequest) -> Result<Value, FetchError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.query),
            Method::Post => {
                let body = request.body.as_ref().unwrap_or(&Value::Null);
                self.client.post(&request.url).json(body)
            }
        };
        let builder = request
            .headers
            .iter()
            .fold(builder, |b, (k, v)| b.header(k.as_str(), v.as_str()));

        let t0 = Instant::now();
        let response = builder.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "Received page"
        );
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(
                error = %e,
                body = %truncate_for_log(&String::from_utf8_lossy(&bytes), 200),
                "Response body is not JSON"
            );
            FetchError::Decode(e)
        })
    }
}

/// Why pagination of a source ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source has no endpoint; nothing was requested.
    NoEndpoint,
    /// A page came back with an empty or missing item list.
    EmptyPage,
    /// A request or its decoding failed.
    Failed,
    /// `max_pages` requests were made.
    PageCap,
}

/// Raw items gathered from one source, in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub items: Vec<Value>,
    /// Number of requests issued, including a failed one.
    pub requests: u32,
    pub stop: StopReason,
}

/// Render a configured header/param literal as request text.
fn literal_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build the request for `page` of `source`.
///
/// Headers always receive `{ts}` and `{page}`. GET sources send their params
/// as the query string; POST sources send only a JSON body rendered from
/// [`SourceConfig::post_body_template`].
///
/// # Arguments
///
/// * `source` - The source description
/// * `page` - 1-based page number
/// * `ts_millis` - Timestamp substituted for `{ts}`
///
/// # Returns
///
/// A [`PageRequest`] with every known placeholder filled in, headers and
/// query pairs in configured order.
///
/// # Errors
///
/// Returns [`FetchError::BodyTemplate`] if a POST body template is not valid
/// JSON after substitution.
pub fn build_request(
    source: &SourceConfig,
    page: u32,
    ts_millis: i64,
) -> Result<PageRequest, FetchError> {
    let vars = Placeholders::for_page(ts_millis, page);
    let render = |map: &serde_json::Map<String, Value>| -> Vec<(String, String)> {
        map.iter()
            .map(|(k, v)| (k.clone(), literal_to_string(&vars.apply_value(v))))
            .collect()
    };

    let headers = render(&source.headers);
    let (query, body) = match source.method {
        Method::Get => (render(&source.params), None),
        Method::Post => {
            let text = vars.apply(source.post_body_template());
            let body = serde_json::from_str(&text).map_err(FetchError::BodyTemplate)?;
            (Vec::new(), Some(body))
        }
    };

    Ok(PageRequest {
        method: source.method,
        url: source.endpoint.clone(),
        page,
        headers,
        query,
        body,
    })
}

/// Fetch every page of `source` through `transport`.
///
/// # Returns
///
/// A [`FetchOutcome`] holding the raw items of every page fetched before the
/// stop, the number of requests issued and why pagination ended. This
/// function never fails; errors are logged and end pagination with
/// [`StopReason::Failed`].
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_source<T: Transport>(transport: &T, source: &SourceConfig) -> FetchOutcome {
    let mut outcome = FetchOutcome {
        items: Vec::new(),
        requests: 0,
        stop: StopReason::PageCap,
    };

    if source.endpoint.trim().is_empty() {
        info!("Source has no endpoint; skipping");
        outcome.stop = StopReason::NoEndpoint;
        return outcome;
    }

    let ts = Utc::now().timestamp_millis();
    for page in 1..=source.max_pages {
        let request = match build_request(source, page, ts) {
            Ok(r) => r,
            Err(e) => {
                error!(page, error = %e, "Could not build request; stopping pagination");
                outcome.stop = StopReason::Failed;
                break;
            }
        };
        if page == 1 {
            let leftovers: Vec<&str> = request
                .query
                .iter()
                .chain(request.headers.iter())
                .flat_map(|(_, v)| unresolved(v))
                .collect();
            if !leftovers.is_empty() {
                warn!(?leftovers, "Request still contains unknown placeholders");
            }
        }

        outcome.requests += 1;
        let response = match transport.send(&request).await {
            Ok(v) => v,
            Err(e) => {
                error!(page, error = %e, "Page fetch failed; stopping pagination");
                outcome.stop = StopReason::Failed;
                break;
            }
        };

        let items = resolve_list(&response, &source.list_path);
        if items.is_empty() {
            info!(page, list_path = %source.list_path, "No items on page; stopping pagination");
            outcome.stop = StopReason::EmptyPage;
            break;
        }
        info!(page, count = items.len(), "Fetched page");
        outcome.items.extend_from_slice(items);
    }

    info!(
        requests = outcome.requests,
        items = outcome.items.len(),
        stop = ?outcome.stop,
        "Finished source"
    );
    outcome
}
