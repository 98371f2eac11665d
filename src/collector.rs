//! Source orchestration: fetch and normalize every enabled source, then merge.
//!
//! Sources run concurrently up to a fixed worker count, but results are
//! always merged in declared group/source order, never completion order.
//! Each source is an isolated unit of work that yields records or nothing;
//! one source failing cannot affect another, and [`Collector::collect`]
//! itself cannot fail.

use crate::config::{AppConfig, SourceConfig, SourceGroups};
use crate::fetcher::{ReqwestTransport, Transport, fetch_source};
use crate::models::NormalizedRecord;
use crate::normalize::normalize_items;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Runs the fetch → normalize pipeline over configured sources.
#[derive(Debug, Clone)]
pub struct Collector<T> {
    transport: T,
    concurrency: usize,
}

impl<T: Transport> Collector<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of sources fetched at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Collect up to `max_items` records from every enabled source.
    ///
    /// Output order is group order, then source order, then item order.
    #[instrument(level = "info", skip_all, fields(max_items))]
    pub async fn collect(&self, groups: &SourceGroups, max_items: usize) -> Vec<NormalizedRecord> {
        let enabled: Vec<&SourceConfig> = groups
            .sources()
            .filter(|s| {
                if !s.enabled {
                    debug!(source = %s.name, "Source disabled; skipping");
                }
                s.enabled
            })
            .collect();
        info!(
            sources = enabled.len(),
            concurrency = self.concurrency,
            "Collecting from enabled sources"
        );

        // `buffered` yields in input order, so each source keeps its slot.
        let per_source: Vec<Vec<NormalizedRecord>> = stream::iter(enabled)
            .map(|source| self.collect_source(source))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records: Vec<NormalizedRecord> = per_source.into_iter().flatten().collect();
        let total = records.len();
        records.truncate(max_items);
        info!(total, kept = records.len(), "Collected records");
        records
    }

    async fn collect_source(&self, source: &SourceConfig) -> Vec<NormalizedRecord> {
        let outcome = fetch_source(&self.transport, source).await;
        let records = normalize_items(&outcome.items, source);
        info!(
            source = %source.name,
            raw = outcome.items.len(),
            records = records.len(),
            "Normalized source items"
        );
        records
    }
}

/// Collect from `groups` with a default HTTP transport.
///
/// Never fails: if the HTTP client cannot be built the error is logged and
/// the result is empty.
pub async fn collect(groups: &SourceGroups, max_items: usize) -> Vec<NormalizedRecord> {
    match ReqwestTransport::with_defaults() {
        Ok(transport) => Collector::new(transport).collect(groups, max_items).await,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client; no sources collected");
            Vec::new()
        }
    }
}

/// Collect using the transport, concurrency and limits from `config`.
pub async fn collect_with_config(config: &AppConfig, max_items: usize) -> Vec<NormalizedRecord> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match ReqwestTransport::new(timeout, &config.user_agent) {
        Ok(transport) => {
            Collector::new(transport)
                .with_concurrency(config.concurrency)
                .collect(&config.sources, max_items)
                .await
        }
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client; no sources collected");
            Vec::new()
        }
    }
}
