//! # AI News Digest
//!
//! Collects news items from any number of JSON APIs described purely in
//! configuration, reduces them to one record shape, classifies them by
//! keyword, and writes daily and monthly Markdown digests.
//!
//! ## Architecture
//!
//! The core is a small evaluator over source descriptions:
//!
//! 1. **Path resolution** ([`path`]): dotted-key lookups into decoded JSON
//! 2. **Templating** ([`template`]): `{ts}`, `{page}` and `{oid}` placeholders
//! 3. **Fetching** ([`fetcher`]): page-by-page requests for one source
//! 4. **Normalization** ([`normalize`]): raw items to [`NormalizedRecord`]s
//! 5. **Collection** ([`collector`]): every enabled source, merged in
//!    declared order and capped
//! 6. **Classification** ([`classify`]): first-match keyword categories
//!
//! Around the core sit the topic search pass ([`search`]), batch assembly
//! ([`daily`]) and the JSON/Markdown writers ([`outputs`]).
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ai_news_digest::config::parse_config(
//!     "sources:\n  daily:\n    - name: demo\n      endpoint: https://example.com/api\n",
//! )?;
//! let records = ai_news_digest::collect(&config.sources, 20).await;
//! for r in &records {
//!     println!("{} -> {}", r.title, ai_news_digest::classify(&r.title, &r.content, &config.categories));
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod collector;
pub mod config;
pub mod daily;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod path;
pub mod search;
pub mod template;
pub mod utils;

pub use classify::{CategoryTable, classify};
pub use collector::{Collector, collect};
pub use config::{SourceConfig, SourceGroups};
pub use models::NormalizedRecord;
