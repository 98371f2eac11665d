//! # AI News Digest
//!
//! Daily and monthly AI news digests built from config-described JSON APIs
//! and an optional topic search.
//!
//! ## Usage
//!
//! ```sh
//! ai_news_digest daily -c config/digest.yaml
//! ai_news_digest monthly --year 2025 --month 5
//! ```
//!
//! ## Daily pipeline
//!
//! 1. **Collection**: fetch and normalize every enabled source
//! 2. **Search**: query each configured topic (when an API key is present)
//! 3. **Classification**: assign one category per record
//! 4. **Output**: write the JSON batch and the daily Markdown article

use ai_news_digest::collector::collect_with_config;
use ai_news_digest::config::{AppConfig, load_config};
use ai_news_digest::daily::build_batch;
use ai_news_digest::outputs::{json, markdown, monthly};
use ai_news_digest::search::{RetrySearch, TavilyClient, TopicSearch, search_topics};
use ai_news_digest::utils::ensure_writable_dir;
use chrono::{Datelike, Local};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_news_digest starting up");

    let args = Cli::parse();
    debug!(?args.paths, "Parsed CLI arguments");

    let result = match args.command {
        Command::Daily {
            tavily_api_key,
            max_items,
            date,
        } => {
            let config = load_config(&args.paths.config).await?;
            run_daily(
                &config,
                &args.paths.data_dir,
                &args.paths.output_dir,
                tavily_api_key.as_deref(),
                max_items,
                date,
            )
            .await
        }
        Command::Monthly { year, month } => {
            let now = Local::now();
            let year = year.unwrap_or(now.year());
            let month = month.unwrap_or(now.month());
            monthly::write_monthly_report(&args.paths.data_dir, &args.paths.output_dir, year, month)
                .await
                .map(|path| info!(path = %path.display(), year, month, "Monthly report complete"))
        }
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display(), output_dir = %output_dir.display()))]
async fn run_daily(
    config: &AppConfig,
    data_dir: &Path,
    output_dir: &Path,
    tavily_api_key: Option<&str>,
    max_items: Option<usize>,
    date: Option<String>,
) -> Result<(), Box<dyn Error>> {
    // Fail early rather than after a full collection run.
    ensure_writable_dir(data_dir).await?;
    ensure_writable_dir(output_dir).await?;

    let date = date.unwrap_or_else(|| Local::now().date_naive().to_string());
    let max_items = max_items.unwrap_or(config.max_items);

    // ---- Collect configured sources ----
    let collected = collect_with_config(config, max_items).await;
    info!(count = collected.len(), "Collected source records");

    // ---- Topic search ----
    let searched = match tavily_api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => match TavilyClient::new(key, &config.search) {
            Ok(client) => {
                let provider = RetrySearch::new(client, 3, Duration::from_secs(1));
                search_topics(&provider, &config.search).await
            }
            Err(e) => {
                error!(error = %e, "Failed to build search client; skipping topic search");
                TopicSearch::default()
            }
        },
        None => {
            warn!("No search API key configured; skipping topic search");
            TopicSearch::default()
        }
    };
    info!(
        count = searched.records.len(),
        highlight = searched.highlight.is_some(),
        "Topic search finished"
    );

    // ---- Classify and persist ----
    let batch = build_batch(&date, collected, searched, &config.categories);
    info!(date = %batch.date, articles = batch.articles.len(), "Batch assembled");

    let batch_path = json::write_batch(&batch, data_dir).await?;
    let article_path = markdown::write_article(&batch, output_dir).await?;
    info!(
        batch = %batch_path.display(),
        article = %article_path.display(),
        "Daily digest complete"
    );
    Ok(())
}
