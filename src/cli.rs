//! Command-line interface definitions for AI News Digest.
//!
//! All options can be provided via command-line flags; API keys can also
//! come from environment variables.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the AI News Digest application.
///
/// # Examples
///
/// ```sh
/// # Collect today's news and write the daily article
/// ai_news_digest daily -c config/digest.yaml
///
/// # Same, with the topic search enabled
/// TAVILY_API_KEY=... ai_news_digest daily
///
/// # Build the report for May 2025
/// ai_news_digest monthly --year 2025 --month 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Locations shared by every subcommand.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, default_value = "config/digest.yaml")]
    pub config: PathBuf,

    /// Directory for the daily JSON batches
    #[arg(short, long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for the Markdown articles and reports
    #[arg(short, long, global = true, default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect sources (and optionally search), then write the daily batch and article
    Daily {
        /// Tavily API key; the topic search is skipped without one
        #[arg(long, env = "TAVILY_API_KEY")]
        tavily_api_key: Option<String>,

        /// Override `max_items` from the configuration
        #[arg(long)]
        max_items: Option<usize>,

        /// Date stamp for the batch (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Aggregate a month of daily batches into a report
    Monthly {
        /// Year of the report; defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// Month of the report (1-12); defaults to the current month
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
}
