//! Monthly report over the daily batches and articles of one month.
//!
//! Reads every `news_YYYY-MM-DD.json` and `article_YYYY-MM-DD.md` dated in
//! the month, ranks categories and source hosts, and writes
//! `monthly_report_YYYY-MM.md`.

use crate::models::ClassifiedRecord;
use crate::outputs::json::{BATCH_PREFIX, read_batch};
use crate::outputs::markdown::ARTICLE_PREFIX;
use crate::utils::{date_from_stem, month_bounds};
use chrono::{Local, NaiveDate};
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Number of rows in each ranking table.
pub const RANK_LIMIT: usize = 10;

/// A daily article found in the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedArticle {
    pub date: String,
    pub path: PathBuf,
    pub title: String,
}

/// Everything the monthly report is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyData {
    pub year: i32,
    pub month: u32,
    pub records: Vec<ClassifiedRecord>,
    pub published: Vec<PublishedArticle>,
}

/// Count occurrences and rank them, most frequent first.
///
/// Ties keep first-appearance order.
pub fn rank_counts<I>(items: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let items: Vec<String> = items.into_iter().collect();
    let counts = items.iter().counts();
    items
        .iter()
        .unique()
        .map(|k| (k.clone(), counts[k]))
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .take(limit)
        .collect()
}

/// Category ranking of the month's records.
pub fn category_ranking(records: &[ClassifiedRecord]) -> Vec<(String, usize)> {
    rank_counts(records.iter().map(|r| r.category.clone()), RANK_LIMIT)
}

/// Source-host ranking of the month's records; records without a URL are
/// left out.
pub fn source_ranking(records: &[ClassifiedRecord]) -> Vec<(String, usize)> {
    rank_counts(
        records.iter().filter_map(|r| r.record.domain()),
        RANK_LIMIT,
    )
}

/// Files in `dir` named `{prefix}YYYY-MM-DD.{ext}` dated within the month,
/// sorted by date.
async fn dated_files(
    dir: &Path,
    prefix: &str,
    ext: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, PathBuf)>, Box<dyn Error>> {
    let mut found = Vec::new();
    if !dir.exists() {
        warn!(dir = %dir.display(), "Directory does not exist");
        return Ok(found);
    }
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(date) = date_from_stem(stem, prefix) {
            if date >= start && date < end {
                found.push((date, path));
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Load the month's batches and daily articles.
///
/// Files that cannot be read or parsed are logged and skipped.
#[instrument(level = "info", skip_all, fields(year, month))]
pub async fn load_month(
    data_dir: &Path,
    output_dir: &Path,
    year: i32,
    month: u32,
) -> Result<MonthlyData, Box<dyn Error>> {
    let (start, end) = month_bounds(year, month)
        .ok_or_else(|| format!("invalid month: {year}-{month}"))?;

    let mut records = Vec::new();
    for (date, path) in dated_files(data_dir, BATCH_PREFIX, "json", start, end).await? {
        match read_batch(&path).await {
            Ok(batch) => {
                info!(%date, articles = batch.articles.len(), "Loaded batch");
                records.extend(batch.articles);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to load batch; skipping"),
        }
    }

    let mut published = Vec::new();
    for (date, path) in dated_files(output_dir, ARTICLE_PREFIX, "md", start, end).await? {
        match fs::read_to_string(&path).await {
            Ok(text) => {
                let title = text
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches("# ")
                    .trim()
                    .to_string();
                published.push(PublishedArticle {
                    date: date.to_string(),
                    path,
                    title,
                });
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to load article; skipping"),
        }
    }

    info!(records = records.len(), published = published.len(), "Loaded month");
    Ok(MonthlyData {
        year,
        month,
        records,
        published,
    })
}

/// Render the monthly report.
pub fn monthly_to_markdown(data: &MonthlyData) -> Result<String, std::fmt::Error> {
    let categories = category_ranking(&data.records);
    let sources = source_ranking(&data.records);
    let month_name = format!("{}-{:02}", data.year, data.month);
    let mut md = String::new();

    writeln!(md, "# AI Reading Report - {month_name}\n")?;
    writeln!(md, "## Overview\n")?;
    writeln!(md, "- **Stories collected**: {}", data.records.len())?;
    writeln!(md, "- **Articles published**: {}", data.published.len())?;
    writeln!(md, "- **Categories covered**: {}", categories.len())?;
    writeln!(md, "- **Sources**: {}\n", sources.len())?;
    writeln!(md, "---\n")?;

    writeln!(md, "## Top Categories\n")?;
    writeln!(md, "| Rank | Category | Stories |")?;
    writeln!(md, "|:---:|:---|:---:|")?;
    for (i, (category, count)) in categories.iter().enumerate() {
        writeln!(md, "| {} | {} | {} |", i + 1, category, count)?;
    }

    writeln!(md, "\n## Top Sources\n")?;
    writeln!(md, "| Rank | Source | Stories |")?;
    writeln!(md, "|:---:|:---|:---:|")?;
    for (i, (source, count)) in sources.iter().enumerate() {
        writeln!(md, "| {} | {} | {} |", i + 1, source, count)?;
    }

    writeln!(md, "\n## Published Articles\n")?;
    for article in &data.published {
        writeln!(md, "- {}: {}", article.date, article.title)?;
    }

    let focus = categories.iter().take(3).map(|(c, _)| c.as_str()).join(", ");
    writeln!(md, "\n---\n")?;
    writeln!(md, "## Monthly Summary\n")?;
    writeln!(
        md,
        "{} daily briefings were published in {}.\n",
        data.published.len(),
        month_name
    )?;
    writeln!(md, "**Focus this month:** {focus}\n")?;
    writeln!(md, "---\n")?;
    writeln!(
        md,
        "*Generated automatically | {}*",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;

    Ok(md)
}

/// Path of the monthly report inside `output_dir`.
pub fn report_path(output_dir: &Path, year: i32, month: u32) -> PathBuf {
    output_dir.join(format!("monthly_report_{year}-{month:02}.md"))
}

/// Load, render and write the monthly report, returning its path.
#[instrument(level = "info", skip_all, fields(year, month))]
pub async fn write_monthly_report(
    data_dir: &Path,
    output_dir: &Path,
    year: i32,
    month: u32,
) -> Result<PathBuf, Box<dyn Error>> {
    let data = load_month(data_dir, output_dir, year, month).await?;
    let md = monthly_to_markdown(&data)?;
    fs::create_dir_all(output_dir).await?;
    let path = report_path(output_dir, year, month);
    fs::write(&path, md).await?;
    info!(path = %path.display(), "Wrote monthly report");
    Ok(path)
}
