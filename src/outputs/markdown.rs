//! Daily article rendering.
//!
//! The article lists the highest-scoring records of the day. Engine records
//! carry a fixed score while search hits carry the provider's own score, so
//! the two are ranked on a shared but unnormalized scale.

use crate::models::{AggregatedBatch, ClassifiedRecord};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const ARTICLE_PREFIX: &str = "article_";

/// Number of records featured in the daily article.
pub const TOP_STORIES: usize = 10;

/// Path of the daily article for `date` inside `output_dir`.
pub fn article_path(output_dir: &Path, date: &str) -> PathBuf {
    output_dir.join(format!("{ARTICLE_PREFIX}{date}.md"))
}

/// The `n` best records by score, ties kept in batch order.
pub fn top_stories(batch: &AggregatedBatch, n: usize) -> Vec<&ClassifiedRecord> {
    let mut ranked: Vec<&ClassifiedRecord> = batch.articles.iter().collect();
    ranked.sort_by(|a, b| b.record.score.total_cmp(&a.record.score));
    ranked.truncate(n);
    ranked
}

/// Render the daily article for `batch`.
pub fn batch_to_markdown(batch: &AggregatedBatch) -> Result<String, std::fmt::Error> {
    let top = top_stories(batch, TOP_STORIES);
    let mut md = String::new();

    writeln!(md, "# Daily AI Briefing - {}\n", batch.date)?;
    writeln!(md, "## Today in AI\n")?;
    if let Some(highlight) = &batch.highlight {
        writeln!(md, "**Summary:** {highlight}\n")?;
    }

    writeln!(md, "## Top Stories\n")?;
    for (i, article) in top.iter().enumerate() {
        let r = &article.record;
        writeln!(md, "### {}. {}", i + 1, r.title)?;
        let source = if r.url.is_empty() { "Unknown" } else { r.url.as_str() };
        writeln!(md, "**Source:** {source}")?;
        writeln!(md, "**Category:** {}", article.category)?;
        if !r.content.is_empty() {
            writeln!(md, "\n{}", r.content)?;
        }
        writeln!(md, "\n---\n")?;
    }

    writeln!(md, "## Wrap-up\n")?;
    writeln!(
        md,
        "{} AI stories were collected today; the {} above ranked highest.\n",
        batch.articles.len(),
        top.len()
    )?;
    writeln!(md, "---")?;
    writeln!(md, "*Generated automatically | {}*", batch.date)?;

    Ok(md)
}

/// Render and write the daily article, returning its path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), date = %batch.date))]
pub async fn write_article(batch: &AggregatedBatch, output_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let md = batch_to_markdown(batch)?;
    fs::create_dir_all(output_dir).await?;
    let path = article_path(output_dir, &batch.date);
    fs::write(&path, md).await?;
    info!(path = %path.display(), "Wrote daily article");
    Ok(path)
}
