//! JSON persistence of daily batches.
//!
//! ```text
//! data_dir/
//! ├── news_2025-05-06.json
//! └── news_2025-05-07.json
//! ```

use crate::models::AggregatedBatch;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const BATCH_PREFIX: &str = "news_";

/// Path of the batch file for `date` inside `data_dir`.
pub fn batch_path(data_dir: &Path, date: &str) -> PathBuf {
    data_dir.join(format!("{BATCH_PREFIX}{date}.json"))
}

/// Write `batch` as pretty JSON to `{data_dir}/news_{date}.json`.
///
/// Creates `data_dir` if needed and overwrites an existing batch for the
/// same date.
///
/// # Arguments
///
/// * `batch` - The classified records of one day
/// * `data_dir` - Base directory for batch files
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display(), date = %batch.date))]
pub async fn write_batch(batch: &AggregatedBatch, data_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(batch)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let path = batch_path(data_dir, &batch.date);
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = batch.articles.len(), "Wrote batch JSON");
    Ok(path)
}

/// Read a batch file back.
pub async fn read_batch(path: &Path) -> Result<AggregatedBatch, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
