//! Output generation: persisted batches, daily articles and monthly reports.
//!
//! # Submodules
//!
//! - [`json`]: writes and reads [`AggregatedBatch`](crate::models::AggregatedBatch) files
//! - [`markdown`]: renders the daily article
//! - [`monthly`]: aggregates a month of batches into a report
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── news_2025-05-06.json
//! └── news_2025-05-07.json
//!
//! output_dir/
//! ├── article_2025-05-06.md
//! ├── article_2025-05-07.md
//! └── monthly_report_2025-05.md
//! ```

pub mod json;
pub mod markdown;
pub mod monthly;
