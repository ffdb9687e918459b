//! Error types for the pipeline

use nfce_archive::ArchiveError;
use nfce_core::AggregateError;
use nfce_report::ReportError;
use thiserror::Error;

/// Batch-level failures
///
/// Per-document failures never show up here; they are reported as error
/// statuses inside a successful outcome.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The archive could not be read or holds no XML document
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Summary totals could not be computed
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// The spreadsheet could not be rendered
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
