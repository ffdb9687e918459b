//! NFC-e archive to spreadsheet pipeline
//!
//! Wires the archive reader, the batch extractor, the aggregator and the
//! report renderer into one call:
//!
//! ```no_run
//! let archive = std::fs::read("notas.zip")?;
//! let outcome = nfce_pipeline::process(&archive)?;
//! std::fs::write("Dados NFC-e.xlsx", &outcome.report)?;
//! println!("{} documents, {} errors", outcome.document_count, outcome.error_count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A batch either produces a complete report or fails as a whole; partial
//! reports are never emitted.

pub mod error;

pub use error::{PipelineError, Result};

use log::info;
use nfce_archive::extract_xml_members;
use nfce_core::{
    detect_gaps, process_sources, summarize, BatchOutput, SequenceGap, StatusRecord,
    SummaryGrouping, SummaryRecord,
};
use nfce_report::{render_report, ReportData, ReportOptions};
use serde::{Deserialize, Serialize};

/// Options for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// How line items are bucketed in the summary sheet
    pub grouping: SummaryGrouping,
    /// Spreadsheet rendering options
    pub report: ReportOptions,
}

/// Records derived from one archive, before rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub batch: BatchOutput,
    pub summary: Vec<SummaryRecord>,
    pub gaps: Vec<SequenceGap>,
}

impl Analysis {
    /// Borrow the records in report layout
    #[must_use]
    pub fn report_data(&self) -> ReportData<'_> {
        ReportData {
            documents: &self.batch.documents,
            summary: &self.summary,
            statuses: &self.batch.statuses,
            gaps: &self.gaps,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// XLSX workbook bytes
    pub report: Vec<u8>,
    /// Documents extracted
    pub document_count: usize,
    /// Sources that failed extraction
    pub error_count: usize,
    /// One status per XML source, in archive order
    pub statuses: Vec<StatusRecord>,
    /// Breaks found in the numbering
    pub gaps: Vec<SequenceGap>,
}

/// Extract and aggregate an archive without rendering it
///
/// # Errors
///
/// Returns `PipelineError::Archive` for unreadable archives, archives with
/// no XML member or with an encrypted XML member, and `PipelineError::Aggregate` when summary totals overflow.
pub fn analyze(archive: &[u8], grouping: SummaryGrouping) -> Result<Analysis> {
    let members = extract_xml_members(archive)?;
    let batch = process_sources(
        members
            .iter()
            .map(|member| (member.name.as_str(), member.contents.as_deref())),
    );
    let summary = summarize(&batch.line_items, grouping)?;
    let gaps = detect_gaps(&batch.documents);

    Ok(Analysis {
        batch,
        summary,
        gaps,
    })
}

/// Turn an archive of NFC-e XML documents into the report workbook
///
/// Uses the default options: (CST, CFOP) buckets and `R$` currency format.
///
/// # Errors
///
/// See [`process_with_options`].
pub fn process(archive: &[u8]) -> Result<ProcessOutcome> {
    process_with_options(archive, &ProcessOptions::default())
}

/// Turn an archive into the report workbook with explicit options
///
/// # Errors
///
/// Returns `PipelineError` when the archive is unusable, when aggregation
/// overflows, or when the workbook cannot be written. Documents that fail to
/// parse are not errors; they are counted in `error_count`.
pub fn process_with_options(archive: &[u8], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let analysis = analyze(archive, options.grouping)?;
    let report = render_report(&analysis.report_data(), &options.report)?;

    let document_count = analysis.batch.document_count();
    let error_count = analysis.batch.error_count();
    info!(
        "Report ready: {document_count} documents, {error_count} errors, {} gaps",
        analysis.gaps.len()
    );

    Ok(ProcessOutcome {
        report,
        document_count,
        error_count,
        statuses: analysis.batch.statuses,
        gaps: analysis.gaps,
    })
}
