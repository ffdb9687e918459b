//! # nfce-core
//!
//! Extraction and aggregation for batches of Brazilian electronic consumer
//! invoices (NFC-e).
//!
//! ## Pipeline
//!
//! | Stage | Function | Output |
//! |-------|----------|--------|
//! | Parse one XML document | [`parse_document`] | [`ParsedDocument`] |
//! | Fold a batch of sources | [`process_batch`] | [`BatchOutput`] |
//! | Bucket line items by CST/CFOP | [`summarize`] | [`SummaryRecord`]s |
//! | Find breaks in numbering | [`detect_gaps`] | [`SequenceGap`]s |
//!
//! ## Example
//!
//! ```no_run
//! use nfce_core::{detect_gaps, process_batch, summarize, SummaryGrouping};
//!
//! let xml = std::fs::read("nota.xml")?;
//! let batch = process_batch([("nota.xml", xml)]);
//! let summary = summarize(&batch.line_items, SummaryGrouping::default())?;
//! let gaps = detect_gaps(&batch.documents);
//! println!("{} documents, {} buckets, {} gaps", batch.document_count(), summary.len(), gaps.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! [`parse_document`] fails with an [`ExtractError`] for that one document;
//! [`process_batch`] turns it into an error [`StatusRecord`] and carries on.
//! [`summarize`] fails with an [`AggregateError`] only when totals overflow.

pub mod aggregate;
pub mod batch;
pub mod error;
pub mod format;
pub mod parser;
pub mod record;
pub mod xml;

pub use aggregate::{detect_gaps, find_gaps, summarize, SummaryGrouping};
pub use batch::{process_batch, process_sources, BatchOutput};
pub use error::{AggregateError, ExtractError, Result};
pub use format::format_tax_id;
pub use parser::{parse_document, DocumentKind, ACCESS_KEY_LEN};
pub use record::{
    DocumentRecord, DocumentStatus, LineItem, Outcome, ParsedDocument, SequenceGap,
    StatusRecord, SummaryRecord,
};
