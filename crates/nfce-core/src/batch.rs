//! Batch extraction
//!
//! Folds a sequence of named XML sources through [`parse_document`]. A source
//! that fails, or that arrives without its bytes, contributes only an error
//! status; it never stops the batch.

use crate::parser::parse_document;
use crate::record::{DocumentRecord, LineItem, StatusRecord};
use log::{info, warn};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;

/// Everything extracted from one batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutput {
    pub documents: Vec<DocumentRecord>,
    pub line_items: Vec<LineItem>,
    /// One entry per source, successful or not
    pub statuses: Vec<StatusRecord>,
}

impl BatchOutput {
    /// Number of documents extracted
    #[inline]
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of sources rejected
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_error()).count()
    }

    /// Status records of rejected sources
    pub fn failures(&self) -> impl Iterator<Item = &StatusRecord> {
        self.statuses.iter().filter(|s| s.is_error())
    }

    fn push_source(mut self, name: String, bytes: &[u8]) -> Self {
        match parse_document(bytes) {
            Ok(parsed) => {
                self.documents.push(parsed.document);
                self.line_items.extend(parsed.line_items);
                self.statuses.push(StatusRecord::ok(name));
                self
            }
            Err(err) => self.push_rejected(name, &err),
        }
    }

    fn push_rejected(mut self, name: String, reason: &dyn fmt::Display) -> Self {
        warn!("Failed to extract {name}: {reason}");
        self.statuses.push(StatusRecord::error(name, reason.to_string()));
        self
    }
}

/// Extract every source of a batch
///
/// Sources are `(name, bytes)` pairs processed strictly in order.
#[must_use]
pub fn process_batch<I, N, B>(sources: I) -> BatchOutput
where
    I: IntoIterator<Item = (N, B)>,
    N: Into<String>,
    B: AsRef<[u8]>,
{
    process_sources(
        sources
            .into_iter()
            .map(|(name, bytes)| (name, Ok::<B, Infallible>(bytes))),
    )
}

/// Extract every source of a batch, some of which may have no bytes
///
/// A source given as `Err(reason)` gets an error status carrying `reason`,
/// in its place in the input order.
#[must_use]
pub fn process_sources<I, N, B, E>(sources: I) -> BatchOutput
where
    I: IntoIterator<Item = (N, Result<B, E>)>,
    N: Into<String>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let output = sources
        .into_iter()
        .fold(BatchOutput::default(), |output, (name, source)| match source {
            Ok(bytes) => output.push_source(name.into(), bytes.as_ref()),
            Err(reason) => output.push_rejected(name.into(), &reason),
        });

    info!(
        "Processed {} sources: {} documents, {} line items, {} errors",
        output.statuses.len(),
        output.document_count(),
        output.line_items.len(),
        output.error_count()
    );
    output
}
