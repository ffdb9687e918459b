//! Normalized records produced by the pipeline
//!
//! Every record is built once and never modified afterwards: each stage of
//! the pipeline derives a fresh collection from the previous one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a fiscal document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Invoice authorized by the tax authority
    Authorized,
    /// Cancellation event accepted by the tax authority
    CancellationHomologated,
}

impl DocumentStatus {
    /// Label shown in the report
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Authorized => "Autorizado",
            Self::CancellationHomologated => "Cancelamento de NF-e homologado",
        }
    }

    /// Whether the document nullifies a previous invoice
    #[inline]
    #[must_use]
    pub const fn is_cancellation(self) -> bool {
        matches!(self, Self::CancellationHomologated)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fiscal document, authorized or cancelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Sequence number within issuer and series
    pub document_number: u64,
    /// 44-character access key, zero-padded on the left
    pub access_key: String,
    /// Authorized or cancellation
    pub status: DocumentStatus,
    /// Document model code (`65` for NFC-e)
    pub model: String,
    /// Issuer CNPJ/CPF, formatted for display
    pub issuer_tax_id: String,
    /// Recipient CNPJ/CPF, formatted; empty when there is no recipient
    pub recipient_tax_id: String,
    /// Recipient state (UF); empty when there is no recipient
    pub recipient_state: String,
    /// Invoice total; zero for cancellations
    pub total_value: Decimal,
    /// Date of issue or of the cancellation event
    pub issue_date: Option<NaiveDate>,
}

impl DocumentRecord {
    /// Issue date as shown in the report (`DD-MM-YYYY`), empty when unknown
    #[must_use]
    pub fn issue_date_display(&self) -> String {
        self.issue_date
            .map(|date| date.format("%d-%m-%Y").to_string())
            .unwrap_or_default()
    }
}

/// One taxed product line of an authorized invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// ICMS tax situation code (CST)
    pub tax_situation_code: Option<String>,
    /// Fiscal operation code (CFOP)
    pub operation_code: Option<String>,
    /// Product value (`vProd`)
    pub product_value: Decimal,
    /// ICMS calculation base (`vBC`)
    pub tax_base_value: Decimal,
    /// ICMS rate with two fraction digits (`pICMS`)
    pub tax_rate: String,
    /// ICMS amount (`vICMS`)
    pub tax_amount: Decimal,
}

/// Result of extracting one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Document extracted
    Ok,
    /// Document rejected; it contributes nothing else to the batch
    Error,
}

impl Outcome {
    /// Label shown in the report
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERRO",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Processing status of one input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Name of the source (archive member name)
    pub source_name: String,
    /// Whether extraction succeeded
    pub outcome: Outcome,
    /// Failure cause for `Outcome::Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusRecord {
    /// Status for a successfully extracted source
    #[must_use]
    pub fn ok(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            outcome: Outcome::Ok,
            message: None,
        }
    }

    /// Status for a rejected source
    #[must_use]
    pub fn error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            outcome: Outcome::Error,
            message: Some(message.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome == Outcome::Error
    }
}

/// Totals of all line items sharing a tax classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub tax_situation_code: Option<String>,
    pub operation_code: Option<String>,
    /// Distinct rates of the bucket, ascending, joined with `", "`
    pub tax_rates: String,
    pub product_value: Decimal,
    pub tax_base_value: Decimal,
    pub tax_amount: Decimal,
}

/// A break in the document numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceGap {
    /// Last number present before the break
    pub previous_number: u64,
    /// First number present after the break
    pub current_number: u64,
}

impl SequenceGap {
    /// Marker written in the gap column of the report
    pub const FLAG: &'static str = "SIM";

    /// How many numbers are missing between the two ends
    #[inline]
    #[must_use]
    pub const fn missing_count(&self) -> u64 {
        self.current_number - self.previous_number - 1
    }
}

/// Records extracted from one XML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub document: DocumentRecord,
    /// Product lines; always empty for cancellation events
    pub line_items: Vec<LineItem>,
}
