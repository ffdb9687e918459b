//! Error types for NFC-e extraction and aggregation

use thiserror::Error;

/// Errors raised while extracting one document
///
/// Every variant is a per-document failure: the batch processor records it
/// against the source and moves on to the next document.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Document bytes are not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Document is not well-formed XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Root element is neither an authorized invoice nor a cancellation event
    #[error("Unrecognized document root: <{0}>")]
    UnrecognizedRoot(String),

    /// A required element is absent
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    /// A required attribute is absent
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Element expected to carry the attribute
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
    },

    /// An integer field holds something other than digits
    #[error("Invalid number in {field}: '{value}'")]
    InvalidNumber {
        /// Field being decoded
        field: &'static str,
        /// Raw text found in the document
        value: String,
    },

    /// A monetary or percentage field is not a decimal
    #[error("Invalid decimal in {field}: '{value}'")]
    InvalidDecimal {
        /// Field being decoded
        field: &'static str,
        /// Raw text found in the document
        value: String,
    },

    /// A timestamp does not start with a `YYYY-MM-DD` date
    #[error("Invalid date in {field}: '{value}'")]
    InvalidDate {
        /// Field being decoded
        field: &'static str,
        /// Raw text found in the document
        value: String,
    },

    /// Access key cannot be normalized to 44 characters
    #[error("Invalid access key '{0}': longer than 44 characters")]
    InvalidAccessKey(String),
}

/// Errors raised while aggregating a finished batch
///
/// Aggregation only fails when the extracted values themselves are out of
/// range, and such a failure invalidates the whole report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// A running sum exceeded the decimal range
    #[error("Overflow while summing {field} for CST {cst:?} / CFOP {cfop:?}")]
    Overflow {
        /// Column being summed
        field: &'static str,
        /// Tax situation code of the bucket
        cst: Option<String>,
        /// Operation code of the bucket
        cfop: Option<String>,
    },
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;
