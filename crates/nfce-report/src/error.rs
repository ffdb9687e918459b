//! Error types for report rendering

use thiserror::Error;

/// Errors that can occur while rendering the spreadsheet
#[derive(Error, Debug)]
pub enum ReportError {
    /// Error raised by the XLSX writer
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Sheet exceeds the worksheet row or column limits
    #[error("Sheet '{sheet}' is too large ({rows} rows, {columns} columns)")]
    TooLarge {
        /// Sheet name
        sheet: &'static str,
        /// Data rows requested
        rows: usize,
        /// Columns requested
        columns: usize,
    },

    /// Money value that cannot be written as a spreadsheet number
    #[error("Sheet '{sheet}' has a value that cannot be written as a number: {value}")]
    UnrepresentableValue {
        /// Sheet name
        sheet: &'static str,
        /// Value as text
        value: String,
    },
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
