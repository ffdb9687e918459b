//! Spreadsheet report for NFC-e batches
//!
//! Lays the records of a processed batch out as a four-sheet XLSX workbook:
//!
//! | Sheet | Rows |
//! |-------|------|
//! | `Dados_NFC-e` | one per document; cancellations drawn in red |
//! | `Resumo` | one per CST/CFOP bucket |
//! | `Status` | one per processed XML source |
//! | `Sequência` | one per gap in document numbering |
//!
//! Money columns use the `R$ #,##0.00` number format unless another format is
//! configured in [`ReportOptions`].

pub mod error;
pub mod sheet;
pub mod xlsx;

pub use error::{ReportError, Result};
pub use sheet::{
    Cell, SheetRow, DOCUMENTS_SHEET, SEQUENCE_SHEET, STATUS_SHEET, SUMMARY_SHEET,
};
pub use xlsx::{render_report, ReportData, ReportOptions, DEFAULT_CURRENCY_FORMAT};
