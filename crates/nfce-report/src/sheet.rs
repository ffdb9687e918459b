//! Row layouts of the four report sheets

use nfce_core::{DocumentRecord, SequenceGap, StatusRecord, SummaryRecord};
use rust_decimal::Decimal;

/// Sheet holding one row per document
pub const DOCUMENTS_SHEET: &str = "Dados_NFC-e";
/// Sheet holding one row per CST/CFOP bucket
pub const SUMMARY_SHEET: &str = "Resumo";
/// Sheet holding one row per processed source
pub const STATUS_SHEET: &str = "Status";
/// Sheet holding one row per numbering gap
pub const SEQUENCE_SHEET: &str = "Sequência";

/// A rendered cell value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Plain centered text
    Text(String),
    /// Plain centered integer
    Integer(u64),
    /// Money, written with the currency number format
    Currency(Decimal),
}

impl Cell {
    /// Width of the value as text, used for column sizing
    #[must_use]
    pub fn display_width(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Integer(n) => n.to_string().len(),
            Self::Currency(value) => value.normalize().to_string().len(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A record that can be laid out as one spreadsheet row
pub trait SheetRow {
    /// Column headers, in column order
    const HEADERS: &'static [&'static str];

    /// Cell values, one per header
    fn cells(&self) -> Vec<Cell>;

    /// Whether the row is drawn in the highlight style
    fn highlighted(&self) -> bool {
        false
    }
}

impl SheetRow for DocumentRecord {
    const HEADERS: &'static [&'static str] = &[
        "Número_Doc",
        "Chave_Acesso",
        "Situação_do_Documento",
        "Modelo",
        "CNPJ_Emissor",
        "CPF_CNPJ_Destinatário",
        "UF_Destinatário",
        "Valor_Total",
        "Data_de_Emissão",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.document_number),
            self.access_key.as_str().into(),
            self.status.label().into(),
            self.model.as_str().into(),
            self.issuer_tax_id.as_str().into(),
            self.recipient_tax_id.as_str().into(),
            self.recipient_state.as_str().into(),
            Cell::Currency(self.total_value),
            self.issue_date_display().into(),
        ]
    }

    fn highlighted(&self) -> bool {
        self.status.is_cancellation()
    }
}

impl SheetRow for SummaryRecord {
    const HEADERS: &'static [&'static str] = &[
        "CST",
        "CFOP",
        "Alíquota",
        "Valor Total",
        "Base de Cálculo",
        "ICMS",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.tax_situation_code.clone().unwrap_or_default().into(),
            self.operation_code.clone().unwrap_or_default().into(),
            self.tax_rates.as_str().into(),
            Cell::Currency(self.product_value),
            Cell::Currency(self.tax_base_value),
            Cell::Currency(self.tax_amount),
        ]
    }
}

impl SheetRow for StatusRecord {
    const HEADERS: &'static [&'static str] = &["Arquivo_XML", "Progresso"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.source_name.as_str().into(),
            self.outcome.label().into(),
        ]
    }
}

impl SheetRow for SequenceGap {
    const HEADERS: &'static [&'static str] =
        &["Número_Anterior", "Número_Atual", "Quebra_Detectada"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(self.previous_number),
            Cell::Integer(self.current_number),
            Self::FLAG.into(),
        ]
    }
}

/// Column widths: widest of header and values, plus a margin of two
#[must_use]
pub fn column_widths<R: SheetRow>(rows: &[R]) -> Vec<usize> {
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.display_width());
        }
    }

    widths.into_iter().map(|w| w + 2).collect()
}
