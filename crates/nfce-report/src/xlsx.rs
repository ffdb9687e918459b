//! XLSX rendering
//!
//! Writes the four report sheets into one in-memory workbook. Every sheet
//! gets a dark header row, auto-sized columns and no grid lines.

#![allow(clippy::cast_precision_loss)] // document numbers and widths are far below 2^52

use crate::error::{ReportError, Result};
use crate::sheet::{
    column_widths, Cell, SheetRow, DOCUMENTS_SHEET, SEQUENCE_SHEET, STATUS_SHEET, SUMMARY_SHEET,
};
use log::debug;
use nfce_core::{DocumentRecord, SequenceGap, StatusRecord, SummaryRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, ColNum, Format, FormatAlign, RowNum, Workbook, Worksheet};
use serde::{Deserialize, Serialize};

/// Number format used for money when none is configured
pub const DEFAULT_CURRENCY_FORMAT: &str = "R$ #,##0.00";

/// Header background
const HEADER_BACKGROUND: u32 = 0x0033_3333;

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Excel number format for currency cells
    pub currency_format: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency_format: DEFAULT_CURRENCY_FORMAT.to_string(),
        }
    }
}

/// Records to lay out, already in display order
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportData<'a> {
    pub documents: &'a [DocumentRecord],
    pub summary: &'a [SummaryRecord],
    pub statuses: &'a [StatusRecord],
    pub gaps: &'a [SequenceGap],
}

/// Cell formats shared by all sheets
struct Styles {
    header: Format,
    text: Format,
    currency: Format,
    highlight_text: Format,
    highlight_currency: Format,
}

impl Styles {
    fn new(options: &ReportOptions) -> Self {
        let centered = Format::new().set_align(FormatAlign::Center);
        Self {
            header: centered
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_BACKGROUND))
                .set_font_color(Color::White),
            currency: centered.clone().set_num_format(&options.currency_format),
            highlight_text: centered.clone().set_font_color(Color::Red),
            highlight_currency: centered
                .clone()
                .set_font_color(Color::Red)
                .set_bold()
                .set_num_format(&options.currency_format),
            text: centered,
        }
    }

    fn for_cell(&self, cell: &Cell, highlighted: bool) -> &Format {
        match (cell, highlighted) {
            (Cell::Currency(_), true) => &self.highlight_currency,
            (Cell::Currency(_), false) => &self.currency,
            (_, true) => &self.highlight_text,
            (_, false) => &self.text,
        }
    }
}

/// Render the report workbook
///
/// Sheets are written in the order documents, summary, status, sequence.
///
/// # Errors
///
/// Returns `ReportError` if a sheet exceeds the worksheet limits or the
/// workbook cannot be serialized.
#[must_use = "this function returns the workbook bytes"]
pub fn render_report(data: &ReportData<'_>, options: &ReportOptions) -> Result<Vec<u8>> {
    let styles = Styles::new(options);
    let mut workbook = Workbook::new();

    write_sheet(workbook.add_worksheet(), DOCUMENTS_SHEET, data.documents, &styles)?;
    write_sheet(workbook.add_worksheet(), SUMMARY_SHEET, data.summary, &styles)?;
    write_sheet(workbook.add_worksheet(), STATUS_SHEET, data.statuses, &styles)?;
    write_sheet(workbook.add_worksheet(), SEQUENCE_SHEET, data.gaps, &styles)?;

    let bytes = workbook.save_to_buffer()?;
    debug!("Rendered report workbook ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Money as the number stored in the cell
fn currency_number(sheet: &'static str, value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ReportError::UnrepresentableValue {
            sheet,
            value: value.to_string(),
        })
}

fn write_sheet<R: SheetRow>(
    worksheet: &mut Worksheet,
    name: &'static str,
    rows: &[R],
    styles: &Styles,
) -> Result<()> {
    let too_large = || ReportError::TooLarge {
        sheet: name,
        rows: rows.len(),
        columns: R::HEADERS.len(),
    };

    worksheet.set_name(name)?;
    worksheet.set_screen_gridlines(false);

    for (col, (header, width)) in R::HEADERS.iter().zip(column_widths(rows)).enumerate() {
        let col = ColNum::try_from(col).map_err(|_| too_large())?;
        worksheet.write_string_with_format(0, col, *header, &styles.header)?;
        worksheet.set_column_width(col, width as f64)?;
    }

    for (index, record) in rows.iter().enumerate() {
        let row = RowNum::try_from(index + 1).map_err(|_| too_large())?;
        let highlighted = record.highlighted();

        for (col, cell) in record.cells().iter().enumerate() {
            let col = ColNum::try_from(col).map_err(|_| too_large())?;
            let format = styles.for_cell(cell, highlighted);
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row, col, text, format)?;
                }
                Cell::Integer(n) => {
                    worksheet.write_number_with_format(row, col, *n as f64, format)?;
                }
                Cell::Currency(value) => {
                    let value = currency_number(name, *value)?;
                    worksheet.write_number_with_format(row, col, value, format)?;
                }
            }
        }
    }

    debug!("Wrote sheet {name} with {} rows", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cell_styles() {
        let styles = Styles::new(&ReportOptions::default());
        let money = Cell::Currency(Decimal::ONE);
        let text = Cell::from("Autorizado");
        let number = Cell::Integer(101);

        assert!(std::ptr::eq(styles.for_cell(&money, true), &styles.highlight_currency));
        assert!(std::ptr::eq(styles.for_cell(&money, false), &styles.currency));
        assert!(std::ptr::eq(styles.for_cell(&text, true), &styles.highlight_text));
        assert!(std::ptr::eq(styles.for_cell(&text, false), &styles.text));
        assert!(std::ptr::eq(styles.for_cell(&number, true), &styles.highlight_text));
        assert!(std::ptr::eq(styles.for_cell(&number, false), &styles.text));
    }

    #[test]
    fn test_style_definitions() {
        let styles = Styles::new(&ReportOptions::default());
        let centered = Format::new().set_align(FormatAlign::Center);

        assert_eq!(styles.text, centered);
        assert_eq!(
            styles.header,
            centered
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(0x0033_3333))
                .set_font_color(Color::White)
        );
        assert_eq!(
            styles.currency,
            centered.clone().set_num_format(DEFAULT_CURRENCY_FORMAT)
        );
        assert_eq!(
            styles.highlight_text,
            centered.clone().set_font_color(Color::Red)
        );
        assert_eq!(
            styles.highlight_currency,
            centered
                .set_font_color(Color::Red)
                .set_bold()
                .set_num_format(DEFAULT_CURRENCY_FORMAT)
        );
    }

    #[test]
    fn test_configured_currency_format_reaches_both_money_styles() {
        let options = ReportOptions {
            currency_format: "0.000".into(),
        };
        let styles = Styles::new(&options);
        let plain = Format::new().set_align(FormatAlign::Center);

        assert_eq!(styles.currency, plain.clone().set_num_format("0.000"));
        assert_eq!(
            styles.highlight_currency,
            plain
                .set_font_color(Color::Red)
                .set_bold()
                .set_num_format("0.000")
        );
    }

    #[test]
    fn test_currency_number() {
        let value = Decimal::from_str("1234.56").unwrap();
        let number = currency_number(DOCUMENTS_SHEET, value).unwrap();
        assert!((number - 1234.56).abs() < 1e-9);
        assert_eq!(currency_number(DOCUMENTS_SHEET, Decimal::ZERO).unwrap(), 0.0);
        assert!(currency_number(DOCUMENTS_SHEET, Decimal::MAX).unwrap().is_finite());
    }
}
