//! Appending records as data rows.

use std::ops::Range;

use tracing::{debug, warn};

use crate::common::parse_decimal;
use crate::ledger::layout::{ColumnLayout, ColumnSource, ColumnSpec, DATA_START_ROW};
use crate::ledger::record::Record;
use crate::ooxml::xlsx::cell::CellValue;
use crate::ooxml::xlsx::format::{CellBorder, CellFont, CellFormat};
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Font of the data cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFont {
    /// Preferred family; `None` leaves the workbook default
    pub name: Option<String>,
    pub size: f64,
}

impl Default for DataFont {
    fn default() -> Self {
        Self {
            name: None,
            size: 12.0,
        }
    }
}

/// Writes records below the header, one row each.
#[derive(Debug, Clone)]
pub struct RowAppender<'a> {
    layout: &'a ColumnLayout,
    format: CellFormat,
}

impl<'a> RowAppender<'a> {
    pub fn new(layout: &'a ColumnLayout, font: DataFont) -> Self {
        let format = CellFormat::centered_wrapped()
            .with_font(CellFont {
                name: font.name,
                size: Some(font.size),
                italic: true,
                ..Default::default()
            })
            .with_border(CellBorder::thin());
        Self { layout, format }
    }

    /// The format every data cell gets.
    pub fn data_format(&self) -> &CellFormat {
        &self.format
    }

    /// First row at or below the data start that follows the last
    /// non-blank row.
    ///
    /// Walks back from the sheet tail over blank rows, then forward over
    /// non-blank ones. Blank rows between data rows are left alone.
    pub fn next_row(&self, sheet: &Worksheet) -> u32 {
        let mut row = sheet
            .last_row()
            .map_or(DATA_START_ROW, |last| DATA_START_ROW.max(last.saturating_add(1)));
        while row > DATA_START_ROW && sheet.is_row_blank(row - 1) {
            row -= 1;
        }
        while !sheet.is_row_blank(row) {
            row += 1;
        }
        row
    }

    /// Append `records` with display indices counting up from
    /// `start_index`, returning the rows written.
    ///
    /// Whatever lies below the appended block is dropped, so stray blank
    /// rows from earlier runs do not survive.
    pub fn append(&self, sheet: &mut Worksheet, records: &[Record], start_index: i64) -> Range<u32> {
        let first = self.next_row(sheet);
        debug!(row = first, records = records.len(), "append position");

        let mut row = first;
        for (offset, record) in records.iter().enumerate() {
            let index = start_index + offset as i64;
            for column in self.layout.columns() {
                let value = self.cell_value(column, record, index, row);
                sheet.set_cell_value(row, column.ordinal, value);
                sheet.set_cell_format(row, column.ordinal, self.format.clone());
            }
            row += 1;
        }

        sheet.truncate_rows(row);
        first..row
    }

    fn cell_value(&self, column: &ColumnSpec, record: &Record, index: i64, row: u32) -> CellValue {
        let text = match &column.source {
            ColumnSource::DisplayIndex => return CellValue::Int(index),
            ColumnSource::Field(field) => record.get(*field).unwrap_or_default(),
            ColumnSource::Constant(text) => text.as_str(),
            ColumnSource::Blank => "",
        };

        if column.numeric && !text.trim().is_empty() {
            match parse_decimal(text) {
                Some(number) => return number_value(number),
                None => warn!(
                    row,
                    column = column.ordinal,
                    value = text,
                    "value is not a number, written as text"
                ),
            }
        }
        CellValue::String(text.to_string())
    }
}

/// Whole numbers are stored as integers.
fn number_value(number: f64) -> CellValue {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        CellValue::Int(number as i64)
    } else {
        CellValue::Float(number)
    }
}
