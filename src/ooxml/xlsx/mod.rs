//! Excel (.xlsx) spreadsheet support.
//!
//! A small read/modify/write model of SpreadsheetML: a document is loaded
//! into [`Worksheet`]s, edited cell by cell and serialized back into a
//! fresh package.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheet_ledger::ooxml::xlsx::{XlsxDocument, Worksheet};
//!
//! let mut sheet = Worksheet::new("Registru");
//! sheet.set_cell_value(0, 0, "REGISTRU");
//! sheet.freeze_panes(4, 0);
//!
//! let bytes = XlsxDocument::with_sheet(sheet).to_bytes()?;
//! let loaded = XlsxDocument::from_bytes(&bytes)?;
//! assert_eq!(loaded.sheets()[0].cell_text(0, 0), "REGISTRU");
//! # Ok::<(), sheet_ledger::Error>(())
//! ```

pub mod cell;
pub mod format;
pub mod parsers;
pub mod workbook;
pub mod worksheet;
pub mod writer;

pub use cell::{CellValue, cell_reference, column_to_letters};
pub use format::{
    CellAlignment, CellBorder, CellBorderLineStyle, CellBorderSide, CellFill, CellFillPatternType,
    CellFont, CellFormat, HorizontalAlignment, NumberFormat, VerticalAlignment,
};
pub use workbook::XlsxDocument;
pub use worksheet::{FreezePanes, MergedRegion, Worksheet};
