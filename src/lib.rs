//! Sheet Ledger - an append-or-create engine for a spreadsheet goods ledger
//!
//! The ledger is a single `.xlsx` file that grows by one batch of records
//! per run. Each run loads the whole file, checks that its header still
//! matches the expected column layout, appends the batch below the last
//! non-blank row and replaces the file through a temporary sibling, so an
//! interrupted or failed run never leaves a half-written ledger behind.
//!
//! # Features
//!
//! - **Create or validate**: a missing ledger is created with its banner and
//!   two-level header; an existing one must pass the header check first
//! - **Dense appends**: stray blank rows left at the tail are skipped and
//!   dropped, display indices come from the caller
//! - **Numeric columns**: quantities and weights written with either `.` or
//!   `,` as decimal separator are stored as numbers
//! - **Atomic commit**: temp file plus rename, with a copy fallback where the
//!   platform cannot rename over the target
//! - **Extractor helpers**: parse and filter the JSON batch an external
//!   extraction step prints
//!
//! # Example
//!
//! ```no_run
//! use sheet_ledger::{parse_extractor_output, split_batch, append_or_create};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! sheet_ledger::init_tracing();
//!
//! let output = std::fs::read_to_string("extractor-output.json")?;
//! let (records, skipped) = split_batch(parse_extractor_output(&output)?);
//! for item in &skipped {
//!     eprintln!("skipped {}: {}", item.file, item.reason);
//! }
//!
//! let written = append_or_create("registru.xlsx", &records, 1)?;
//! println!("{} rows appended", written);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Custom options
//!
//! ```no_run
//! use sheet_ledger::{ColumnLayout, LedgerOptions, LedgerWriter, Record, RecordField};
//!
//! # fn main() -> Result<(), sheet_ledger::Error> {
//! let options = LedgerOptions::from_yaml_str("sheet_name: Iesiri\ntemp_suffix: .partial\n")?;
//! let writer = LedgerWriter::new(ColumnLayout::reference(), options)?;
//!
//! let record = Record::new().with(RecordField::ReferenceNumber, "24RO1234567890ABC1");
//! let report = writer.append("registru.xlsx", &[record], 42)?;
//! println!("rows {:?}, indices {:?}", report.rows, report.indices);
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod ledger;
pub mod ooxml;

pub use common::{Error, ErrorKind, Result, init_tracing};
pub use ledger::{
    AppendReport, ColumnLayout, ColumnSpec, ExtractorItem, LedgerOptions, LedgerWriter, Record,
    RecordField, SkippedItem, append_or_create, parse_extractor_output, split_batch,
};
