//! The append-or-create ledger engine.
//!
//! A ledger is a single-sheet `.xlsx` file with two banner rows, a
//! two-level header and one data row per record. Every run loads the
//! whole file, appends a batch below the last non-blank row, resizes the
//! columns and replaces the file through a temporary sibling:
//!
//! ```text
//! open or create ─► build header | validate header ─► append rows ─► size columns ─► commit
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sheet_ledger::{Record, RecordField, append_or_create};
//!
//! let records = vec![
//!     Record::new()
//!         .with(RecordField::ReferenceNumber, "24RO1234567890ABC1")
//!         .with(RecordField::Weight, "12,5"),
//! ];
//! let written = append_or_create("registru.xlsx", &records, 1)?;
//! assert_eq!(written, 1);
//! # Ok::<(), sheet_ledger::Error>(())
//! ```

pub mod append;
pub mod commit;
pub mod extractor;
pub mod fonts;
pub mod header;
pub mod layout;
pub mod options;
pub mod record;
pub mod sizer;
pub mod validate;


use std::ops::Range;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info};

pub use append::{DataFont, RowAppender};
pub use commit::{AtomicCommitter, temp_path};
pub use extractor::{ExtractorItem, SkippedItem, parse_extractor_output, split_batch};
pub use fonts::{HostOs, preferred_decorative_font};
pub use header::HeaderBuilder;
pub use layout::{Banner, ColumnLayout, ColumnSource, ColumnSpec, DATA_START_ROW};
pub use options::LedgerOptions;
pub use record::{Record, RecordField};
pub use sizer::Sizer;
pub use validate::HeaderValidator;

use crate::common::{Error, Result};
use crate::ledger::layout::LEAF_ROW;
use crate::ooxml::xlsx::{Worksheet, XlsxDocument};

const CREATOR: &str = "sheet-ledger";

/// Outcome of one append call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub rows_written: usize,
    /// Sheet rows written (0-based); empty when nothing was written
    pub rows: Range<u32>,
    /// Display indices written
    pub indices: Range<i64>,
    /// Whether the ledger file was created by this call
    pub created: bool,
}

impl AppendReport {
    fn nothing(start_index: i64) -> Self {
        Self {
            rows_written: 0,
            rows: 0..0,
            indices: start_index..start_index,
            created: false,
        }
    }
}

/// A column layout and options bound together, ready to append batches.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    layout: ColumnLayout,
    options: LedgerOptions,
    data_font: DataFont,
    committer: AtomicCommitter,
}

impl LedgerWriter {
    /// Validates both the layout and the options.
    pub fn new(layout: ColumnLayout, options: LedgerOptions) -> Result<Self> {
        layout.validate()?;
        options.validate()?;

        let name = if options.decorative_font {
            preferred_decorative_font(HostOs::current())
        } else {
            None
        };
        let data_font = DataFont {
            name,
            size: options.data_font_size,
        };
        let committer = AtomicCommitter::new(options.temp_suffix.clone());

        Ok(Self {
            layout,
            options,
            data_font,
            committer,
        })
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    /// Append `records` to the ledger at `path`, creating it if absent.
    ///
    /// Display indices run from `start_index` upward. An empty batch
    /// touches nothing on disk. Any error leaves the file as it was.
    pub fn append(
        &self,
        path: impl AsRef<Path>,
        records: &[Record],
        start_index: i64,
    ) -> Result<AppendReport> {
        let path = path.as_ref();
        let end_index = check_indices(start_index, records.len())?;

        if records.is_empty() {
            debug!(path = %path.display(), "empty batch, nothing to do");
            return Ok(AppendReport::nothing(start_index));
        }

        let created = !path.try_exists()?;
        let mut doc = if created {
            info!(path = %path.display(), "creating new ledger");
            XlsxDocument::with_sheet(Worksheet::new(self.options.sheet_name.as_str()))
        } else {
            XlsxDocument::open(path)?
        };

        let rows = {
            let sheet = doc.sheet_mut(0).ok_or_else(|| Error::CorruptDocument {
                path: path.to_path_buf(),
                reason: "workbook has no sheets".to_string(),
            })?;
            let leaf_row = self.prepare_header(sheet, created)?;

            let rows = RowAppender::new(&self.layout, self.data_font.clone())
                .append(sheet, records, start_index);
            Sizer::new(&self.layout, self.options.freeze_header)
                .with_freeze_row(leaf_row + 1)
                .apply(sheet);
            rows
        };

        self.stamp_properties(&mut doc);
        self.committer.commit(&doc, path)?;

        info!(
            path = %path.display(),
            rows = records.len(),
            first_index = start_index,
            last_index = end_index - 1,
            created,
            "ledger committed"
        );

        Ok(AppendReport {
            rows_written: records.len(),
            rows,
            indices: start_index..end_index,
            created,
        })
    }

    /// Build or check the header and return its leaf row.
    fn prepare_header(&self, sheet: &mut Worksheet, created: bool) -> Result<u32> {
        if created {
            HeaderBuilder::new(&self.layout).build(sheet)?;
            return Ok(LEAF_ROW);
        }

        let leaf_row = HeaderValidator::new(&self.layout, self.options.header_scan_rows).validate(sheet)?;
        if leaf_row + 1 != DATA_START_ROW {
            debug!(leaf_row, "header found away from the standard position");
        }
        Ok(leaf_row)
    }

    fn stamp_properties(&self, doc: &mut XlsxDocument) {
        let now = Utc::now();
        let props = doc.properties_mut();
        if props.title.is_none() {
            props.title = Some(self.layout.banner().title.clone());
        }
        if props.creator.is_none() {
            props.creator = Some(CREATOR.to_string());
        }
        props.last_modified_by = Some(CREATOR.to_string());
        props.created.get_or_insert(now);
        props.modified = Some(now);
    }
}

/// Check the start index and return one past the last index of a batch.
fn check_indices(start_index: i64, len: usize) -> Result<i64> {
    if start_index < 1 {
        return Err(Error::InvalidStartIndex(start_index));
    }
    i64::try_from(len)
        .ok()
        .and_then(|len| start_index.checked_add(len))
        .ok_or(Error::InvalidStartIndex(start_index))
}

/// Append `records` to the ledger at `path` with the reference layout and
/// default options, returning the number of rows written.
///
/// Creates the ledger (banner and header) when `path` does not exist and
/// validates the header when it does. `start_index` must be at least 1.
pub fn append_or_create(path: impl AsRef<Path>, records: &[Record], start_index: i64) -> Result<usize> {
    let writer = LedgerWriter::new(ColumnLayout::reference(), LedgerOptions::default())?;
    Ok(writer.append(path, records, start_index)?.rows_written)
}
