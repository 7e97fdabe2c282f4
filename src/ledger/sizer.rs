//! Column widths and the frozen header.

use tracing::debug;

use crate::ledger::layout::{ColumnLayout, ColumnSpec, DATA_START_ROW};
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Excel's width for a column without an explicit `<col>` entry.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Extra characters added to the longest line of a column.
const AUTOSIZE_PADDING: f64 = 2.0;

/// Sizes columns to their content within the layout's bounds.
#[derive(Debug, Clone, Copy)]
pub struct Sizer<'a> {
    layout: &'a ColumnLayout,
    freeze_header: bool,
    freeze_row: u32,
}

impl<'a> Sizer<'a> {
    pub fn new(layout: &'a ColumnLayout, freeze_header: bool) -> Self {
        Self {
            layout,
            freeze_header,
            freeze_row: DATA_START_ROW,
        }
    }

    /// First row below the frozen pane, for a header found away from the
    /// standard position.
    pub fn with_freeze_row(mut self, row: u32) -> Self {
        self.freeze_row = row;
        self
    }

    /// Autosize and clamp every layout column, then freeze the rows above
    /// the data region.
    pub fn apply(&self, sheet: &mut Worksheet) {
        for column in self.layout.columns() {
            let current = autosize_width(sheet, column.ordinal)
                .or_else(|| sheet.column_width(column.ordinal))
                .unwrap_or(DEFAULT_COLUMN_WIDTH);
            let width = clamp_width(column, current);
            debug!(column = column.ordinal, autosized = current, width, "column width");
            sheet.set_column_width(column.ordinal, width);
        }

        if self.freeze_header {
            sheet.freeze_panes(self.freeze_row, 0);
        }
    }
}

/// Width fitting the longest line in a column, in characters.
///
/// Cells inside merges spanning several columns do not count toward any
/// single column. `None` when the column shows no text at all.
pub fn autosize_width(sheet: &Worksheet, col: u32) -> Option<f64> {
    sheet
        .column_cells(col)
        .filter(|(row, _)| sheet.merged_region_at(*row, col).is_none_or(|m| m.width() == 1))
        .map(|(_, value)| {
            value
                .text()
                .lines()
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0)
        })
        .filter(|len| *len > 0)
        .max()
        .map(|len| len as f64 + AUTOSIZE_PADDING)
}

/// Clamp `width` into the column's bounds.
///
/// A minimum of 0 imposes no lower bound; the width is then only capped.
pub fn clamp_width(column: &ColumnSpec, width: f64) -> f64 {
    let min = if column.min_width > 0.0 {
        column.min_width
    } else {
        width
    };
    if width < min {
        min
    } else if width > column.max_width {
        column.max_width
    } else {
        width
    }
}
