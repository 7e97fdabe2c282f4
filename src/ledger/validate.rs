//! Header check for an existing ledger.

use tracing::debug;

use crate::common::{Error, Result};
use crate::ledger::layout::{ColumnLayout, ColumnSpec, HeaderAnchor};
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Finds the leaf header row of an existing sheet and compares it with a
/// [`ColumnLayout`].
///
/// The lookup is a text heuristic: the anchor column's leaf label marks the
/// leaf row; failing that, the anchor column's group label marks the row
/// above it.
#[derive(Debug, Clone, Copy)]
pub struct HeaderValidator<'a> {
    layout: &'a ColumnLayout,
    scan_rows: u32,
}

impl<'a> HeaderValidator<'a> {
    pub fn new(layout: &'a ColumnLayout, scan_rows: u32) -> Self {
        Self { layout, scan_rows }
    }

    /// Row index of the leaf header, if one of the anchors is found within
    /// the scanned rows.
    ///
    /// A group anchor on the last row of the sheet has no leaf row below it
    /// and does not count.
    pub fn locate_leaf_row(&self, sheet: &Worksheet) -> Option<u32> {
        let anchor = self.layout.anchor()?;
        let rows = self.scanned_rows(sheet);

        let by_leaf = rows
            .clone()
            .find(|&row| matches_label(sheet, row, &anchor, anchor.leaf_label));
        if by_leaf.is_some() {
            return by_leaf;
        }

        let last_row = sheet.last_row()?;
        rows.into_iter()
            .find(|&row| matches_label(sheet, row, &anchor, anchor.group_label))
            .filter(|&row| row < last_row)
            .map(|row| row + 1)
    }

    /// Check the header and return the leaf row.
    ///
    /// Grouped columns are compared on the leaf row. A single column's label
    /// is merged down from the row above, so it is compared there and its
    /// leaf cell may be blank or repeat the label. The first mismatching
    /// column is reported, numbered from 1.
    pub fn validate(&self, sheet: &Worksheet) -> Result<u32> {
        let leaf_row = self.locate_leaf_row(sheet).ok_or(Error::HeaderNotFound {
            scanned_rows: self.scan_rows,
        })?;
        debug!(leaf_row, "leaf header row located");

        for column in self.layout.columns() {
            if let Some(found) = mismatch(sheet, leaf_row, column) {
                return Err(Error::HeaderMismatch {
                    column: column.ordinal + 1,
                    expected: column.leaf_label.clone(),
                    found,
                });
            }
        }

        Ok(leaf_row)
    }

    fn scanned_rows(&self, sheet: &Worksheet) -> std::ops::Range<u32> {
        let end = sheet
            .last_row()
            .map_or(0, |last| self.scan_rows.min(last.saturating_add(1)));
        0..end
    }
}

fn matches_label(sheet: &Worksheet, row: u32, anchor: &HeaderAnchor<'_>, label: &str) -> bool {
    sheet.cell_text(row, anchor.column) == label
}

/// The text found in place of `column`'s label, or `None` when it matches.
fn mismatch(sheet: &Worksheet, leaf_row: u32, column: &ColumnSpec) -> Option<String> {
    let expected = column.leaf_label.trim();
    let leaf = sheet.cell_text(leaf_row, column.ordinal);
    if !column.is_single() {
        return (leaf != expected).then_some(leaf);
    }

    let merged = leaf_row
        .checked_sub(1)
        .map(|row| sheet.cell_text(row, column.ordinal))
        .unwrap_or_default();
    if merged.is_empty() {
        // label written on the leaf row only
        return (leaf != expected).then_some(leaf);
    }
    if merged != expected {
        return Some(merged);
    }
    (!leaf.is_empty() && leaf != expected).then_some(leaf)
}
