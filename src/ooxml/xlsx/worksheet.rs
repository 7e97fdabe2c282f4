//! In-memory worksheet model.
//!
//! A [`Worksheet`] is a sparse grid: only cells that carry a value or a
//! format are stored. All coordinates are 0-based (row 0 is the first row,
//! column 0 is column A); conversion to A1 references happens only when a
//! part is written.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::cell::{CellValue, cell_reference, parse_range_reference};
use super::format::{CellBorder, CellFormat};
use crate::common::{Error, Result};

/// A rectangular merged cell region (inclusive bounds, 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergedRegion {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergedRegion {
    /// Create a region, normalizing the corners.
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    /// Parse an A1 range such as `A1:O1`.
    pub fn from_reference(range: &str) -> Result<Self> {
        let (r1, c1, r2, c2) = parse_range_reference(range)?;
        Ok(Self::new(r1, c1, r2, c2))
    }

    /// Whether the cell lies inside the region.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Whether two regions share at least one cell.
    pub fn overlaps(&self, other: &MergedRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    /// A region one column wide spanning several rows.
    pub fn is_vertical(&self) -> bool {
        self.first_col == self.last_col && self.last_row > self.first_row
    }

    /// Number of columns covered.
    pub fn width(&self) -> u32 {
        self.last_col - self.first_col + 1
    }
}

impl fmt::Display for MergedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_reference(self.first_row, self.first_col),
            cell_reference(self.last_row, self.last_col)
        )
    }
}

/// Frozen pane split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePanes {
    /// Number of rows kept visible at the top
    pub rows: u32,
    /// Number of columns kept visible at the left
    pub cols: u32,
}

/// A single worksheet of an [`XlsxDocument`](super::XlsxDocument).
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    /// Cell values keyed by (row, col)
    cells: BTreeMap<(u32, u32), CellValue>,
    /// Cell formats keyed by (row, col)
    formats: HashMap<(u32, u32), CellFormat>,
    merged: Vec<MergedRegion>,
    /// Column widths in character units
    column_widths: BTreeMap<u32, f64>,
    /// Row heights in points
    row_heights: BTreeMap<u32, f64>,
    freeze: Option<FreezePanes>,
}

impl Worksheet {
    /// Create an empty worksheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell value.
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) {
        self.cells.insert((row, col), value.into());
    }

    /// Set cell formatting.
    pub fn set_cell_format(&mut self, row: u32, col: u32, format: CellFormat) {
        self.formats.insert((row, col), format);
    }

    /// Get a cell value.
    pub fn cell_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Trimmed text of a cell, empty when the cell does not exist.
    pub fn cell_text(&self, row: u32, col: u32) -> String {
        self.cell_value(row, col)
            .map(CellValue::text)
            .unwrap_or_default()
    }

    /// Get a cell format.
    pub fn cell_format(&self, row: u32, col: u32) -> Option<&CellFormat> {
        self.formats.get(&(row, col))
    }

    /// All stored cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &CellValue)> {
        self.cells.iter().map(|(pos, value)| (*pos, value))
    }

    /// All cell formats (unordered).
    pub fn cell_formats(&self) -> &HashMap<(u32, u32), CellFormat> {
        &self.formats
    }

    /// Stored cells of one column, top to bottom.
    pub fn column_cells(&self, col: u32) -> impl Iterator<Item = (u32, &CellValue)> {
        self.cells
            .iter()
            .filter(move |((_, c), _)| *c == col)
            .map(|((r, _), value)| (*r, value))
    }

    /// Merge cells in a rectangular range.
    ///
    /// Fails when the region overlaps an existing merged region.
    pub fn merge_cells(&mut self, region: MergedRegion) -> Result<()> {
        if let Some(existing) = self.merged.iter().find(|m| m.overlaps(&region)) {
            return Err(Error::InvalidLayout(format!(
                "merged region {} overlaps {}",
                region, existing
            )));
        }
        self.merged.push(region);
        Ok(())
    }

    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    /// The merged region covering a cell, if any.
    pub fn merged_region_at(&self, row: u32, col: u32) -> Option<&MergedRegion> {
        self.merged.iter().find(|m| m.contains(row, col))
    }

    /// Set column width in characters.
    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub(crate) fn column_widths(&self) -> &BTreeMap<u32, f64> {
        &self.column_widths
    }

    /// Set row height in points.
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Freeze panes at the specified position.
    ///
    /// `freeze_panes(0, 0)` removes the split.
    pub fn freeze_panes(&mut self, rows: u32, cols: u32) {
        self.freeze = (rows > 0 || cols > 0).then_some(FreezePanes { rows, cols });
    }

    pub fn frozen_panes(&self) -> Option<FreezePanes> {
        self.freeze
    }

    /// Index of the last row holding a value or a format.
    pub fn last_row(&self) -> Option<u32> {
        let by_value = self.cells.keys().next_back().map(|(r, _)| *r);
        let by_format = self.formats.keys().map(|(r, _)| *r).max();
        by_value.max(by_format)
    }

    /// Whether no cell of the row shows any text.
    pub fn is_row_blank(&self, row: u32) -> bool {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .all(|(_, value)| value.is_blank())
    }

    /// Whether the sheet holds no values, formats or merges at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.formats.is_empty() && self.merged.is_empty()
    }

    /// Move every row at or below `start` down by `count` rows.
    ///
    /// Values, formats, row heights and merged regions starting at or below
    /// `start` move together.
    pub fn shift_rows(&mut self, start: u32, count: u32) {
        if count == 0 {
            return;
        }

        let moved: Vec<_> = self
            .cells
            .split_off(&(start, 0))
            .into_iter()
            .map(|((r, c), v)| ((r + count, c), v))
            .collect();
        self.cells.extend(moved);

        self.formats = std::mem::take(&mut self.formats)
            .into_iter()
            .map(|((r, c), f)| if r >= start { ((r + count, c), f) } else { ((r, c), f) })
            .collect();

        let heights: Vec<_> = self
            .row_heights
            .split_off(&start)
            .into_iter()
            .map(|(r, h)| (r + count, h))
            .collect();
        self.row_heights.extend(heights);

        for region in self.merged.iter_mut().filter(|m| m.first_row >= start) {
            region.first_row += count;
            region.last_row += count;
        }
    }

    /// Remove values, formats and height of one row.
    pub fn clear_row(&mut self, row: u32) {
        let tail = self.cells.split_off(&(row, 0));
        self.cells
            .extend(tail.into_iter().filter(|((r, _), _)| *r != row));
        self.formats.retain(|(r, _), _| *r != row);
        self.row_heights.remove(&row);
    }

    /// Drop every row at or below `start`, together with the merged regions
    /// that begin there.
    pub fn truncate_rows(&mut self, start: u32) {
        self.cells.split_off(&(start, 0));
        self.formats.retain(|(r, _), _| *r < start);
        self.row_heights.split_off(&start);
        self.merged.retain(|m| m.first_row < start);
    }

    /// Remove the merged regions touching any row in `first_row..=last_row`.
    ///
    /// Returns how many regions were removed. Cell contents are kept.
    pub fn unmerge_rows(&mut self, first_row: u32, last_row: u32) -> usize {
        let before = self.merged.len();
        self.merged
            .retain(|m| m.last_row < first_row || m.first_row > last_row);
        before - self.merged.len()
    }

    /// Put a border on every cell of a region, keeping the rest of each
    /// cell's format.
    ///
    /// Borders on merged cells are only drawn along the full rectangle when
    /// every covered cell carries them, not just the anchor.
    pub fn outline_region(&mut self, region: &MergedRegion, border: &CellBorder) {
        for row in region.first_row..=region.last_row {
            for col in region.first_col..=region.last_col {
                let format = self.formats.entry((row, col)).or_default();
                format.border = Some(border.clone());
            }
        }
    }

    /// The used range (min_row, min_col, max_row, max_col).
    pub fn used_range(&self) -> Option<(u32, u32, u32, u32)> {
        let positions = self.cells.keys().chain(self.formats.keys());
        let mut range: Option<(u32, u32, u32, u32)> = None;
        for &(r, c) in positions {
            range = Some(match range {
                None => (r, c, r, c),
                Some((r1, c1, r2, c2)) => (r1.min(r), c1.min(c), r2.max(r), c2.max(c)),
            });
        }
        range
    }

    pub(crate) fn push_merged_unchecked(&mut self, region: MergedRegion) {
        self.merged.push(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rejects_overlap() {
        let mut ws = Worksheet::new("Sheet1");
        ws.merge_cells(MergedRegion::new(0, 0, 0, 14)).unwrap();
        ws.merge_cells(MergedRegion::new(1, 0, 1, 12)).unwrap();

        let err = ws.merge_cells(MergedRegion::new(0, 3, 1, 3)).unwrap_err();
        assert!(err.to_string().contains("A1:O1"));
        assert_eq!(ws.merged_regions().len(), 2);
    }

    #[test]
    fn test_region_reference() {
        let region = MergedRegion::from_reference("C3:E3").unwrap();
        assert_eq!(region, MergedRegion::new(2, 2, 2, 4));
        assert_eq!(region.to_string(), "C3:E3");
        assert_eq!(region.width(), 3);
        assert!(!region.is_vertical());
        assert!(MergedRegion::new(2, 0, 3, 0).is_vertical());
    }

    #[test]
    fn test_last_row_and_blank_rows() {
        let mut ws = Worksheet::new("Sheet1");
        assert_eq!(ws.last_row(), None);

        ws.set_cell_value(4, 0, 1i64);
        ws.set_cell_value(6, 3, "   ");
        ws.set_cell_format(7, 1, CellFormat::centered_wrapped());

        assert_eq!(ws.last_row(), Some(7));
        assert!(!ws.is_row_blank(4));
        assert!(ws.is_row_blank(5));
        assert!(ws.is_row_blank(6));
        assert!(ws.is_row_blank(7));
    }

    #[test]
    fn test_shift_rows_moves_everything_below() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value(0, 0, "keep");
        ws.set_cell_value(1, 0, "a");
        ws.set_cell_value(2, 1, 3i64);
        ws.set_cell_format(2, 1, CellFormat::centered_wrapped());
        ws.set_row_height(1, 30.0);
        ws.merge_cells(MergedRegion::new(1, 0, 1, 2)).unwrap();

        ws.shift_rows(1, 2);

        assert_eq!(ws.cell_text(0, 0), "keep");
        assert_eq!(ws.cell_value(1, 0), None);
        assert_eq!(ws.cell_text(3, 0), "a");
        assert_eq!(ws.cell_value(4, 1), Some(&CellValue::Int(3)));
        assert!(ws.cell_format(4, 1).is_some());
        assert!(ws.cell_format(2, 1).is_none());
        assert_eq!(ws.row_height(3), Some(30.0));
        assert_eq!(ws.merged_regions()[0], MergedRegion::new(3, 0, 3, 2));
    }

    #[test]
    fn test_clear_row() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value(5, 0, 1i64);
        ws.set_cell_value(5, 4, "x");
        ws.set_cell_value(6, 0, 2i64);
        ws.set_cell_format(5, 4, CellFormat::centered_wrapped());

        ws.clear_row(5);

        assert!(ws.cell_value(5, 0).is_none());
        assert!(ws.cell_format(5, 4).is_none());
        assert_eq!(ws.cell_value(6, 0), Some(&CellValue::Int(2)));
        assert_eq!(ws.last_row(), Some(6));
    }

    #[test]
    fn test_truncate_and_unmerge_rows() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value(4, 0, 1i64);
        ws.set_cell_format(6, 0, CellFormat::centered_wrapped());
        ws.set_row_height(7, 20.0);
        ws.merge_cells(MergedRegion::new(2, 0, 3, 0)).unwrap();
        ws.merge_cells(MergedRegion::new(8, 0, 8, 3)).unwrap();

        ws.truncate_rows(5);
        assert_eq!(ws.last_row(), Some(4));
        assert_eq!(ws.row_height(7), None);
        assert_eq!(ws.merged_regions(), &[MergedRegion::new(2, 0, 3, 0)]);

        assert_eq!(ws.unmerge_rows(3, 3), 1);
        assert!(ws.merged_regions().is_empty());
        assert_eq!(ws.cell_value(4, 0), Some(&CellValue::Int(1)));
    }

    #[test]
    fn test_outline_region_keeps_other_formatting() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_format(2, 2, CellFormat::centered_wrapped());
        let region = MergedRegion::new(2, 2, 2, 5);

        ws.outline_region(&region, &CellBorder::thin());

        for col in 2..=5 {
            let format = ws.cell_format(2, col).unwrap();
            assert!(format.border.as_ref().unwrap().is_closed());
        }
        assert!(ws.cell_format(2, 2).unwrap().alignment.is_some());
    }

    #[test]
    fn test_freeze_panes() {
        let mut ws = Worksheet::new("Sheet1");
        ws.freeze_panes(4, 0);
        assert_eq!(ws.frozen_panes(), Some(FreezePanes { rows: 4, cols: 0 }));
        ws.freeze_panes(0, 0);
        assert_eq!(ws.frozen_panes(), None);
    }
}
