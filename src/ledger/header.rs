//! Banner and two-level header of a new ledger.

use tracing::debug;

use crate::common::Result;
use crate::ledger::layout::{
    ColumnLayout, GROUP_ROW, GROUP_ROW_HEIGHT, LEAF_ROW, LEAF_ROW_HEIGHT, SUB_BANNER_ROW,
    SUB_BANNER_ROW_HEIGHT, TITLE_ROW, TITLE_ROW_HEIGHT,
};
use crate::ooxml::xlsx::format::{CellBorder, CellFont, CellFormat};
use crate::ooxml::xlsx::worksheet::{MergedRegion, Worksheet};

const TITLE_FONT_SIZE: f64 = 18.0;
const BANNER_FONT_SIZE: f64 = 11.0;
const HEADER_FONT_SIZE: f64 = 11.0;

/// Number of banner rows above the header.
const BANNER_ROWS: u32 = SUB_BANNER_ROW - TITLE_ROW + 1;

/// Writes the banner rows and the group/leaf header rows for a layout.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBuilder<'a> {
    layout: &'a ColumnLayout,
}

impl<'a> HeaderBuilder<'a> {
    pub fn new(layout: &'a ColumnLayout) -> Self {
        Self { layout }
    }

    /// Write banner and header into `sheet`.
    ///
    /// On a sheet that already has rows, those rows are first moved down by
    /// the two banner rows; whatever then sits on the header rows is
    /// replaced by the header.
    pub fn build(&self, sheet: &mut Worksheet) -> Result<()> {
        self.write_banner(sheet)?;
        self.write_header(sheet)
    }

    /// Write the title and the two sub-banners on rows 0 and 1.
    pub fn write_banner(&self, sheet: &mut Worksheet) -> Result<()> {
        if !sheet.is_empty() {
            debug!(rows = BANNER_ROWS, "shifting existing rows below the banner");
            sheet.shift_rows(TITLE_ROW, BANNER_ROWS);
        }

        let banner = self.layout.banner();
        let last_col = self.layout.last_column();
        let title_format = banner_format(TITLE_FONT_SIZE);
        let sub_format = banner_format(BANNER_FONT_SIZE);

        sheet.set_row_height(TITLE_ROW, TITLE_ROW_HEIGHT);
        self.labelled_region(
            sheet,
            MergedRegion::new(TITLE_ROW, 0, TITLE_ROW, last_col),
            &banner.title,
            &title_format,
        )?;

        sheet.set_row_height(SUB_BANNER_ROW, SUB_BANNER_ROW_HEIGHT);
        self.labelled_region(
            sheet,
            MergedRegion::new(SUB_BANNER_ROW, 0, SUB_BANNER_ROW, banner.split - 1),
            &banner.left_label,
            &sub_format,
        )?;
        self.labelled_region(
            sheet,
            MergedRegion::new(SUB_BANNER_ROW, banner.split, SUB_BANNER_ROW, last_col),
            &banner.right_label,
            &sub_format,
        )
    }

    /// Write the group row and the leaf row.
    ///
    /// Multi-column groups get their label merged across the group on the
    /// group row and one leaf label per column below it. A single column
    /// gets its label once, merged down over both rows.
    pub fn write_header(&self, sheet: &mut Worksheet) -> Result<()> {
        sheet.unmerge_rows(GROUP_ROW, LEAF_ROW);
        sheet.clear_row(GROUP_ROW);
        sheet.clear_row(LEAF_ROW);
        sheet.set_row_height(GROUP_ROW, GROUP_ROW_HEIGHT);
        sheet.set_row_height(LEAF_ROW, LEAF_ROW_HEIGHT);

        let format = header_format();
        for col in 0..self.layout.len() {
            sheet.set_cell_format(GROUP_ROW, col, format.clone());
            sheet.set_cell_format(LEAF_ROW, col, format.clone());
        }

        for group in self.layout.groups() {
            if group.single {
                let region = MergedRegion::new(GROUP_ROW, group.first, LEAF_ROW, group.first);
                self.labelled_region(sheet, region, group.label, &format)?;
                continue;
            }

            let region = MergedRegion::new(GROUP_ROW, group.first, GROUP_ROW, group.last);
            self.labelled_region(sheet, region, group.label, &format)?;
            for col in group.first..=group.last {
                if let Some(column) = self.layout.column(col) {
                    sheet.set_cell_value(LEAF_ROW, col, column.leaf_label.as_str());
                }
            }
        }

        debug!(columns = self.layout.len(), "header written");
        Ok(())
    }

    /// Label the anchor of `region`, format and merge it, and border the
    /// whole rectangle.
    fn labelled_region(
        &self,
        sheet: &mut Worksheet,
        region: MergedRegion,
        label: &str,
        format: &CellFormat,
    ) -> Result<()> {
        for row in region.first_row..=region.last_row {
            for col in region.first_col..=region.last_col {
                sheet.set_cell_format(row, col, format.clone());
            }
        }
        sheet.set_cell_value(region.first_row, region.first_col, label);
        if region.width() > 1 || region.is_vertical() {
            sheet.merge_cells(region)?;
        }
        sheet.outline_region(&region, &CellBorder::thin());
        Ok(())
    }
}

fn banner_format(size: f64) -> CellFormat {
    CellFormat::centered_wrapped().with_font(CellFont::bold(size))
}

fn header_format() -> CellFormat {
    CellFormat::centered_wrapped()
        .with_font(CellFont::bold(HEADER_FONT_SIZE))
        .with_border(CellBorder::thin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::cell::CellValue;

    fn built() -> Worksheet {
        let layout = ColumnLayout::reference();
        let mut sheet = Worksheet::new("Registru");
        HeaderBuilder::new(&layout).build(&mut sheet).unwrap();
        sheet
    }

    #[test]
    fn banner_regions() {
        let sheet = built();
        let regions = sheet.merged_regions();

        assert!(regions.contains(&MergedRegion::new(0, 0, 0, 14)));
        assert!(regions.contains(&MergedRegion::new(1, 0, 1, 12)));
        assert!(regions.contains(&MergedRegion::new(1, 13, 1, 14)));
        assert_eq!(sheet.cell_text(0, 0), "REGISTRU DE EVIDENȚĂ A MĂRFURILOR LA IEȘIRE");
        assert_eq!(sheet.cell_text(1, 0), "PREZENTATE LA IEȘIRE");
        assert_eq!(sheet.cell_text(1, 13), "IEȘIRE EFECTIVĂ");
        assert_eq!(sheet.row_height(0), Some(26.0));
        assert_eq!(sheet.row_height(1), Some(18.0));

        let title = sheet.cell_format(0, 0).unwrap();
        assert!(title.font.as_ref().unwrap().bold);
        assert!(title.alignment.as_ref().unwrap().wrap_text);
    }

    #[test]
    fn header_groups_and_leaves() {
        let sheet = built();
        let regions = sheet.merged_regions();

        // multi-column groups merge horizontally on the group row
        assert!(regions.contains(&MergedRegion::new(2, 2, 2, 5)));
        assert!(regions.contains(&MergedRegion::new(2, 8, 2, 10)));
        assert_eq!(sheet.cell_text(2, 2), "Documente însoțitoare");
        assert_eq!(sheet.cell_text(2, 8), "Colete");

        let leaves: Vec<String> = (2..=5).map(|c| sheet.cell_text(3, c)).collect();
        assert_eq!(leaves, vec!["Felul", "Numărul", "Data", "De unde provine"]);
        assert_eq!(sheet.cell_text(3, 9), "Buc.");

        // single columns merge vertically with no duplicate leaf text
        for col in [0, 1, 6, 7, 11, 12, 13, 14] {
            assert!(regions.contains(&MergedRegion::new(2, col, 3, col)), "column {}", col);
            assert_eq!(sheet.cell_value(3, col), None);
        }
        assert_eq!(sheet.cell_value(2, 0), Some(&CellValue::String("Nr. crt.".into())));
        assert_eq!(regions.len(), 3 + 2 + 8);
    }

    #[test]
    fn every_merged_cell_is_bordered() {
        let sheet = built();
        for region in sheet.merged_regions() {
            for row in region.first_row..=region.last_row {
                for col in region.first_col..=region.last_col {
                    let border = sheet.cell_format(row, col).and_then(|f| f.border.as_ref());
                    assert!(border.is_some_and(|b| b.is_closed()), "{} at ({}, {})", region, row, col);
                }
            }
        }
    }

    #[test]
    fn retrofit_moves_existing_rows_down_by_two() {
        let layout = ColumnLayout::reference();
        let mut sheet = Worksheet::new("Registru");
        // a banner-less ledger: header on rows 0-1, data from row 2
        sheet.set_cell_value(0, 2, "Documente însoțitoare");
        sheet.merge_cells(MergedRegion::new(0, 2, 0, 5)).unwrap();
        sheet.set_cell_value(1, 2, "Felul");
        sheet.set_cell_value(2, 0, 1i64);
        sheet.set_cell_value(2, 3, "MRN1");

        HeaderBuilder::new(&layout).build(&mut sheet).unwrap();

        assert_eq!(sheet.cell_text(2, 2), "Documente însoțitoare");
        assert_eq!(sheet.cell_text(3, 2), "Felul");
        assert_eq!(sheet.cell_value(4, 0), Some(&CellValue::Int(1)));
        assert_eq!(sheet.cell_text(4, 3), "MRN1");
        assert_eq!(
            sheet
                .merged_regions()
                .iter()
                .filter(|m| **m == MergedRegion::new(2, 2, 2, 5))
                .count(),
            1
        );
    }
}
