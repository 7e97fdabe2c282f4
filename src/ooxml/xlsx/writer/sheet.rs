//! Worksheet part serialization.
//!
//! Element order follows what Excel expects inside `<worksheet>`:
//! dimension, sheetViews, sheetFormatPr, cols, sheetData, mergeCells,
//! phoneticPr, pageMargins.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as FmtWrite;

use super::strings::MutableSharedStrings;
use super::styles::trim_float;
use crate::common::Result;
use crate::common::xml::{encode_ooxml_escapes, escape_xml};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::cell::{CellValue, cell_reference};
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Cell position to style index mapping of one sheet.
pub type CellStyleMap = HashMap<(u32, u32), usize>;

/// One row of sheetData: col -> (value, style index)
type RowCells<'a> = BTreeMap<u32, (Option<&'a CellValue>, Option<usize>)>;

/// Serialize a worksheet, registering its strings in `shared_strings`.
pub fn worksheet_to_xml(
    sheet: &Worksheet,
    shared_strings: &mut MutableSharedStrings,
    style_indices: &CellStyleMap,
) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(
        xml,
        r#"<worksheet xmlns="{}" xmlns:r="{}">"#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    )?;

    match sheet.used_range() {
        Some((min_row, min_col, max_row, max_col)) => write!(
            xml,
            r#"<dimension ref="{}:{}"/>"#,
            cell_reference(min_row, min_col),
            cell_reference(max_row, max_col)
        )?,
        None => xml.push_str(r#"<dimension ref="A1"/>"#),
    }

    write_sheet_views(&mut xml, sheet)?;
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);
    write_cols(&mut xml, sheet)?;

    xml.push_str("<sheetData>");
    write_sheet_data(&mut xml, sheet, shared_strings, style_indices)?;
    xml.push_str("</sheetData>");

    if !sheet.merged_regions().is_empty() {
        write!(xml, r#"<mergeCells count="{}">"#, sheet.merged_regions().len())?;
        for region in sheet.merged_regions() {
            write!(xml, r#"<mergeCell ref="{}"/>"#, region)?;
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str(r#"<phoneticPr fontId="0" type="noConversion"/>"#);
    xml.push_str(
        r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
    );
    xml.push_str("</worksheet>");

    Ok(xml)
}

fn write_sheet_views(xml: &mut String, sheet: &Worksheet) -> Result<()> {
    xml.push_str(r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0""#);

    let Some(freeze) = sheet.frozen_panes() else {
        xml.push_str("/></sheetViews>");
        return Ok(());
    };

    let active_pane = match (freeze.cols > 0, freeze.rows > 0) {
        (true, true) => "bottomRight",
        (true, false) => "topRight",
        _ => "bottomLeft",
    };
    let top_left_cell = cell_reference(freeze.rows, freeze.cols);

    xml.push_str("><pane");
    if freeze.cols > 0 {
        write!(xml, r#" xSplit="{}""#, freeze.cols)?;
    }
    if freeze.rows > 0 {
        write!(xml, r#" ySplit="{}""#, freeze.rows)?;
    }
    write!(
        xml,
        r#" topLeftCell="{}" activePane="{}" state="frozen"/>"#,
        top_left_cell, active_pane
    )?;
    write!(
        xml,
        r#"<selection pane="{}" activeCell="{}" sqref="{}"/>"#,
        active_pane, top_left_cell, top_left_cell
    )?;
    xml.push_str("</sheetView></sheetViews>");
    Ok(())
}

fn write_cols(xml: &mut String, sheet: &Worksheet) -> Result<()> {
    let widths = sheet.column_widths();
    if widths.is_empty() {
        return Ok(());
    }

    let mut buf = ryu::Buffer::new();
    xml.push_str("<cols>");
    for (&col, &width) in widths {
        write!(
            xml,
            r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
            col + 1,
            col + 1,
            trim_float(buf.format(width))
        )?;
    }
    xml.push_str("</cols>");
    Ok(())
}

fn write_sheet_data(
    xml: &mut String,
    sheet: &Worksheet,
    shared_strings: &mut MutableSharedStrings,
    style_indices: &CellStyleMap,
) -> Result<()> {
    let mut rows: BTreeMap<u32, RowCells<'_>> = BTreeMap::new();
    for ((row, col), value) in sheet.cells() {
        rows.entry(row).or_default().entry(col).or_default().0 = Some(value);
    }
    for (&(row, col), &style) in style_indices {
        if style != 0 {
            rows.entry(row).or_default().entry(col).or_default().1 = Some(style);
        }
    }

    let mut height_buf = ryu::Buffer::new();
    let mut number_buf = ryu::Buffer::new();
    let mut int_buf = itoa::Buffer::new();

    for (row, cells) in rows {
        write!(xml, r#"<row r="{}""#, row + 1)?;
        if let Some(height) = sheet.row_height(row) {
            write!(
                xml,
                r#" ht="{}" customHeight="1""#,
                trim_float(height_buf.format(height))
            )?;
        }
        xml.push('>');

        for (col, (value, style)) in cells {
            let cell_ref = cell_reference(row, col);
            let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();

            match value.unwrap_or(&CellValue::Empty) {
                CellValue::Empty => {
                    if !style_attr.is_empty() {
                        write!(xml, r#"<c r="{}"{}/>"#, cell_ref, style_attr)?;
                    }
                },
                CellValue::String(s) => {
                    let index = shared_strings.add_string(s);
                    write!(
                        xml,
                        r#"<c r="{}"{} t="s"><v>{}</v></c>"#,
                        cell_ref,
                        style_attr,
                        int_buf.format(index)
                    )?;
                },
                CellValue::Int(i) => write!(
                    xml,
                    r#"<c r="{}"{}><v>{}</v></c>"#,
                    cell_ref,
                    style_attr,
                    int_buf.format(*i)
                )?,
                CellValue::Float(f) if f.is_finite() => write!(
                    xml,
                    r#"<c r="{}"{}><v>{}</v></c>"#,
                    cell_ref,
                    style_attr,
                    trim_float(number_buf.format(*f))
                )?,
                CellValue::Float(_) => {
                    write!(xml, r#"<c r="{}"{} t="e"><v>#NUM!</v></c>"#, cell_ref, style_attr)?
                },
                CellValue::Bool(b) => write!(
                    xml,
                    r#"<c r="{}"{} t="b"><v>{}</v></c>"#,
                    cell_ref,
                    style_attr,
                    u8::from(*b)
                )?,
                CellValue::Error(e) => write!(
                    xml,
                    r#"<c r="{}"{} t="e"><v>{}</v></c>"#,
                    cell_ref,
                    style_attr,
                    escape_xml(e)
                )?,
                CellValue::Formula { formula, cached_value } => write_formula_cell(
                    xml,
                    &cell_ref,
                    &style_attr,
                    formula,
                    cached_value.as_deref(),
                    &mut number_buf,
                )?,
            }
        }

        xml.push_str("</row>");
    }

    Ok(())
}

/// `<c>` with an `<f>` child; the cached result picks the cell type.
fn write_formula_cell(
    xml: &mut String,
    cell_ref: &str,
    style_attr: &str,
    formula: &str,
    cached: Option<&CellValue>,
    number_buf: &mut ryu::Buffer,
) -> Result<()> {
    let (kind, value) = match cached {
        Some(CellValue::String(s)) => (Some("str"), Some(escape_xml(&encode_ooxml_escapes(s)))),
        Some(CellValue::Bool(b)) => (Some("b"), Some(u8::from(*b).to_string())),
        Some(CellValue::Error(e)) => (Some("e"), Some(escape_xml(e))),
        Some(CellValue::Int(i)) => (None, Some(i.to_string())),
        Some(CellValue::Float(f)) if f.is_finite() => {
            (None, Some(trim_float(number_buf.format(*f)).to_string()))
        },
        _ => (None, None),
    };

    write!(xml, r#"<c r="{}"{}"#, cell_ref, style_attr)?;
    if let Some(kind) = kind {
        write!(xml, r#" t="{}""#, kind)?;
    }
    write!(xml, "><f>{}</f>", escape_xml(formula))?;
    if let Some(value) = value {
        write!(xml, "<v>{}</v>", value)?;
    }
    xml.push_str("</c>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::worksheet::MergedRegion;

    fn render(sheet: &Worksheet, styles: &CellStyleMap) -> (String, MutableSharedStrings) {
        let mut sst = MutableSharedStrings::new();
        let xml = worksheet_to_xml(sheet, &mut sst, styles).unwrap();
        (xml, sst)
    }

    #[test]
    fn test_cells_are_typed() {
        let mut ws = Worksheet::new("Registru");
        ws.set_cell_value(4, 0, 1i64);
        ws.set_cell_value(4, 2, "SAD");
        ws.set_cell_value(4, 9, 12.5);
        ws.set_cell_value(4, 11, 3.0);

        let (xml, sst) = render(&ws, &CellStyleMap::new());
        assert!(xml.contains(r#"<row r="5"><c r="A5"><v>1</v></c><c r="C5" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="J5"><v>12.5</v></c>"#));
        assert!(xml.contains(r#"<c r="L5"><v>3</v></c>"#));
        assert_eq!(sst.count(), 1);
    }

    #[test]
    fn test_formulas_are_written_with_cached_values() {
        let mut ws = Worksheet::new("Registru");
        ws.set_cell_value(19, 11, CellValue::formula("SUM(L5:L7)", Some(CellValue::Float(37.5))));
        ws.set_cell_value(19, 12, CellValue::formula("IF(L20>0,\"da\",\"nu\")", Some("da".into())));
        ws.set_cell_value(19, 13, CellValue::formula("NOW()", None));

        let (xml, sst) = render(&ws, &CellStyleMap::new());
        assert!(xml.contains(r#"<c r="L20"><f>SUM(L5:L7)</f><v>37.5</v></c>"#));
        assert!(xml.contains(
            r#"<c r="M20" t="str"><f>IF(L20&gt;0,&quot;da&quot;,&quot;nu&quot;)</f><v>da</v></c>"#
        ));
        assert!(xml.contains(r#"<c r="N20"><f>NOW()</f></c>"#));
        assert!(sst.is_empty());
    }

    #[test]
    fn test_styled_empty_cells_are_kept() {
        let mut ws = Worksheet::new("Registru");
        ws.set_cell_value(0, 0, "Title");
        let mut styles = CellStyleMap::new();
        styles.insert((0, 0), 1);
        styles.insert((0, 1), 1);

        let (xml, _) = render(&ws, &styles);
        assert!(xml.contains(r#"<c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="1"/>"#));
    }

    #[test]
    fn test_layout_elements() {
        let mut ws = Worksheet::new("Registru");
        ws.set_cell_value(0, 0, "Title");
        ws.set_row_height(0, 26.0);
        ws.set_column_width(12, 28.5);
        ws.merge_cells(MergedRegion::new(0, 0, 0, 14)).unwrap();
        ws.freeze_panes(4, 0);

        let (xml, _) = render(&ws, &CellStyleMap::new());
        assert!(xml.contains(r#"<row r="1" ht="26" customHeight="1">"#));
        assert!(xml.contains(r#"<col min="13" max="13" width="28.5" customWidth="1"/>"#));
        assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A1:O1"/></mergeCells>"#));
        assert!(xml.contains(
            r#"<pane ySplit="4" topLeftCell="A5" activePane="bottomLeft" state="frozen"/>"#
        ));

        let order = ["<dimension", "<sheetViews", "<cols>", "<sheetData>", "<mergeCells", "<pageMargins"];
        let positions: Vec<usize> = order.iter().map(|tag| xml.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
