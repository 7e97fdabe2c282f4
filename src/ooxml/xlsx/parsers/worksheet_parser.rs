//! Parser for Excel worksheet XML files.
//!
//! Reads the parts of a worksheet the ledger round-trips: cell values and
//! their formats, column widths, custom row heights, merged regions and a
//! frozen pane. Formulas are kept together with their cached value.
//! Worksheet content outside that set is logged and not carried over.

use std::collections::BTreeSet;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::shared_strings::read_string_item;
use super::styles_parser::StyleTable;
use super::{attribute, bool_attribute};
use tracing::warn;

use crate::common::xml::{decode_ooxml_escapes, read_text};
use crate::common::{Error, Result};
use crate::ooxml::xlsx::cell::{CellValue, parse_cell_reference};
use crate::ooxml::xlsx::worksheet::{MergedRegion, Worksheet};

/// Column definitions past this index are ignored.
///
/// Excel writes a single `<col min=".." max="16384">` for "all remaining
/// columns", which would otherwise expand into thousands of entries.
const MAX_SIZED_COLUMNS: u32 = 256;

/// Worksheet elements that are read past and lost on the next save.
const DROPPED_ELEMENTS: &[&str] = &[
    "autoFilter",
    "conditionalFormatting",
    "dataValidations",
    "drawing",
    "hyperlinks",
    "legacyDrawing",
    "sheetProtection",
    "tableParts",
];

/// Raw attributes of a `<c>` element.
struct CellHeader {
    row: u32,
    col: u32,
    style: usize,
    kind: Option<String>,
}

/// Parse a worksheet part into a [`Worksheet`] named `name`.
///
/// Shared string and style indices are resolved against `shared_strings`
/// and `styles`. An out-of-range shared string index is an error.
pub fn parse_worksheet_xml(
    name: &str,
    xml: &str,
    shared_strings: &[String],
    styles: &StyleTable,
) -> Result<Worksheet> {
    let mut sheet = Worksheet::new(name);
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::with_capacity(1024);

    // Rows and cells may omit their `r` attribute; track the implied position.
    let mut next_row = 0u32;
    let mut current_row = 0u32;
    let mut next_col = 0u32;
    let mut dropped: BTreeSet<String> = BTreeSet::new();

    loop {
        buf.clear();
        let (e, has_children) = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => (e.into_owned(), true),
            Event::Empty(e) => (e.into_owned(), false),
            Event::Eof => break,
            _ => continue,
        };
        let decoder = reader.decoder();

        match e.local_name().as_ref() {
            b"pane" => {
                if attribute(&e, b"state", decoder)?.as_deref() == Some("frozen") {
                    let split = |name: &[u8]| -> Result<u32> {
                        Ok(attribute(&e, name, decoder)?
                            .and_then(|v| fast_float2::parse::<f64, _>(v.as_bytes()).ok())
                            .map_or(0, |v| v.max(0.0) as u32))
                    };
                    let cols = split(b"xSplit")?;
                    let rows = split(b"ySplit")?;
                    sheet.freeze_panes(rows, cols);
                }
            },
            b"col" => {
                let bound = |name: &[u8]| -> Result<Option<u32>> {
                    Ok(attribute(&e, name, decoder)?.and_then(|v| v.parse::<u32>().ok()))
                };
                let width = attribute(&e, b"width", decoder)?
                    .and_then(|v| fast_float2::parse::<f64, _>(v.as_bytes()).ok());

                if let (Some(min), Some(max), Some(width)) = (bound(b"min")?, bound(b"max")?, width)
                    && min >= 1
                {
                    for col in min..=max.min(MAX_SIZED_COLUMNS) {
                        sheet.set_column_width(col - 1, width);
                    }
                }
            },
            b"row" => {
                current_row = match attribute(&e, b"r", decoder)?.and_then(|v| v.parse::<u32>().ok())
                {
                    Some(r) if r >= 1 => r - 1,
                    _ => next_row,
                };
                next_row = current_row + 1;
                next_col = 0;

                if bool_attribute(&e, b"customHeight", decoder, false)?
                    && let Some(height) = attribute(&e, b"ht", decoder)?
                        .and_then(|v| fast_float2::parse::<f64, _>(v.as_bytes()).ok())
                {
                    sheet.set_row_height(current_row, height);
                }
            },
            b"c" => {
                let header = read_cell_header(&e, &reader, current_row, next_col)?;
                next_col = header.col + 1;

                let value = if has_children {
                    read_cell_value(&mut reader, header.kind.as_deref(), shared_strings, &mut dropped)?
                } else {
                    CellValue::Empty
                };

                if let Some(format) = styles.format(header.style) {
                    sheet.set_cell_format(header.row, header.col, format.clone());
                }
                if value != CellValue::Empty {
                    sheet.set_cell_value(header.row, header.col, value);
                }
            },
            b"mergeCell" => {
                if let Some(range) = attribute(&e, b"ref", decoder)? {
                    sheet.push_merged_unchecked(MergedRegion::from_reference(&range)?);
                }
            },
            other => {
                if let Ok(name) = std::str::from_utf8(other)
                    && DROPPED_ELEMENTS.contains(&name)
                {
                    dropped.insert(name.to_string());
                }
            },
        }
    }

    if !dropped.is_empty() {
        warn!(
            sheet = name,
            elements = ?dropped,
            "worksheet content will not be kept when the ledger is saved"
        );
    }

    Ok(sheet)
}

fn read_cell_header(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    current_row: u32,
    next_col: u32,
) -> Result<CellHeader> {
    let decoder = reader.decoder();
    let (row, col) = match attribute(e, b"r", decoder)? {
        Some(reference) => parse_cell_reference(&reference)?,
        None => (current_row, next_col),
    };
    let style = attribute(e, b"s", decoder)?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let kind = attribute(e, b"t", decoder)?;

    Ok(CellHeader {
        row,
        col,
        style,
        kind,
    })
}

/// Read the children of a `<c>` element and decode its value by cell type.
///
/// A formula wraps the decoded value as its cached result. Cells that only
/// point into a shared formula keep their cached value and the formula
/// itself is noted in `dropped`.
fn read_cell_value(
    reader: &mut Reader<&[u8]>,
    kind: Option<&str>,
    shared_strings: &[String],
    dropped: &mut BTreeSet<String>,
) -> Result<CellValue> {
    let mut raw: Option<String> = None;
    let mut inline: Option<String> = None;
    let mut formula: Option<String> = None;
    let mut buf = Vec::with_capacity(128);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"v" => raw = Some(read_text(reader, b"v")?),
                b"is" => inline = Some(read_string_item(reader, b"is")?),
                b"f" => formula = Some(read_text(reader, b"f")?).filter(|f| !f.trim().is_empty()),
                _ => {},
            },
            Event::Empty(e) if e.local_name().as_ref() == b"f" => {
                dropped.insert("shared formula".to_string());
            },
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => return Err(Error::Xml("unexpected end of document inside <c>".into())),
            _ => {},
        }
    }

    let value = match (inline, raw) {
        (Some(text), _) => CellValue::String(text),
        (None, Some(raw)) => decode_value(&raw, kind, shared_strings)?,
        (None, None) => CellValue::Empty,
    };

    Ok(match formula {
        Some(formula) => {
            let cached = (value != CellValue::Empty).then_some(value);
            CellValue::formula(formula, cached)
        },
        None => value,
    })
}

/// Decode the `<v>` text of a cell according to its `t` attribute.
fn decode_value(raw: &str, kind: Option<&str>, shared_strings: &[String]) -> Result<CellValue> {
    Ok(match kind {
        Some("s") => {
            let index = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::Xml(format!("invalid shared string index '{}'", raw)))?;
            let text = shared_strings.get(index).ok_or_else(|| {
                Error::Xml(format!(
                    "shared string index {} out of range ({} strings)",
                    index,
                    shared_strings.len()
                ))
            })?;
            CellValue::String(text.clone())
        },
        Some("str") | Some("inlineStr") | Some("d") => {
            CellValue::String(decode_ooxml_escapes(raw).into_owned())
        },
        Some("b") => CellValue::Bool(matches!(raw.trim(), "1" | "true")),
        Some("e") => CellValue::Error(raw.to_string()),
        _ => parse_number(raw),
    })
}

/// Numeric cell content; text that is not a number is kept as a string.
fn parse_number(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return CellValue::Int(int_val);
    }
    match fast_float2::parse::<f64, _>(trimmed.as_bytes()) {
        Ok(float_val) => CellValue::Float(float_val),
        Err(_) => CellValue::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::parsers::parse_styles;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:O5"/>
  <sheetViews><sheetView workbookViewId="0">
    <pane ySplit="4" topLeftCell="A5" activePane="bottomLeft" state="frozen"/>
  </sheetView></sheetViews>
  <cols>
    <col min="1" max="1" width="6.5" customWidth="1"/>
    <col min="16" max="16384" width="9.140625"/>
  </cols>
  <sheetData>
    <row r="1" ht="26" customHeight="1"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="1"/></row>
    <row r="5">
      <c r="A5"><v>1</v></c>
      <c r="C5" t="s"><v>1</v></c>
      <c r="J5"><v>12.5</v></c>
      <c t="inlineStr"><is><t>inline</t></is></c>
      <c r="M5"><f>SUM(J5:L5)</f><v>12.5</v></c>
      <c r="N5" t="b"><v>1</v></c>
      <c r="O5" t="e"><v>#N/A</v></c>
    </row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A1:O1"/></mergeCells>
</worksheet>"#;

    const STYLES: &str = r#"<styleSheet>
  <fonts count="2"><font><sz val="11"/></font><font><b/><sz val="16"/></font></fonts>
  <cellXfs count="2"><xf fontId="0"/><xf fontId="1" applyFont="1"/></cellXfs>
</styleSheet>"#;

    fn strings() -> Vec<String> {
        vec!["REGISTRU".to_string(), "SAD".to_string()]
    }

    #[test]
    fn test_values_are_typed() {
        let sheet = parse_worksheet_xml("Registru", SHEET, &strings(), &StyleTable::default()).unwrap();

        assert_eq!(sheet.cell_value(0, 0), Some(&CellValue::String("REGISTRU".into())));
        assert_eq!(sheet.cell_value(4, 0), Some(&CellValue::Int(1)));
        assert_eq!(sheet.cell_value(4, 2), Some(&CellValue::String("SAD".into())));
        assert_eq!(sheet.cell_value(4, 9), Some(&CellValue::Float(12.5)));
        // cell without a reference follows J5
        assert_eq!(sheet.cell_value(4, 10), Some(&CellValue::String("inline".into())));
        assert_eq!(
            sheet.cell_value(4, 12),
            Some(&CellValue::formula("SUM(J5:L5)", Some(CellValue::Float(12.5))))
        );
        assert_eq!(sheet.cell_value(4, 13), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.cell_value(4, 14), Some(&CellValue::Error("#N/A".into())));
        assert_eq!(sheet.last_row(), Some(4));
    }

    #[test]
    fn test_layout_is_read() {
        let styles = parse_styles(STYLES).unwrap();
        let sheet = parse_worksheet_xml("Registru", SHEET, &strings(), &styles).unwrap();

        let freeze = sheet.frozen_panes().unwrap();
        assert_eq!((freeze.rows, freeze.cols), (4, 0));
        assert_eq!(sheet.column_width(0), Some(6.5));
        assert_eq!(sheet.column_width(15), Some(9.140625));
        assert_eq!(sheet.column_width(MAX_SIZED_COLUMNS), None);
        assert_eq!(sheet.row_height(0), Some(26.0));
        assert_eq!(sheet.row_height(4), None);
        assert_eq!(sheet.merged_regions(), &[MergedRegion::new(0, 0, 0, 14)]);

        // styled empty cell keeps its format
        assert!(sheet.cell_format(0, 1).unwrap().font.as_ref().unwrap().bold);
        assert!(sheet.cell_value(0, 1).is_none());
    }

    #[test]
    fn test_formula_cells_survive() {
        let xml = r#"<worksheet><sheetData><row r="20">
            <c r="L20"><f>SUM(L5:L7)</f><v>37.5</v></c>
            <c r="M20" t="str"><f>IF(L20&gt;0,"da","nu")</f><v>da</v></c>
            <c r="N20"><f>NOW()</f></c>
            <c r="O20"><f t="shared" si="0"/><v>4</v></c>
        </row></sheetData><conditionalFormatting sqref="L5:L20"/></worksheet>"#;
        let sheet = parse_worksheet_xml("S", xml, &[], &StyleTable::default()).unwrap();

        assert_eq!(
            sheet.cell_value(19, 11),
            Some(&CellValue::formula("SUM(L5:L7)", Some(CellValue::Float(37.5))))
        );
        assert_eq!(
            sheet.cell_value(19, 12),
            Some(&CellValue::formula(r#"IF(L20>0,"da","nu")"#, Some("da".into())))
        );
        assert_eq!(sheet.cell_value(19, 13), Some(&CellValue::formula("NOW()", None)));
        // shared formula followers keep their cached value only
        assert_eq!(sheet.cell_value(19, 14), Some(&CellValue::Int(4)));
        assert_eq!(sheet.last_row(), Some(19));
    }

    #[test]
    fn test_formula_written_back_reads_the_same() {
        use crate::ooxml::xlsx::writer::{CellStyleMap, MutableSharedStrings, worksheet_to_xml};

        let xml = r#"<worksheet><sheetData><row r="20"><c r="L20"><f>SUM(L5:L7)</f><v>37.5</v></c></row></sheetData></worksheet>"#;
        let sheet = parse_worksheet_xml("S", xml, &[], &StyleTable::default()).unwrap();

        let mut sst = MutableSharedStrings::new();
        let written = worksheet_to_xml(&sheet, &mut sst, &CellStyleMap::new()).unwrap();
        assert!(written.contains(r#"<c r="L20"><f>SUM(L5:L7)</f><v>37.5</v></c>"#));

        let reread = parse_worksheet_xml("S", &written, &[], &StyleTable::default()).unwrap();
        assert_eq!(reread.cell_value(19, 11), sheet.cell_value(19, 11));
    }

    #[test]
    fn test_shared_string_out_of_range() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let err = parse_worksheet_xml("S", xml, &strings(), &StyleTable::default()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_non_numeric_value_stays_text() {
        assert_eq!(parse_number("12"), CellValue::Int(12));
        assert_eq!(parse_number("1e3"), CellValue::Float(1000.0));
        assert_eq!(parse_number("N/A"), CellValue::String("N/A".into()));
        assert_eq!(parse_number(""), CellValue::Empty);
    }
}
