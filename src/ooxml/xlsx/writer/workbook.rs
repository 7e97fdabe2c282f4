//! Workbook part and package assembly.

use std::fmt::Write as FmtWrite;
use std::io::{Seek, Write};

use super::sheet::{CellStyleMap, worksheet_to_xml};
use super::strings::MutableSharedStrings;
use super::styles::StylesBuilder;
use crate::common::Result;
use crate::common::xml::escape_xml;
use crate::ooxml::metadata::app_properties_xml;
use crate::ooxml::opc::constants::{
    content_type as ct, namespace, part_name, relationship_type as rt,
};
use crate::ooxml::opc::{PackageWriter, Relationships};
use crate::ooxml::xlsx::workbook::XlsxDocument;
use crate::ooxml::xlsx::worksheet::Worksheet;

/// Build styles from all worksheets.
///
/// Returns the StylesBuilder and, per worksheet, the cell position to
/// style index mapping.
pub fn build_styles(worksheets: &[Worksheet]) -> (StylesBuilder, Vec<CellStyleMap>) {
    let mut builder = StylesBuilder::new();
    let style_maps: Vec<CellStyleMap> = worksheets
        .iter()
        .map(|ws| {
            ws.cell_formats()
                .iter()
                .map(|(pos, format)| (*pos, builder.add_cell_format(format)))
                .collect()
        })
        .collect();

    (builder, style_maps)
}

/// Generate workbook.xml content.
///
/// `worksheet_rel_ids` holds the relationship id of each worksheet, in order.
pub fn generate_workbook_xml(worksheets: &[Worksheet], worksheet_rel_ids: &[String]) -> Result<String> {
    let mut xml = String::with_capacity(1024);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(
        xml,
        r#"<workbook xmlns="{}" xmlns:r="{}">"#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    )?;
    xml.push_str(r#"<bookViews><workbookView activeTab="0"/></bookViews>"#);

    xml.push_str("<sheets>");
    for (index, (ws, rel_id)) in worksheets.iter().zip(worksheet_rel_ids).enumerate() {
        write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
            escape_xml(ws.name()),
            index + 1,
            rel_id
        )?;
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");

    Ok(xml)
}

/// Serialize the whole document as an `.xlsx` package into `writer`.
pub fn write_package<W: Write + Seek>(document: &XlsxDocument, writer: W) -> Result<W> {
    let worksheets = document.sheets();
    let (styles, style_maps) = build_styles(worksheets);
    let mut shared_strings = MutableSharedStrings::new();
    let mut package = PackageWriter::new();

    let mut root_rels = Relationships::new();
    root_rels.add(rt::OFFICE_DOCUMENT, part_name::WORKBOOK);
    root_rels.add(rt::CORE_PROPERTIES, part_name::CORE_PROPERTIES);
    root_rels.add(rt::EXTENDED_PROPERTIES, part_name::APP_PROPERTIES);
    package.add_part(part_name::PACKAGE_RELS, ct::OPC_RELATIONSHIPS, root_rels.to_xml()?);

    package.add_part(
        part_name::CORE_PROPERTIES,
        ct::OPC_CORE_PROPERTIES,
        document.properties().to_core_xml()?,
    );
    let names: Vec<&str> = worksheets.iter().map(Worksheet::name).collect();
    package.add_part(
        part_name::APP_PROPERTIES,
        ct::OFC_EXTENDED_PROPERTIES,
        app_properties_xml(&names)?,
    );

    let mut workbook_rels = Relationships::new();
    let mut sheet_rel_ids = Vec::with_capacity(worksheets.len());
    for (index, (ws, style_map)) in worksheets.iter().zip(&style_maps).enumerate() {
        let target = format!("worksheets/sheet{}.xml", index + 1);
        sheet_rel_ids.push(workbook_rels.add(rt::WORKSHEET, &target));
        let xml = worksheet_to_xml(ws, &mut shared_strings, style_map)?;
        package.add_part(&format!("xl/{}", target), ct::SML_WORKSHEET, xml);
    }
    workbook_rels.add(rt::STYLES, "styles.xml");
    workbook_rels.add(rt::SHARED_STRINGS, "sharedStrings.xml");

    package.add_part(
        part_name::WORKBOOK,
        ct::SML_SHEET_MAIN,
        generate_workbook_xml(worksheets, &sheet_rel_ids)?,
    );
    package.add_part(part_name::WORKBOOK_RELS, ct::OPC_RELATIONSHIPS, workbook_rels.to_xml()?);
    package.add_part(part_name::STYLES, ct::SML_STYLES, styles.to_xml()?);
    package.add_part(
        part_name::SHARED_STRINGS,
        ct::SML_SHARED_STRINGS,
        shared_strings.to_xml()?,
    );

    package.finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::format::{CellFont, CellFormat};

    #[test]
    fn test_build_styles_shares_indices_across_sheets() {
        let mut first = Worksheet::new("A");
        let mut second = Worksheet::new("B");
        let bold = CellFormat::default().with_font(CellFont::bold(11.0));
        first.set_cell_format(0, 0, bold.clone());
        second.set_cell_format(3, 3, bold);

        let (builder, maps) = build_styles(&[first, second]);
        assert_eq!(builder.cell_format_count(), 2);
        assert_eq!(maps[0][&(0, 0)], 1);
        assert_eq!(maps[1][&(3, 3)], 1);
    }

    #[test]
    fn test_workbook_xml_lists_sheets() {
        let sheets = [Worksheet::new("Registru"), Worksheet::new("A & B")];
        let xml = generate_workbook_xml(&sheets, &["rId1".into(), "rId2".into()]).unwrap();
        assert!(xml.contains(r#"<sheet name="Registru" sheetId="1" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<sheet name="A &amp; B" sheetId="2" r:id="rId2"/>"#));
    }
}
