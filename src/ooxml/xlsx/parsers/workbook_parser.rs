//! Parser for Excel workbook.xml files.
//!
//! Only the sheet list is needed: names, ids and the relationship ids that
//! lead to the worksheet parts.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::attribute;
use crate::common::Result;

// Performance: Pre-allocate typical capacity for worksheets
const INITIAL_SHEETS_CAPACITY: usize = 16;

/// A `<sheet>` entry of the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    /// Relationship id of the worksheet part in `workbook.xml.rels`
    pub r_id: String,
}

/// Parse workbook.xml content into its sheet entries, in tab order.
///
/// Entries missing a name or relationship id are skipped.
pub fn parse_workbook_xml(xml: &str) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut sheets = Vec::with_capacity(INITIAL_SHEETS_CAPACITY);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let decoder = reader.decoder();
                let name = attribute(&e, b"name", decoder)?;
                // r:id, matched by local name
                let r_id = attribute(&e, b"id", decoder)?;
                let sheet_id = attribute(&e, b"sheetId", decoder)?
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(sheets.len() as u32 + 1);

                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push(SheetEntry { name, sheet_id, r_id });
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheets() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
            <workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
                      xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
              <bookViews><workbookView activeTab="0"/></bookViews>
              <sheets>
                <sheet name="Registru" sheetId="1" r:id="rId1"/>
                <sheet name="Note &amp; observații" sheetId="4" r:id="rId7"/>
              </sheets>
            </workbook>"#;

        let sheets = parse_workbook_xml(xml).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(
            sheets[0],
            SheetEntry {
                name: "Registru".to_string(),
                sheet_id: 1,
                r_id: "rId1".to_string()
            }
        );
        assert_eq!(sheets[1].name, "Note & observații");
        assert_eq!(sheets[1].sheet_id, 4);
        assert_eq!(sheets[1].r_id, "rId7");
    }

    #[test]
    fn test_sheet_without_relationship_is_skipped() {
        let xml = r#"<workbook><sheets><sheet name="Orphan" sheetId="1"/></sheets></workbook>"#;
        assert!(parse_workbook_xml(xml).unwrap().is_empty());
    }
}
