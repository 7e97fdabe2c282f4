//! Package core properties (`docProps/core.xml`).
//!
//! Core properties follow the Dublin Core metadata standard with the OPC
//! extensions. The ledger keeps the creation time across runs and stamps
//! the modification time on every commit.

use std::fmt::Write as FmtWrite;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::Result;
use crate::common::xml::{escape_xml, read_text};

/// Core document properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl DocumentProperties {
    /// Parse core properties XML.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut props = Self::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let name = match reader.read_event_into(&mut buf)? {
                Event::Start(e) => e.local_name().as_ref().to_vec(),
                Event::Eof => break,
                _ => continue,
            };

            match name.as_slice() {
                b"title" => props.title = non_empty(read_text(&mut reader, b"title")?),
                b"creator" => props.creator = non_empty(read_text(&mut reader, b"creator")?),
                b"lastModifiedBy" => {
                    props.last_modified_by = non_empty(read_text(&mut reader, b"lastModifiedBy")?)
                },
                b"created" => props.created = parse_datetime(&read_text(&mut reader, b"created")?),
                b"modified" => {
                    props.modified = parse_datetime(&read_text(&mut reader, b"modified")?)
                },
                _ => {},
            }
        }

        Ok(props)
    }

    /// Generate `docProps/core.xml`.
    pub fn to_core_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(768);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        );

        if let Some(title) = &self.title {
            write!(xml, "<dc:title>{}</dc:title>", escape_xml(title))?;
        }
        if let Some(creator) = &self.creator {
            write!(xml, "<dc:creator>{}</dc:creator>", escape_xml(creator))?;
        }
        if let Some(by) = &self.last_modified_by {
            write!(xml, "<cp:lastModifiedBy>{}</cp:lastModifiedBy>", escape_xml(by))?;
        }
        if let Some(created) = &self.created {
            write!(
                xml,
                r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
                created.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
        if let Some(modified) = &self.modified {
            write!(
                xml,
                r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
                modified.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }

        xml.push_str("</cp:coreProperties>");
        Ok(xml)
    }
}

/// Generate `docProps/app.xml` for a workbook with the given sheet names.
pub fn app_properties_xml(sheet_names: &[&str]) -> Result<String> {
    let mut xml = String::with_capacity(512);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    xml.push_str("<Application>Microsoft Excel</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop>");
    write!(
        xml,
        r#"<HeadingPairs><vt:vector size="2" baseType="variant"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{}</vt:i4></vt:variant></vt:vector></HeadingPairs>"#,
        sheet_names.len()
    )?;
    write!(
        xml,
        r#"<TitlesOfParts><vt:vector size="{}" baseType="lpstr">"#,
        sheet_names.len()
    )?;
    for name in sheet_names {
        write!(xml, "<vt:lpstr>{}</vt:lpstr>", escape_xml(name))?;
    }
    xml.push_str("</vt:vector></TitlesOfParts>");
    xml.push_str("<LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>16.0300</AppVersion>");
    xml.push_str("</Properties>");

    Ok(xml)
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse an ISO 8601 datetime string into a DateTime<Utc>.
///
/// Supports formats like:
/// - 2023-10-10T14:30:00Z
/// - 2023-10-10T14:30:00.1234567Z
/// - 2023-10-10T14:30:00
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_core_round_trip() {
        let props = DocumentProperties {
            title: Some("REGISTRU DE EVIDENȚĂ".to_string()),
            creator: Some("sheet-ledger".to_string()),
            last_modified_by: None,
            created: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()),
            modified: Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
        };

        let xml = props.to_core_xml().unwrap();
        assert!(xml.contains("<dcterms:created xsi:type=\"dcterms:W3CDTF\">2024-03-01T08:30:00Z</dcterms:created>"));
        assert_eq!(DocumentProperties::parse(&xml).unwrap(), props);
    }

    #[test]
    fn test_datetime_formats() {
        assert!(parse_datetime("2023-10-10T14:30:00Z").is_some());
        assert!(parse_datetime("2023-10-10T14:30:00.1234567Z").is_some());
        assert!(parse_datetime("2023-10-10T14:30:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_app_properties_lists_sheets() {
        let xml = app_properties_xml(&["Registru"]).unwrap();
        assert!(xml.contains("<vt:i4>1</vt:i4>"));
        assert!(xml.contains("<vt:lpstr>Registru</vt:lpstr>"));
    }
}
