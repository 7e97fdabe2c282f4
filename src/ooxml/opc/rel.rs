//! Relationship parts (`*.rels`) of an OPC package.
//!
//! A package links its parts through relationship files: `_rels/.rels`
//! points at the workbook, `xl/_rels/workbook.xml.rels` points at the
//! worksheets, styles and shared strings.

use std::fmt::Write as FmtWrite;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::Result;
use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::namespace;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    pub r_id: String,
    /// Relationship type URI
    pub reltype: String,
    /// Target reference, relative to the source part's directory unless it starts with `/`
    pub target: String,
}

/// Ordered collection of relationships of one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship with the next free `rIdN` and return the id.
    pub fn add(&mut self, reltype: &str, target: &str) -> String {
        let r_id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target: target.to_string(),
        });
        r_id
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// First relationship of a given type.
    pub fn by_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.reltype == reltype)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Self::new();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target = None;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.decode_and_unescape_value(reader.decoder())?;
                        match attr.key.local_name().as_ref() {
                            b"Id" => r_id = Some(value.into_owned()),
                            b"Type" => reltype = Some(value.into_owned()),
                            b"Target" => target = Some(value.into_owned()),
                            _ => {},
                        }
                    }

                    if let (Some(r_id), Some(reltype), Some(target)) = (r_id, reltype, target) {
                        rels.rels.push(Relationship {
                            r_id,
                            reltype,
                            target,
                        });
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(rels)
    }

    /// Serialize relationships to XML format.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS)?;
        for rel in &self.rels {
            write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target)
            )?;
        }
        xml.push_str("</Relationships>");

        Ok(xml)
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// `resolve_target("xl", "worksheets/sheet1.xml")` gives
/// `xl/worksheets/sheet1.xml`; absolute targets drop their leading `/`.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rt::WORKSHEET, "worksheets/sheet1.xml"), "rId1");
        assert_eq!(rels.add(rt::STYLES, "styles.xml"), "rId2");
        assert_eq!(rels.get("rId2").unwrap().target, "styles.xml");
        assert_eq!(rels.by_type(rt::WORKSHEET).unwrap().r_id, "rId1");
    }

    #[test]
    fn test_round_trip() {
        let mut rels = Relationships::new();
        rels.add(rt::OFFICE_DOCUMENT, "xl/workbook.xml");
        rels.add(rt::CORE_PROPERTIES, "docProps/core.xml");

        let parsed = Relationships::parse(&rels.to_xml().unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.by_type(rt::OFFICE_DOCUMENT).unwrap().target,
            "xl/workbook.xml"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(resolve_target("xl/worksheets", "../styles.xml"), "xl/styles.xml");
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
    }
}
