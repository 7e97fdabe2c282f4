//! Physical package access: reading parts out of a ZIP archive and writing
//! a fresh archive with its `[Content_Types].xml`.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::common::xml::escape_xml;
use crate::common::{Error, Result};
use crate::ooxml::opc::constants::{content_type as ct, namespace, part_name};

/// Read-only view over the members of a package held in memory.
pub struct PackageReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PackageReader<'data> {
    /// Open a package from its raw bytes.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Read a part as UTF-8 text, `None` when the member does not exist.
    pub fn part(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut content = String::with_capacity(file.size() as usize);
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("cannot read {}: {}", name, e)))?;
        Ok(Some(content))
    }

    /// Read a part that must exist.
    pub fn required_part(&mut self, name: &str) -> Result<String> {
        self.part(name)?
            .ok_or_else(|| Error::PartNotFound(name.to_string()))
    }
}

/// Streaming package writer.
///
/// Parts are collected first so `[Content_Types].xml` can be emitted as the
/// first archive member, then everything is deflated in one pass on
/// [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct PackageWriter {
    /// (part name, data) in insertion order
    parts: Vec<(String, Vec<u8>)>,
    content_types: ContentTypes,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a part. `.rels` and plain `.xml` parts are covered by the
    /// default content types; everything else gets an override.
    pub fn add_part(&mut self, name: &str, content_type: &str, data: impl Into<Vec<u8>>) {
        self.content_types.add(name, content_type);
        self.parts.push((name.to_string(), data.into()));
    }

    /// Write all queued parts to `writer` and hand it back.
    pub fn finish<W: Write + Seek>(self, writer: W) -> Result<W> {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);

        zip.start_file(part_name::CONTENT_TYPES, options)?;
        zip.write_all(self.content_types.to_xml()?.as_bytes())?;

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }
}

/// Helper for building [Content_Types].xml content.
#[derive(Debug)]
struct ContentTypes {
    /// Default content types by extension
    defaults: BTreeMap<String, String>,
    /// Override content types by part name (with leading `/`)
    overrides: BTreeMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }
}

impl ContentTypes {
    fn add(&mut self, name: &str, content_type: &str) {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
        if self.defaults.get(ext).is_some_and(|ty| ty == content_type) {
            return;
        }
        self.overrides
            .insert(format!("/{}", name), content_type.to_string());
    }

    fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES)?;
        for (ext, content_type) in &self.defaults {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            )?;
        }
        for (part, content_type) in &self.overrides {
            write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                escape_xml(content_type)
            )?;
        }
        xml.push_str("</Types>");

        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut writer = PackageWriter::new();
        writer.add_part(part_name::WORKBOOK, ct::SML_SHEET_MAIN, "<workbook/>");
        writer.add_part(part_name::PACKAGE_RELS, ct::OPC_RELATIONSHIPS, "<Relationships/>");

        let bytes = writer.finish(Cursor::new(Vec::new())).unwrap().into_inner();
        let mut reader = PackageReader::new(&bytes).unwrap();

        assert_eq!(reader.part(part_name::WORKBOOK).unwrap().unwrap(), "<workbook/>");
        assert!(reader.part(part_name::STYLES).unwrap().is_none());
        assert!(matches!(
            reader.required_part(part_name::STYLES),
            Err(Error::PartNotFound(_))
        ));

        let types = reader.required_part(part_name::CONTENT_TYPES).unwrap();
        assert!(types.contains(r#"<Override PartName="/xl/workbook.xml""#));
        assert!(!types.contains(r#"PartName="/_rels/.rels""#));
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(PackageReader::new(b"definitely not a zip archive").is_err());
    }
}
