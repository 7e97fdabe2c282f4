//! In-memory xlsx document: load a package into worksheets, edit them,
//! serialize them back.

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::parsers::{StyleTable, parse_shared_strings, parse_styles, parse_workbook_xml, parse_worksheet_xml};
use super::worksheet::Worksheet;
use super::writer::write_package;
use crate::common::{Error, Result};
use crate::ooxml::metadata::DocumentProperties;
use crate::ooxml::opc::constants::{part_name, relationship_type as rt};
use crate::ooxml::opc::{PackageReader, Relationships, resolve_target};

/// A workbook held entirely in memory.
///
/// Loading keeps what the ledger edits (values, formulas, formats, merges, widths,
/// heights, frozen panes and core properties); other workbook content is
/// not carried over when the document is written back.
#[derive(Debug, Clone, Default)]
pub struct XlsxDocument {
    sheets: Vec<Worksheet>,
    properties: DocumentProperties,
}

impl XlsxDocument {
    /// Empty document without sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with a single sheet.
    pub fn with_sheet(sheet: Worksheet) -> Self {
        Self {
            sheets: vec![sheet],
            properties: DocumentProperties::default(),
        }
    }

    /// Append a sheet. Sheet names must be unique within a workbook.
    pub fn add_sheet(&mut self, sheet: Worksheet) -> Result<()> {
        if self.sheet_by_name(sheet.name()).is_some() {
            return Err(Error::InvalidLayout(format!(
                "duplicate sheet name '{}'",
                sheet.name()
            )));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut DocumentProperties {
        &mut self.properties
    }

    /// Load the document at `path`.
    ///
    /// A file that cannot be read fails with an IO error; a file that is
    /// read but cannot be decoded fails with [`Error::CorruptDocument`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!(path = %path.display(), bytes = data.len(), "loading workbook");
        Self::from_bytes(&data).map_err(|e| e.into_corrupt(path))
    }

    /// Decode a document from the bytes of an `.xlsx` package.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut package = PackageReader::new(data)?;

        let root_rels = Relationships::parse(&package.required_part(part_name::PACKAGE_RELS)?)?;
        let workbook_part = root_rels
            .by_type(rt::OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| Error::PartNotFound("officeDocument relationship".to_string()))?;
        let (workbook_dir, workbook_file) = workbook_part
            .rsplit_once('/')
            .unwrap_or(("", workbook_part.as_str()));

        let workbook_rels =
            Relationships::parse(&package.required_part(&rels_part_name(workbook_dir, workbook_file))?)?;
        warn_dropped_parts(&workbook_part, &workbook_rels);
        let entries = parse_workbook_xml(&package.required_part(&workbook_part)?)?;

        let shared_strings = match workbook_rels.by_type(rt::SHARED_STRINGS) {
            Some(rel) => {
                let part = resolve_target(workbook_dir, &rel.target);
                package
                    .part(&part)?
                    .map(|xml| parse_shared_strings(&xml))
                    .transpose()?
                    .unwrap_or_default()
            },
            None => Vec::new(),
        };

        let styles = match workbook_rels.by_type(rt::STYLES) {
            Some(rel) => {
                let part = resolve_target(workbook_dir, &rel.target);
                package
                    .part(&part)?
                    .map(|xml| parse_styles(&xml))
                    .transpose()?
                    .unwrap_or_default()
            },
            None => StyleTable::default(),
        };

        let mut sheets = Vec::with_capacity(entries.len());
        for entry in &entries {
            let rel = workbook_rels.get(&entry.r_id).ok_or_else(|| {
                Error::PartNotFound(format!("worksheet relationship {}", entry.r_id))
            })?;
            let part = resolve_target(workbook_dir, &rel.target);
            let xml = package.required_part(&part)?;
            let (sheet_dir, sheet_file) = part.rsplit_once('/').unwrap_or(("", part.as_str()));
            if let Some(rels) = package.part(&rels_part_name(sheet_dir, sheet_file))? {
                warn_dropped_parts(&part, &Relationships::parse(&rels)?);
            }
            sheets.push(parse_worksheet_xml(&entry.name, &xml, &shared_strings, &styles)?);
        }

        if sheets.is_empty() {
            return Err(Error::Xml("workbook contains no worksheets".to_string()));
        }

        let properties = match root_rels.by_type(rt::CORE_PROPERTIES) {
            Some(rel) => package
                .part(&resolve_target("", &rel.target))?
                .map(|xml| DocumentProperties::parse(&xml))
                .transpose()?
                .unwrap_or_default(),
            None => DocumentProperties::default(),
        };

        debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            styles = styles.len(),
            "workbook decoded"
        );

        Ok(Self { sheets, properties })
    }

    /// Serialize the document as an `.xlsx` package into `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        if self.sheets.is_empty() {
            return Err(Error::InvalidLayout(
                "a workbook needs at least one sheet".to_string(),
            ));
        }
        write_package(self, writer)
    }

    /// Serialize the document into a byte buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

/// Relationship types whose targets are rebuilt when the document is saved.
const KEPT_PART_KINDS: &[&str] = &["worksheet", "styles", "sharedStrings", "theme", "calcChain"];

/// Name of the relationships part belonging to `dir/file`.
fn rels_part_name(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Log the related parts of `source` that saving will not write back.
fn warn_dropped_parts(source: &str, rels: &Relationships) {
    let dropped: Vec<&str> = rels
        .iter()
        .filter_map(|rel| rel.reltype.rsplit('/').next())
        .filter(|kind| !KEPT_PART_KINDS.contains(kind))
        .collect();
    if !dropped.is_empty() {
        warn!(
            part = source,
            kinds = ?dropped,
            "related parts will not be kept when the ledger is saved"
        );
    }
}
