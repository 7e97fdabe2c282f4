//! Shared strings table for XLSX workbooks.
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use crate::common::Result;
use crate::common::xml::{encode_ooxml_escapes, escape_xml, needs_space_preserve};

/// Mutable shared strings table.
///
/// Excel stores frequently used strings in a shared table to reduce file size.
/// This structure manages the collection of unique strings and their indices.
#[derive(Debug, Default)]
pub struct MutableSharedStrings {
    /// List of unique strings
    strings: Vec<String>,
    /// Map from string to index for fast lookup
    string_to_index: HashMap<String, usize>,
    /// Total number of references, duplicates included
    references: usize,
}

impl MutableSharedStrings {
    /// Create a new empty shared strings table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string to the shared strings table and return its index.
    ///
    /// If the string already exists, returns the existing index.
    pub fn add_string(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&index) = self.string_to_index.get(s) {
            index
        } else {
            let index = self.strings.len();
            self.strings.push(s.to_string());
            self.string_to_index.insert(s.to_string(), index);
            index
        }
    }

    /// Get the number of unique strings.
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Serialize the shared strings table to XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.strings.len() * 32);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        )?;

        for s in &self.strings {
            let text = escape_xml(&encode_ooxml_escapes(s));
            if needs_space_preserve(s) {
                write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, text)?;
            } else {
                write!(xml, "<si><t>{}</t></si>", text)?;
            }
        }

        xml.push_str("</sst>");
        Ok(xml)
    }
}
