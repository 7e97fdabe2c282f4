//! XML parsing modules for Excel files.
//!
//! This module contains specialized parsers for the different XML parts
//! within an Excel workbook (.xlsx): the workbook, shared strings, styles
//! and the individual worksheets.

pub mod shared_strings;
pub mod styles_parser;
pub mod workbook_parser;
pub mod worksheet_parser;

use quick_xml::encoding::Decoder;
use quick_xml::events::BytesStart;

use crate::common::Result;

pub use shared_strings::parse_shared_strings;
pub use styles_parser::{StyleTable, parse_styles};
pub use workbook_parser::{SheetEntry, parse_workbook_xml};
pub use worksheet_parser::parse_worksheet_xml;

/// Value of the attribute with local name `name`, unescaped.
pub(crate) fn attribute(e: &BytesStart<'_>, name: &[u8], decoder: Decoder) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.decode_and_unescape_value(decoder)?.into_owned()));
        }
    }
    Ok(None)
}

/// Boolean attribute as written by Excel (`1`/`true`), `default` when absent.
pub(crate) fn bool_attribute(
    e: &BytesStart<'_>,
    name: &[u8],
    decoder: Decoder,
    default: bool,
) -> Result<bool> {
    Ok(match attribute(e, name, decoder)?.as_deref() {
        Some("1") | Some("true") => true,
        Some("0") | Some("false") => false,
        _ => default,
    })
}
