//! Parser for the shared string table (`xl/sharedStrings.xml`).

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::xml::{decode_ooxml_escapes, read_text};
use crate::common::{Error, Result};

/// Parse the shared string table into its strings, in index order.
///
/// Rich text runs are flattened to their plain text. Phonetic runs
/// (`<rPh>`) are not part of the displayed value and are dropped.
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                strings.push(read_string_item(&mut reader, b"si")?);
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(strings)
}

/// Read the text of a string item (`<si>` or an inline `<is>`) up to `end`.
///
/// `_xHHHH_` escapes are decoded once the runs are joined.
pub(crate) fn read_string_item(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => text.push_str(&read_text(reader, b"t")?),
                b"rPh" => {
                    read_text(reader, b"rPh")?;
                },
                _ => {},
            },
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(Error::Xml(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(end)
                )));
            },
            _ => {},
        }
    }

    Ok(decode_ooxml_escapes(&text).into_owned())
}
