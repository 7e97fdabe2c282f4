//! Small helpers on top of the quick-xml event reader.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};

use super::escape::is_escape_at;
use crate::common::{Error, Result};

/// Collect the character data of the current element up to its end tag.
///
/// Entity and character references are resolved; nested elements are
/// skipped but their text is kept. Whitespace is preserved as written.
pub fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&t.decode()?),
            Event::CData(c) => text.push_str(&c.decode()?),
            Event::GeneralRef(r) => push_reference(&mut text, &r)?,
            Event::Start(e) if e.local_name().as_ref() == end => depth += 1,
            Event::End(e) if e.local_name().as_ref() == end => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            },
            Event::Eof => {
                return Err(Error::Xml(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(end)
                )));
            },
            _ => {},
        }
    }

    Ok(text)
}

/// Append the replacement text of `&name;` or `&#N;` to `text`.
///
/// Unknown named entities are kept verbatim.
pub fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<()> {
    if let Some(ch) = reference.resolve_char_ref()? {
        text.push(ch);
        return Ok(());
    }

    let name = reference.decode()?;
    match resolve_predefined_entity(&name) {
        Some(value) => text.push_str(value),
        None => {
            text.push('&');
            text.push_str(&name);
            text.push(';');
        },
    }
    Ok(())
}

/// Decode OOXML `_xHHHH_` escapes in spreadsheet text.
///
/// Sequences naming a code point that is not a valid `char` are kept as
/// written.
pub fn decode_ooxml_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);

        let decoded = is_escape_at(tail)
            .then(|| u32::from_str_radix(&tail[2..6], 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[7..];
            },
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            },
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::encode_ooxml_escapes;

    fn text_of(xml: &str, tag: &[u8]) -> String {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.local_name().as_ref() == tag => break,
                Event::Eof => panic!("start tag not found"),
                _ => {},
            }
        }
        read_text(&mut reader, tag).unwrap()
    }

    #[test]
    fn resolves_entities_and_char_refs() {
        assert_eq!(text_of("<t>A &amp; B &#x21B; &#537;</t>", b"t"), "A & B ț ș");
        assert_eq!(text_of("<t>&lt;Buc.&gt;</t>", b"t"), "<Buc.>");
    }

    #[test]
    fn keeps_outer_whitespace() {
        assert_eq!(text_of("<t>  Felul </t>", b"t"), "  Felul ");
    }

    #[test]
    fn decodes_ooxml_escapes() {
        assert_eq!(decode_ooxml_escapes("piese_x000C_auto_x0001_"), "piese\u{c}auto\u{1}");
        assert_eq!(decode_ooxml_escapes("cod _x005F_x0041_ B"), "cod _x0041_ B");
        assert_eq!(decode_ooxml_escapes("_x41_ _xD800_ end_x"), "_x41_ _xD800_ end_x");
        assert!(matches!(decode_ooxml_escapes("Felul"), Cow::Borrowed(_)));
    }

    #[test]
    fn escapes_survive_encode_then_decode() {
        for text in ["_x0041_", "a\u{c}b", "__x005F_x", "_x_x000D_"] {
            let encoded = encode_ooxml_escapes(text);
            assert_eq!(decode_ooxml_escapes(&encoded), text, "{encoded}");
        }
    }

    #[test]
    fn fails_on_truncated_document() {
        let mut reader = Reader::from_str("<t>never closed");
        let mut buf = Vec::new();
        reader.read_event_into(&mut buf).unwrap();
        assert!(read_text(&mut reader, b"t").is_err());
    }
}
