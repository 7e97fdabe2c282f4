use std::borrow::Cow;
use std::fmt::Write as FmtWrite;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::new(["&", "<", ">", "\"", "'"]).expect("Failed to build XML escaper")
});

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use sheet_ledger::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("Colete <Buc.>"), "Colete &lt;Buc.&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Encode characters XML 1.0 cannot carry as OOXML `_xHHHH_` escapes.
///
/// Control characters other than tab, line feed and carriage return become
/// `_x000C_` and the like. A literal `_x` that already reads as an escape
/// has its underscore written as `_x005F_` so it comes back unchanged.
/// The result still needs [`escape_xml`].
///
/// # Examples
///
/// ```
/// use sheet_ledger::common::xml::encode_ooxml_escapes;
/// assert_eq!(encode_ooxml_escapes("a\u{c}b"), "a_x000C_b");
/// assert_eq!(encode_ooxml_escapes("_x0041_"), "_x005F_x0041_");
/// assert_eq!(encode_ooxml_escapes("plain_x"), "plain_x");
/// ```
pub fn encode_ooxml_escapes(s: &str) -> Cow<'_, str> {
    let needs_encoding = s.chars().any(is_forbidden_control) || escape_at_any(s);
    if !needs_encoding {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for (pos, ch) in s.char_indices() {
        if is_forbidden_control(ch) || (ch == '_' && is_escape_at(&s[pos..])) {
            // Writing to a String cannot fail
            let _ = write!(out, "_x{:04X}_", u32::from(ch));
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// Whether `s` starts with an `_xHHHH_` escape sequence.
pub(crate) fn is_escape_at(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

fn escape_at_any(s: &str) -> bool {
    s.match_indices("_x").any(|(pos, _)| is_escape_at(&s[pos..]))
}

fn is_forbidden_control(ch: char) -> bool {
    ch.is_ascii_control() && !matches!(ch, '\t' | '\n' | '\r' | '\u{7f}')
}

/// Whether a text node needs `xml:space="preserve"` to keep its content intact.
///
/// Leading or trailing whitespace and embedded line breaks are otherwise
/// subject to normalization by spreadsheet applications.
#[inline]
pub fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(
            escape_xml(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn control_characters_become_escapes() {
        assert_eq!(encode_ooxml_escapes("piese\u{c}auto\u{1}"), "piese_x000C_auto_x0001_");
        assert_eq!(encode_ooxml_escapes("tab\tand\nline"), "tab\tand\nline");
    }

    #[test]
    fn literal_escape_text_is_protected() {
        assert_eq!(encode_ooxml_escapes("cod _x0041_ B"), "cod _x005F_x0041_ B");
        assert_eq!(encode_ooxml_escapes("_x41_ and _xZZZZ_"), "_x41_ and _xZZZZ_");
        assert!(matches!(encode_ooxml_escapes("Nr. crt."), Cow::Borrowed(_)));
    }

    #[test]
    fn space_preserve_detection() {
        assert!(needs_space_preserve(" lead"));
        assert!(needs_space_preserve("trail "));
        assert!(needs_space_preserve("two\nlines"));
        assert!(!needs_space_preserve("Nr. crt."));
        assert!(!needs_space_preserve(""));
    }
}
