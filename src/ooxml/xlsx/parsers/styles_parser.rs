//! XML parser for styles.xml file.
//!
//! The stylesheet is resolved eagerly into one [`CellFormat`] per cell XF
//! record, so worksheet parsing only has to look up the `s` attribute of a
//! cell. Theme and indexed colors are dropped; only explicit ARGB colors
//! survive a round trip.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{attribute, bool_attribute};
use crate::common::Result;
use crate::ooxml::xlsx::format::{
    CellAlignment, CellBorder, CellBorderLineStyle, CellBorderSide, CellFill, CellFillPatternType,
    CellFont, CellFormat, HorizontalAlignment, NumberFormat, VerticalAlignment,
};

/// First number format id available to custom formats.
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Cell formats of a workbook, indexed by the `s` attribute of a cell.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    formats: Vec<CellFormat>,
}

impl StyleTable {
    /// Format of style index `index`.
    ///
    /// Index 0 is the workbook default and resolves to `None`, as does an
    /// index past the end of the table.
    pub fn format(&self, index: usize) -> Option<&CellFormat> {
        if index == 0 {
            return None;
        }
        self.formats.get(index)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Raw `<xf>` record before its ids are resolved.
#[derive(Debug, Default)]
struct XfRecord {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<CellAlignment>,
}

/// Components collected while reading the stylesheet.
#[derive(Debug, Default)]
struct RawStyles {
    number_formats: HashMap<u32, String>,
    fonts: Vec<CellFont>,
    fills: Vec<CellFill>,
    borders: Vec<CellBorder>,
    cell_xfs: Vec<XfRecord>,
}

/// Parse styles from xl/styles.xml XML content.
pub fn parse_styles(xml: &str) -> Result<StyleTable> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut raw = RawStyles::default();
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"numFmts" => parse_number_formats(&mut reader, &mut raw.number_formats)?,
                b"fonts" => parse_fonts(&mut reader, &mut raw.fonts)?,
                b"fills" => parse_fills(&mut reader, &mut raw.fills)?,
                b"borders" => parse_borders(&mut reader, &mut raw.borders)?,
                b"cellXfs" => parse_cell_xfs(&mut reader, &mut raw.cell_xfs)?,
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(raw.resolve())
}

impl RawStyles {
    fn resolve(self) -> StyleTable {
        let formats = self
            .cell_xfs
            .iter()
            .map(|xf| CellFormat {
                font: (xf.font_id != 0)
                    .then(|| self.fonts.get(xf.font_id).cloned())
                    .flatten(),
                // fills 0 and 1 are the mandatory none/gray125 pair
                fill: (xf.fill_id > 1)
                    .then(|| self.fills.get(xf.fill_id).cloned())
                    .flatten(),
                border: (xf.border_id != 0)
                    .then(|| self.borders.get(xf.border_id).cloned())
                    .flatten(),
                alignment: xf.alignment.clone(),
                number_format: self.number_format(xf.num_fmt_id),
            })
            .collect();

        StyleTable { formats }
    }

    fn number_format(&self, id: u32) -> Option<NumberFormat> {
        if id == 0 {
            return None;
        }
        match self.number_formats.get(&id) {
            Some(code) => Some(NumberFormat::Custom(code.clone())),
            None if id < FIRST_CUSTOM_NUM_FMT => Some(NumberFormat::Builtin(id)),
            None => None,
        }
    }
}

/// Parse number formats section.
fn parse_number_formats(
    reader: &mut Reader<&[u8]>,
    number_formats: &mut HashMap<u32, String>,
) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"numFmt" => {
                let decoder = reader.decoder();
                let id = attribute(&e, b"numFmtId", decoder)?.and_then(|v| v.parse::<u32>().ok());
                let code = attribute(&e, b"formatCode", decoder)?;

                if let (Some(id), Some(code)) = (id, code) {
                    number_formats.insert(id, code);
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"numFmts" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(())
}

/// Parse fonts section.
fn parse_fonts(reader: &mut Reader<&[u8]>, fonts: &mut Vec<CellFont>) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"font" => fonts.push(parse_font(reader)?),
            Event::Empty(e) if e.local_name().as_ref() == b"font" => fonts.push(CellFont::default()),
            Event::End(e) if e.local_name().as_ref() == b"fonts" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(())
}

/// Parse a single font element.
fn parse_font(reader: &mut Reader<&[u8]>) -> Result<CellFont> {
    let mut font = CellFont::default();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                let decoder = reader.decoder();
                match e.local_name().as_ref() {
                    b"name" => font.name = attribute(&e, b"val", decoder)?,
                    b"sz" => {
                        font.size = attribute(&e, b"val", decoder)?
                            .and_then(|v| fast_float2::parse::<f64, _>(v.as_bytes()).ok());
                    },
                    b"b" => font.bold = bool_attribute(&e, b"val", decoder, true)?,
                    b"i" => font.italic = bool_attribute(&e, b"val", decoder, true)?,
                    b"u" => {
                        font.underline = attribute(&e, b"val", decoder)?.as_deref() != Some("none");
                    },
                    b"color" => font.color = rgb_color(&e, reader)?,
                    _ => {},
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"font" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(font)
}

/// Parse fills section.
fn parse_fills(reader: &mut Reader<&[u8]>, fills: &mut Vec<CellFill>) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"fill" => fills.push(parse_fill(reader)?),
            Event::Empty(e) if e.local_name().as_ref() == b"fill" => fills.push(CellFill {
                pattern_type: CellFillPatternType::None,
                fg_color: None,
                bg_color: None,
            }),
            Event::End(e) if e.local_name().as_ref() == b"fills" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(())
}

/// Parse a single fill element. Gradient fills are read as empty pattern fills.
fn parse_fill(reader: &mut Reader<&[u8]>) -> Result<CellFill> {
    let mut fill = CellFill {
        pattern_type: CellFillPatternType::None,
        fg_color: None,
        bg_color: None,
    };
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                let decoder = reader.decoder();
                match e.local_name().as_ref() {
                    b"patternFill" => {
                        if let Some(pattern) = attribute(&e, b"patternType", decoder)? {
                            fill.pattern_type = CellFillPatternType::parse(&pattern);
                        }
                    },
                    b"fgColor" => fill.fg_color = rgb_color(&e, reader)?,
                    b"bgColor" => fill.bg_color = rgb_color(&e, reader)?,
                    _ => {},
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"fill" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(fill)
}

/// Parse borders section.
fn parse_borders(reader: &mut Reader<&[u8]>, borders: &mut Vec<CellBorder>) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"border" => {
                borders.push(parse_border(reader)?);
            },
            Event::Empty(e) if e.local_name().as_ref() == b"border" => {
                borders.push(CellBorder::default());
            },
            Event::End(e) if e.local_name().as_ref() == b"borders" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(())
}

/// Parse a single border element.
fn parse_border(reader: &mut Reader<&[u8]>) -> Result<CellBorder> {
    let mut border = CellBorder::default();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let (e, has_children) = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => (e.into_owned(), true),
            Event::Empty(e) => (e.into_owned(), false),
            Event::End(e) if e.local_name().as_ref() == b"border" => break,
            Event::Eof => break,
            _ => continue,
        };

        let side = match e.local_name().as_ref() {
            b"left" | b"start" => &mut border.left,
            b"right" | b"end" => &mut border.right,
            b"top" => &mut border.top,
            b"bottom" => &mut border.bottom,
            b"diagonal" => &mut border.diagonal,
            _ => continue,
        };
        *side = parse_border_side(reader, &e, has_children)?;
    }

    Ok(border)
}

/// Parse one side of a border. A side without a style draws nothing.
fn parse_border_side(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    has_children: bool,
) -> Result<Option<CellBorderSide>> {
    let style = attribute(e, b"style", reader.decoder())?.map(|s| CellBorderLineStyle::parse(&s));
    let mut color = None;

    if has_children {
        let end = e.local_name().as_ref().to_vec();
        let mut buf = Vec::with_capacity(128);
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(c) | Event::Empty(c) if c.local_name().as_ref() == b"color" => {
                    color = rgb_color(&c, reader)?;
                },
                Event::End(c) if c.local_name().as_ref() == end.as_slice() => break,
                Event::Eof => break,
                _ => {},
            }
        }
    }

    Ok(style
        .filter(|style| *style != CellBorderLineStyle::None)
        .map(|style| CellBorderSide { style, color }))
}

/// Parse the cellXfs section.
fn parse_cell_xfs(reader: &mut Reader<&[u8]>, cell_xfs: &mut Vec<XfRecord>) -> Result<()> {
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"xf" => {
                let mut xf = parse_xf_attributes(&e, reader)?;
                xf.alignment = parse_xf_children(reader)?;
                cell_xfs.push(xf);
            },
            Event::Empty(e) if e.local_name().as_ref() == b"xf" => {
                cell_xfs.push(parse_xf_attributes(&e, reader)?);
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(())
}

fn parse_xf_attributes(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XfRecord> {
    let decoder = reader.decoder();
    let id = |name: &[u8]| -> Result<Option<usize>> {
        Ok(attribute(e, name, decoder)?.and_then(|v| v.parse::<usize>().ok()))
    };

    Ok(XfRecord {
        num_fmt_id: id(b"numFmtId")?.unwrap_or(0) as u32,
        font_id: id(b"fontId")?.unwrap_or(0),
        fill_id: id(b"fillId")?.unwrap_or(0),
        border_id: id(b"borderId")?.unwrap_or(0),
        alignment: None,
    })
}

/// Read the children of an `<xf>` up to its end tag, returning its alignment.
fn parse_xf_children(reader: &mut Reader<&[u8]>) -> Result<Option<CellAlignment>> {
    let mut alignment = None;
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"alignment" => {
                let decoder = reader.decoder();
                alignment = Some(CellAlignment {
                    horizontal: attribute(&e, b"horizontal", decoder)?
                        .and_then(|v| HorizontalAlignment::parse(&v)),
                    vertical: attribute(&e, b"vertical", decoder)?
                        .and_then(|v| VerticalAlignment::parse(&v)),
                    wrap_text: bool_attribute(&e, b"wrapText", decoder, false)?,
                });
            },
            Event::End(e) if e.local_name().as_ref() == b"xf" => break,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(alignment)
}

/// Explicit ARGB color of a color element.
///
/// Theme and indexed colors resolve to `None`. A `<color>` written with
/// children has them skipped.
fn rgb_color(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Option<String>> {
    Ok(attribute(e, b"rgb", reader.decoder())?.filter(|rgb| !rgb.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="16"/><color rgb="FF1F3864"/><name val="Calibri"/></font>
    <font><i/><sz val="12"/><color theme="1"/><name val="Segoe Script"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFD9E1F2"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border>
      <left style="thin"><color indexed="64"/></left>
      <right style="thin"><color rgb="FF000000"/></right>
      <top style="thin"/>
      <bottom style="medium"/>
      <diagonal/>
    </border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyAlignment="1">
      <alignment horizontal="center" vertical="center" wrapText="1"/>
    </xf>
    <xf numFmtId="164" fontId="2" fillId="0" borderId="1" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn test_default_index_has_no_format() {
        let table = parse_styles(STYLES).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.format(0).is_none());
        assert!(table.format(99).is_none());
    }

    #[test]
    fn test_header_format_is_resolved() {
        let table = parse_styles(STYLES).unwrap();
        let format = table.format(1).unwrap();

        let font = format.font.as_ref().unwrap();
        assert!(font.bold);
        assert_eq!(font.size, Some(16.0));
        assert_eq!(font.color.as_deref(), Some("FF1F3864"));

        let fill = format.fill.as_ref().unwrap();
        assert_eq!(fill.pattern_type, CellFillPatternType::Solid);
        assert_eq!(fill.fg_color.as_deref(), Some("FFD9E1F2"));
        assert_eq!(fill.bg_color, None);

        let border = format.border.as_ref().unwrap();
        assert!(border.is_closed());
        assert_eq!(border.right.as_ref().unwrap().color.as_deref(), Some("FF000000"));
        assert_eq!(border.bottom.as_ref().unwrap().style, CellBorderLineStyle::Medium);
        assert_eq!(border.diagonal, None);

        let alignment = format.alignment.as_ref().unwrap();
        assert_eq!(alignment.horizontal, Some(HorizontalAlignment::Center));
        assert_eq!(alignment.vertical, Some(VerticalAlignment::Center));
        assert!(alignment.wrap_text);
    }

    #[test]
    fn test_number_formats_and_theme_colors() {
        let table = parse_styles(STYLES).unwrap();

        let data = table.format(2).unwrap();
        assert_eq!(data.number_format, Some(NumberFormat::Custom("0.000".to_string())));
        let font = data.font.as_ref().unwrap();
        assert!(font.italic);
        assert_eq!(font.name.as_deref(), Some("Segoe Script"));
        assert_eq!(font.color, None);
        assert!(data.alignment.is_none());

        assert_eq!(table.format(3).unwrap().number_format, Some(NumberFormat::Builtin(14)));
    }
}
