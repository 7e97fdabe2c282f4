//! Styles.xml generator for XLSX files.
//!
//! This module handles the generation of the styles.xml file, which defines
//! all the formatting information (fonts, fills, borders, number formats,
//! alignment and cell formats) used in a workbook.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as FmtWrite;
use std::hash::{Hash, Hasher};

use crate::common::Result;
use crate::common::xml::escape_xml;
use crate::ooxml::xlsx::format::{
    CellAlignment, CellBorder, CellBorderSide, CellFill, CellFillPatternType, CellFont, CellFormat,
    NumberFormat,
};

/// Font used when a cell format does not name one.
const DEFAULT_FONT_NAME: &str = "Calibri";
const DEFAULT_FONT_SIZE: f64 = 11.0;

/// First id available to custom number formats.
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// One `<xf>` record: indices into the font/fill/border tables plus alignment.
#[derive(Debug, Clone, PartialEq)]
struct XfRecord {
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    num_fmt_id: u32,
    alignment: Option<CellAlignment>,
}

/// Builder for generating styles.xml content.
///
/// This struct collects all unique fonts, fills, borders, and cell formats,
/// assigns indices to them, and generates the complete styles.xml content.
#[derive(Debug)]
pub struct StylesBuilder {
    /// Unique fonts (index -> font)
    fonts: Vec<CellFont>,
    /// Font lookup (font hash -> index)
    font_map: HashMap<u64, usize>,
    /// Unique fills (index -> fill)
    fills: Vec<CellFill>,
    /// Fill lookup (fill hash -> index)
    fill_map: HashMap<u64, usize>,
    /// Unique borders (index -> border)
    borders: Vec<CellBorder>,
    /// Border lookup (border hash -> index)
    border_map: HashMap<u64, usize>,
    /// Custom number format codes, id = 164 + position
    number_formats: Vec<String>,
    /// Number format lookup (format code -> id)
    number_format_map: HashMap<String, u32>,
    /// Cell formats (XF records)
    cell_formats: Vec<XfRecord>,
    /// Cell format lookup (format hash -> index)
    cell_format_map: HashMap<u64, usize>,
}

impl StylesBuilder {
    /// Create a new StylesBuilder with default styles.
    pub fn new() -> Self {
        let mut builder = Self {
            fonts: Vec::new(),
            font_map: HashMap::new(),
            fills: Vec::new(),
            fill_map: HashMap::new(),
            borders: Vec::new(),
            border_map: HashMap::new(),
            number_formats: Vec::new(),
            number_format_map: HashMap::new(),
            cell_formats: Vec::new(),
            cell_format_map: HashMap::new(),
        };

        // Excel requires font 0, fills 0 (none) and 1 (gray125), border 0 and xf 0
        builder.add_font(&CellFont::default());
        for pattern_type in [CellFillPatternType::None, CellFillPatternType::Gray125] {
            builder.add_fill(&CellFill {
                pattern_type,
                fg_color: None,
                bg_color: None,
            });
        }
        builder.add_border(&CellBorder::default());
        builder.cell_formats.push(XfRecord {
            font_id: 0,
            fill_id: 0,
            border_id: 0,
            num_fmt_id: 0,
            alignment: None,
        });
        builder
            .cell_format_map
            .insert(Self::hash_cell_format(&CellFormat::default()), 0);

        builder
    }

    /// Add a cell format and return its style index.
    ///
    /// If the format has already been added, returns the existing index.
    pub fn add_cell_format(&mut self, format: &CellFormat) -> usize {
        let format_hash = Self::hash_cell_format(format);
        if let Some(&index) = self.cell_format_map.get(&format_hash) {
            return index;
        }

        let record = XfRecord {
            font_id: format.font.as_ref().map_or(0, |font| self.add_font(font)),
            fill_id: format.fill.as_ref().map_or(0, |fill| self.add_fill(fill)),
            border_id: format
                .border
                .as_ref()
                .map_or(0, |border| self.add_border(border)),
            num_fmt_id: format
                .number_format
                .as_ref()
                .map_or(0, |num_fmt| self.add_number_format(num_fmt)),
            alignment: format.alignment.clone(),
        };

        let index = self.cell_formats.len();
        self.cell_formats.push(record);
        self.cell_format_map.insert(format_hash, index);
        index
    }

    /// Number of XF records, the default one included.
    pub fn cell_format_count(&self) -> usize {
        self.cell_formats.len()
    }

    fn add_font(&mut self, font: &CellFont) -> usize {
        let hash = Self::hash_font(font);
        if let Some(&index) = self.font_map.get(&hash) {
            return index;
        }

        let index = self.fonts.len();
        self.fonts.push(font.clone());
        self.font_map.insert(hash, index);
        index
    }

    fn add_fill(&mut self, fill: &CellFill) -> usize {
        let hash = Self::hash_fill(fill);
        if let Some(&index) = self.fill_map.get(&hash) {
            return index;
        }

        let index = self.fills.len();
        self.fills.push(fill.clone());
        self.fill_map.insert(hash, index);
        index
    }

    fn add_border(&mut self, border: &CellBorder) -> usize {
        let hash = Self::hash_border(border);
        if let Some(&index) = self.border_map.get(&hash) {
            return index;
        }

        let index = self.borders.len();
        self.borders.push(border.clone());
        self.border_map.insert(hash, index);
        index
    }

    fn add_number_format(&mut self, format: &NumberFormat) -> u32 {
        let code = match format {
            NumberFormat::Builtin(id) => return *id,
            NumberFormat::Custom(code) => code,
        };
        if let Some(&id) = self.number_format_map.get(code) {
            return id;
        }

        let id = FIRST_CUSTOM_NUM_FMT + self.number_formats.len() as u32;
        self.number_formats.push(code.clone());
        self.number_format_map.insert(code.clone(), id);
        id
    }

    /// Generate the complete styles.xml content.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.number_formats.is_empty() {
            write!(xml, r#"<numFmts count="{}">"#, self.number_formats.len())?;
            for (i, code) in self.number_formats.iter().enumerate() {
                write!(
                    xml,
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    FIRST_CUSTOM_NUM_FMT + i as u32,
                    escape_xml(code)
                )?;
            }
            xml.push_str("</numFmts>");
        }

        write!(xml, r#"<fonts count="{}">"#, self.fonts.len())?;
        for font in &self.fonts {
            write_font(&mut xml, font)?;
        }
        xml.push_str("</fonts>");

        write!(xml, r#"<fills count="{}">"#, self.fills.len())?;
        for fill in &self.fills {
            write_fill(&mut xml, fill)?;
        }
        xml.push_str("</fills>");

        write!(xml, r#"<borders count="{}">"#, self.borders.len())?;
        for border in &self.borders {
            write_border(&mut xml, border)?;
        }
        xml.push_str("</borders>");

        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        write!(xml, r#"<cellXfs count="{}">"#, self.cell_formats.len())?;
        for xf in &self.cell_formats {
            write_xf(&mut xml, xf)?;
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");

        Ok(xml)
    }

    fn hash_font(font: &CellFont) -> u64 {
        let mut hasher = DefaultHasher::new();
        font.bold.hash(&mut hasher);
        font.italic.hash(&mut hasher);
        font.underline.hash(&mut hasher);
        font.name.hash(&mut hasher);
        font.size.map(f64::to_bits).hash(&mut hasher);
        font.color.hash(&mut hasher);
        hasher.finish()
    }

    fn hash_fill(fill: &CellFill) -> u64 {
        let mut hasher = DefaultHasher::new();
        fill.pattern_type.hash(&mut hasher);
        fill.fg_color.hash(&mut hasher);
        fill.bg_color.hash(&mut hasher);
        hasher.finish()
    }

    fn hash_border(border: &CellBorder) -> u64 {
        let mut hasher = DefaultHasher::new();
        for side in [
            &border.left,
            &border.right,
            &border.top,
            &border.bottom,
            &border.diagonal,
        ] {
            match side {
                Some(s) => {
                    1u8.hash(&mut hasher);
                    s.style.hash(&mut hasher);
                    s.color.hash(&mut hasher);
                },
                None => 0u8.hash(&mut hasher),
            }
        }
        hasher.finish()
    }

    fn hash_cell_format(format: &CellFormat) -> u64 {
        let mut hasher = DefaultHasher::new();
        format.font.as_ref().map(Self::hash_font).hash(&mut hasher);
        format.fill.as_ref().map(Self::hash_fill).hash(&mut hasher);
        format.border.as_ref().map(Self::hash_border).hash(&mut hasher);
        format.number_format.hash(&mut hasher);
        if let Some(alignment) = &format.alignment {
            alignment.horizontal.hash(&mut hasher);
            alignment.vertical.hash(&mut hasher);
            alignment.wrap_text.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl Default for StylesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_font(xml: &mut String, font: &CellFont) -> Result<()> {
    xml.push_str("<font>");

    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.underline {
        xml.push_str("<u/>");
    }

    let mut size = ryu::Buffer::new();
    write!(
        xml,
        r#"<sz val="{}"/>"#,
        trim_float(size.format(font.size.unwrap_or(DEFAULT_FONT_SIZE)))
    )?;

    if let Some(color) = &font.color {
        write!(xml, r#"<color rgb="{}"/>"#, escape_xml(color))?;
    }

    let name = font.name.as_deref().unwrap_or(DEFAULT_FONT_NAME);
    write!(xml, r#"<name val="{}"/>"#, escape_xml(name))?;

    xml.push_str("</font>");
    Ok(())
}

fn write_fill(xml: &mut String, fill: &CellFill) -> Result<()> {
    write!(
        xml,
        r#"<fill><patternFill patternType="{}""#,
        fill.pattern_type.as_str()
    )?;

    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        xml.push_str("/></fill>");
        return Ok(());
    }

    xml.push('>');
    if let Some(fg_color) = &fill.fg_color {
        write!(xml, r#"<fgColor rgb="{}"/>"#, escape_xml(fg_color))?;
    }
    if let Some(bg_color) = &fill.bg_color {
        write!(xml, r#"<bgColor rgb="{}"/>"#, escape_xml(bg_color))?;
    }
    xml.push_str("</patternFill></fill>");
    Ok(())
}

fn write_border(xml: &mut String, border: &CellBorder) -> Result<()> {
    xml.push_str("<border>");
    write_border_side(xml, "left", border.left.as_ref())?;
    write_border_side(xml, "right", border.right.as_ref())?;
    write_border_side(xml, "top", border.top.as_ref())?;
    write_border_side(xml, "bottom", border.bottom.as_ref())?;
    write_border_side(xml, "diagonal", border.diagonal.as_ref())?;
    xml.push_str("</border>");
    Ok(())
}

fn write_border_side(xml: &mut String, side: &str, border_side: Option<&CellBorderSide>) -> Result<()> {
    match border_side {
        Some(bs) => {
            write!(xml, r#"<{} style="{}">"#, side, bs.style.as_str())?;
            // Excel draws a styled side without a color in automatic black
            match &bs.color {
                Some(color) => write!(xml, r#"<color rgb="{}"/>"#, escape_xml(color))?,
                None => xml.push_str(r#"<color indexed="64"/>"#),
            }
            write!(xml, "</{}>", side)?;
        },
        None => write!(xml, "<{}/>", side)?,
    }
    Ok(())
}

fn write_xf(xml: &mut String, xf: &XfRecord) -> Result<()> {
    write!(
        xml,
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    )?;

    if xf.num_fmt_id != 0 {
        xml.push_str(r#" applyNumberFormat="1""#);
    }
    if xf.font_id != 0 {
        xml.push_str(r#" applyFont="1""#);
    }
    if xf.fill_id != 0 {
        xml.push_str(r#" applyFill="1""#);
    }
    if xf.border_id != 0 {
        xml.push_str(r#" applyBorder="1""#);
    }

    let Some(alignment) = &xf.alignment else {
        xml.push_str("/>");
        return Ok(());
    };

    xml.push_str(r#" applyAlignment="1"><alignment"#);
    if let Some(horizontal) = alignment.horizontal {
        write!(xml, r#" horizontal="{}""#, horizontal.as_str())?;
    }
    if let Some(vertical) = alignment.vertical {
        write!(xml, r#" vertical="{}""#, vertical.as_str())?;
    }
    if alignment.wrap_text {
        xml.push_str(r#" wrapText="1""#);
    }
    xml.push_str("/></xf>");
    Ok(())
}

/// Drop the `.0` ryu appends to integral values.
pub(crate) fn trim_float(formatted: &str) -> &str {
    formatted.strip_suffix(".0").unwrap_or(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::format::{HorizontalAlignment, VerticalAlignment};

    #[test]
    fn test_create_default_styles() {
        let builder = StylesBuilder::new();
        assert_eq!(builder.fonts.len(), 1);
        assert_eq!(builder.fills.len(), 2);
        assert_eq!(builder.borders.len(), 1);
        assert_eq!(builder.cell_format_count(), 1);
    }

    #[test]
    fn test_default_format_maps_to_zero() {
        let mut builder = StylesBuilder::new();
        assert_eq!(builder.add_cell_format(&CellFormat::default()), 0);
    }

    #[test]
    fn test_add_cell_format_dedups() {
        let mut builder = StylesBuilder::new();
        let format = CellFormat::centered_wrapped()
            .with_font(CellFont::bold(18.0))
            .with_border(CellBorder::thin());

        let index = builder.add_cell_format(&format);
        assert_eq!(index, 1);
        assert_eq!(builder.add_cell_format(&format.clone()), index);

        // Same font and border but no alignment is a different XF
        let plain = CellFormat {
            alignment: None,
            ..format
        };
        assert_eq!(builder.add_cell_format(&plain), 2);
        assert_eq!(builder.fonts.len(), 2);
        assert_eq!(builder.borders.len(), 2);
    }

    #[test]
    fn test_number_formats() {
        let mut builder = StylesBuilder::new();
        let custom = CellFormat {
            number_format: Some(NumberFormat::Custom("0.00".into())),
            ..Default::default()
        };
        let builtin = CellFormat {
            number_format: Some(NumberFormat::Builtin(14)),
            ..Default::default()
        };
        builder.add_cell_format(&custom);
        builder.add_cell_format(&builtin);

        let xml = builder.to_xml().unwrap();
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="0.00"/>"#));
        assert!(xml.contains(r#"<xf numFmtId="14""#));
    }

    #[test]
    fn test_generate_xml_with_alignment() {
        let mut builder = StylesBuilder::new();
        let format = CellFormat {
            font: Some(CellFont {
                italic: true,
                size: Some(12.0),
                name: Some("Segoe Script".into()),
                ..Default::default()
            }),
            alignment: Some(CellAlignment {
                horizontal: Some(HorizontalAlignment::Center),
                vertical: Some(VerticalAlignment::Center),
                wrap_text: true,
            }),
            border: Some(CellBorder::thin()),
            ..Default::default()
        };
        builder.add_cell_format(&format);

        let xml = builder.to_xml().unwrap();
        assert!(xml.contains(r#"<font><i/><sz val="12"/><name val="Segoe Script"/></font>"#));
        assert!(xml.contains(r#"<left style="thin"><color indexed="64"/></left>"#));
        assert!(xml.contains(
            r#"applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf>"#
        ));
        assert!(xml.contains(r#"<cellXfs count="2">"#));
    }
}
