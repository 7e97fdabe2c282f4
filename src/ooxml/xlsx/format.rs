//! Shared formatting types for XLSX (used in both reading and writing).

/// Cell format information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    pub font: Option<CellFont>,
    pub fill: Option<CellFill>,
    pub border: Option<CellBorder>,
    pub alignment: Option<CellAlignment>,
    pub number_format: Option<NumberFormat>,
}

impl CellFormat {
    /// Centered on both axes with word wrap.
    pub fn centered_wrapped() -> Self {
        Self {
            alignment: Some(CellAlignment {
                horizontal: Some(HorizontalAlignment::Center),
                vertical: Some(VerticalAlignment::Center),
                wrap_text: true,
            }),
            ..Default::default()
        }
    }

    pub fn with_font(mut self, font: CellFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_border(mut self, border: CellBorder) -> Self {
        self.border = Some(border);
        self
    }
}

/// Font properties for a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
}

impl CellFont {
    pub fn bold(size: f64) -> Self {
        Self {
            bold: true,
            size: Some(size),
            ..Default::default()
        }
    }
}

/// Fill properties for a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFill {
    pub pattern_type: CellFillPatternType,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
}

/// Cell fill pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellFillPatternType {
    None,
    Solid,
    Gray125,
    DarkGray,
    MediumGray,
    LightGray,
    Gray0625,
}

impl CellFillPatternType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Solid => "solid",
            Self::Gray125 => "gray125",
            Self::DarkGray => "darkGray",
            Self::MediumGray => "mediumGray",
            Self::LightGray => "lightGray",
            Self::Gray0625 => "gray0625",
        }
    }

    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "solid" => Self::Solid,
            "gray125" => Self::Gray125,
            "darkGray" => Self::DarkGray,
            "mediumGray" => Self::MediumGray,
            "lightGray" => Self::LightGray,
            "gray0625" => Self::Gray0625,
            _ => Self::None,
        }
    }
}

/// Border properties for a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellBorder {
    pub left: Option<CellBorderSide>,
    pub right: Option<CellBorderSide>,
    pub top: Option<CellBorderSide>,
    pub bottom: Option<CellBorderSide>,
    pub diagonal: Option<CellBorderSide>,
}

impl CellBorder {
    /// Thin line on all four sides.
    pub fn thin() -> Self {
        let side = || Some(CellBorderSide::new(CellBorderLineStyle::Thin));
        Self {
            left: side(),
            right: side(),
            top: side(),
            bottom: side(),
            diagonal: None,
        }
    }

    /// Whether all four outer sides carry a visible line.
    pub fn is_closed(&self) -> bool {
        [&self.left, &self.right, &self.top, &self.bottom]
            .iter()
            .all(|side| side.as_ref().is_some_and(|s| s.style != CellBorderLineStyle::None))
    }
}

/// Border side properties.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBorderSide {
    pub style: CellBorderLineStyle,
    pub color: Option<String>,
}

impl CellBorderSide {
    pub fn new(style: CellBorderLineStyle) -> Self {
        Self { style, color: None }
    }
}

/// Border line styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellBorderLineStyle {
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl CellBorderLineStyle {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Thin => "thin",
            Self::Medium => "medium",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Thick => "thick",
            Self::Double => "double",
            Self::Hair => "hair",
            Self::MediumDashed => "mediumDashed",
            Self::DashDot => "dashDot",
            Self::MediumDashDot => "mediumDashDot",
            Self::DashDotDot => "dashDotDot",
            Self::MediumDashDotDot => "mediumDashDotDot",
            Self::SlantDashDot => "slantDashDot",
        }
    }

    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "thin" => Self::Thin,
            "medium" => Self::Medium,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "thick" => Self::Thick,
            "double" => Self::Double,
            "hair" => Self::Hair,
            "mediumDashed" => Self::MediumDashed,
            "dashDot" => Self::DashDot,
            "mediumDashDot" => Self::MediumDashDot,
            "dashDotDot" => Self::DashDotDot,
            "mediumDashDotDot" => Self::MediumDashDotDot,
            "slantDashDot" => Self::SlantDashDot,
            _ => Self::None,
        }
    }
}

/// Text alignment within a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAlignment {
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: bool,
}

/// Horizontal alignment values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Fill => "fill",
            Self::Justify => "justify",
            Self::CenterContinuous => "centerContinuous",
            Self::Distributed => "distributed",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "general" => Self::General,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "fill" => Self::Fill,
            "justify" => Self::Justify,
            "centerContinuous" => Self::CenterContinuous,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }
}

/// Vertical alignment values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Justify => "justify",
            Self::Distributed => "distributed",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "top" => Self::Top,
            "center" => Self::Center,
            "bottom" => Self::Bottom,
            "justify" => Self::Justify,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }
}

/// Number format attached to a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    /// One of the formats predefined by the spreadsheet application (id < 164)
    Builtin(u32),
    /// A custom format code
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thin_border_is_closed() {
        assert!(CellBorder::thin().is_closed());
        assert!(!CellBorder::default().is_closed());
    }

    #[test]
    fn enum_strings_round_trip() {
        for style in [
            CellBorderLineStyle::Thin,
            CellBorderLineStyle::MediumDashDotDot,
            CellBorderLineStyle::Double,
        ] {
            assert_eq!(CellBorderLineStyle::parse(style.as_str()), style);
        }
        assert_eq!(
            HorizontalAlignment::parse("center"),
            Some(HorizontalAlignment::Center)
        );
        assert_eq!(VerticalAlignment::parse("sideways"), None);
    }
}
