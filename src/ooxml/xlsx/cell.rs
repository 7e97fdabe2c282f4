//! Cell values and A1-style cell references.

use std::fmt;

use crate::common::{Error, Result};

/// Types of data that can be stored in a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (may still carry a format)
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    String(String),
    /// Error value such as `#N/A`
    Error(String),
    /// Formula (without the leading `=`) and the value last computed for it
    Formula {
        formula: String,
        cached_value: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Formula cell with an optional cached result.
    pub fn formula(formula: impl Into<String>, cached: Option<CellValue>) -> Self {
        CellValue::Formula {
            formula: formula.into(),
            cached_value: cached.map(Box::new),
        }
    }

    /// The value a reader sees: the cached result for formulas, `self` otherwise.
    pub fn displayed(&self) -> &CellValue {
        match self {
            CellValue::Formula { cached_value, .. } => {
                cached_value.as_deref().unwrap_or(&CellValue::Empty)
            },
            other => other,
        }
    }

    /// The cell content as text, trimmed.
    ///
    /// Numbers are printed in their shortest round-trip form, so a cell
    /// holding `3.0` reads as `"3"`.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.trim().to_string(),
            CellValue::Error(e) => e.trim().to_string(),
            CellValue::Formula { .. } => self.displayed().text(),
            other => other.to_string(),
        }
    }

    /// Whether the cell shows nothing. A formula never counts as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) | CellValue::Error(s) => s.trim().is_empty(),
            CellValue::Formula { formula, .. } => formula.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric content, if the value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Formula { .. } => self.displayed().as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(s) | CellValue::Error(s) => f.write_str(s),
            CellValue::Formula { .. } => fmt::Display::fmt(self.displayed(), f),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Convert a 0-based column index to Excel column letters (0 -> "A", 26 -> "AA").
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut n = col + 1;

    while n > 0 {
        n -= 1;
        let letter = ((n % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        n /= 26;
    }

    letters
}

/// Format a 0-based (row, col) pair as an A1 reference.
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut reference = column_to_letters(col);
    let mut buf = itoa::Buffer::new();
    reference.push_str(buf.format(row + 1));
    reference
}

/// Parse an A1 reference (optionally with `$` markers) into 0-based (row, col).
pub fn parse_cell_reference(reference: &str) -> Result<(u32, u32)> {
    let invalid = || Error::Xml(format!("Invalid cell reference: {}", reference));
    let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = cleaned.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut col = 0u32;
    for byte in letters.bytes() {
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add((byte.to_ascii_uppercase() - b'A' + 1) as u32))
            .ok_or_else(invalid)?;
    }

    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok((row - 1, col - 1))
}

/// Parse a range such as `A1:O1` into 0-based (first_row, first_col, last_row, last_col).
///
/// A single-cell reference yields a one-cell range.
pub fn parse_range_reference(range: &str) -> Result<(u32, u32, u32, u32)> {
    match range.split_once(':') {
        Some((start, end)) => {
            let (r1, c1) = parse_cell_reference(start)?;
            let (r2, c2) = parse_cell_reference(end)?;
            Ok((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
        },
        None => {
            let (r, c) = parse_cell_reference(range)?;
            Ok((r, c, r, c))
        },
    }
}
