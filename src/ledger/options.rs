//! Configuration for the ledger engine.
//!
//! These are the knobs outside the frozen column schema: sheet naming,
//! the temp-file suffix used while committing, how far the header lookup
//! scans, and the cosmetic choices for data cells.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::ledger::layout::DATA_START_ROW;

/// Characters Excel does not allow in sheet names.
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME_LEN: usize = 31;

/// Engine options.
///
/// # Examples
///
/// ```rust
/// use sheet_ledger::LedgerOptions;
///
/// // Create with defaults
/// let options = LedgerOptions::default();
/// assert_eq!(options.sheet_name, "Registru");
///
/// // Or customize
/// let options = LedgerOptions::new()
///     .with_decorative_font(false)
///     .with_temp_suffix(".partial");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerOptions {
    /// Name of the sheet created for a new ledger
    pub sheet_name: String,
    /// Suffix appended to the target file name for the temporary sibling
    pub temp_suffix: String,
    /// Number of rows searched for the leaf header of an existing ledger
    pub header_scan_rows: u32,
    /// Whether to look for a handwriting font for data cells
    pub decorative_font: bool,
    /// Font size of data cells in points
    pub data_font_size: f64,
    /// Whether to freeze the banner and header rows
    pub freeze_header: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Registru".to_string(),
            temp_suffix: ".tmp".to_string(),
            header_scan_rows: 10,
            decorative_font: true,
            data_font_size: 12.0,
            freeze_header: true,
        }
    }
}

impl LedgerOptions {
    /// Create a new `LedgerOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    #[inline]
    pub fn with_temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temp_suffix = suffix.into();
        self
    }

    #[inline]
    pub fn with_header_scan_rows(mut self, rows: u32) -> Self {
        self.header_scan_rows = rows;
        self
    }

    /// Set whether data cells try a handwriting font.
    ///
    /// Disabling it also skips the system font query.
    #[inline]
    pub fn with_decorative_font(mut self, enabled: bool) -> Self {
        self.decorative_font = enabled;
        self
    }

    #[inline]
    pub fn with_data_font_size(mut self, size: f64) -> Self {
        self.data_font_size = size;
        self
    }

    #[inline]
    pub fn with_freeze_header(mut self, freeze: bool) -> Self {
        self.freeze_header = freeze;
        self
    }

    /// Load options from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self =
            serde_saphyr::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the options for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let name = self.sheet_name.trim();
        if name.is_empty() || name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::Config(format!(
                "sheet name '{}' must have 1 to {} characters",
                self.sheet_name, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
            return Err(Error::Config(format!(
                "sheet name '{}' contains '{}'",
                self.sheet_name, c
            )));
        }
        if self.temp_suffix.is_empty() || self.temp_suffix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "temp suffix '{}' must be a non-empty file name suffix",
                self.temp_suffix
            )));
        }
        if self.header_scan_rows < DATA_START_ROW {
            return Err(Error::Config(format!(
                "header_scan_rows must be at least {}",
                DATA_START_ROW
            )));
        }
        if !(self.data_font_size.is_finite() && self.data_font_size > 0.0) {
            return Err(Error::Config(format!(
                "data font size {} is not a positive number",
                self.data_font_size
            )));
        }
        Ok(())
    }
}
