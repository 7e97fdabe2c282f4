//! Column schema of the ledger.
//!
//! The layout is the single source of truth shared by the header builder,
//! the header validator, the row appender and the sizer: leaf labels,
//! group membership, width bounds and where each column's value comes from.
//! Column ordinals are part of the file format; reordering them breaks
//! every ledger written before.

use crate::common::{Error, Result};
use crate::ledger::record::RecordField;

/// Row of the title banner.
pub const TITLE_ROW: u32 = 0;
/// Row of the two sub-banners.
pub const SUB_BANNER_ROW: u32 = 1;
/// Row of the group labels.
pub const GROUP_ROW: u32 = 2;
/// Row of the per-column leaf labels.
pub const LEAF_ROW: u32 = 3;
/// First data row, right below the header block.
pub const DATA_START_ROW: u32 = 4;

pub const TITLE_ROW_HEIGHT: f64 = 26.0;
pub const SUB_BANNER_ROW_HEIGHT: f64 = 18.0;
pub const GROUP_ROW_HEIGHT: f64 = 40.0;
pub const LEAF_ROW_HEIGHT: f64 = 28.0;

/// Where the value of a column comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// The running display index
    DisplayIndex,
    /// A field of the record
    Field(RecordField),
    /// The same text on every row
    Constant(String),
    /// Always empty (filled in by hand later)
    Blank,
}

/// One column of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// 0-based position
    pub ordinal: u32,
    /// Label on the leaf header row (or the merged label of a single column)
    pub leaf_label: String,
    /// Label of the multi-column group this column belongs to
    pub group: Option<String>,
    /// Minimum width in characters; 0 keeps whatever width the column has
    pub min_width: f64,
    /// Maximum width in characters
    pub max_width: f64,
    /// Whether a value parsing as a decimal is stored as a number
    pub numeric: bool,
    pub source: ColumnSource,
}

impl ColumnSpec {
    fn new(ordinal: u32, leaf_label: &str, min_width: f64, max_width: f64, source: ColumnSource) -> Self {
        Self {
            ordinal,
            leaf_label: leaf_label.to_string(),
            group: None,
            min_width,
            max_width,
            numeric: matches!(source, ColumnSource::DisplayIndex),
            source,
        }
    }

    fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    /// A column outside any group: its label is merged over both header rows.
    pub fn is_single(&self) -> bool {
        self.group.is_none()
    }
}

/// Title and the two sub-banners above the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub title: String,
    /// Label over columns `0..split`
    pub left_label: String,
    /// Label over columns `split..`
    pub right_label: String,
    /// First column of the right sub-banner
    pub split: u32,
}

/// A run of header columns sharing one label on the group row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnGroup<'a> {
    pub label: &'a str,
    pub first: u32,
    pub last: u32,
    /// Single column merged vertically over both header rows
    pub single: bool,
}

/// The anchor labels used to find the leaf header row of an existing ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderAnchor<'a> {
    /// Column holding both anchors
    pub column: u32,
    /// Leaf label expected on the leaf row
    pub leaf_label: &'a str,
    /// Group label expected on the row above it
    pub group_label: &'a str,
}

/// Ordered column definitions plus the banner.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    columns: Vec<ColumnSpec>,
    banner: Banner,
}

impl ColumnLayout {
    /// Build a layout from its parts, checking it with [`validate`](Self::validate).
    pub fn new(columns: Vec<ColumnSpec>, banner: Banner) -> Result<Self> {
        let layout = Self { columns, banner };
        layout.validate()?;
        Ok(layout)
    }

    /// The goods-exit register layout: 15 columns, title over all of them,
    /// "PREZENTATE LA IEȘIRE" over 0..=12 and "IEȘIRE EFECTIVĂ" over 13..=14.
    pub fn reference() -> Self {
        use ColumnSource::{Blank, Constant, DisplayIndex, Field};
        use RecordField::*;

        const DOCUMENTS: &str = "Documente însoțitoare";
        const PACKAGES: &str = "Colete";

        let columns = vec![
            ColumnSpec::new(0, "Nr. crt.", 0.0, 8.0, DisplayIndex),
            ColumnSpec::new(1, "Data", 12.0, 14.0, Field(DeclarationDate)),
            ColumnSpec::new(2, "Felul", 10.0, 12.0, Constant("SAD".to_string())).in_group(DOCUMENTS),
            ColumnSpec::new(3, "Numărul", 16.0, 20.0, Field(ReferenceNumber)).in_group(DOCUMENTS),
            ColumnSpec::new(4, "Data", 12.0, 14.0, Field(DeclarationDate)).in_group(DOCUMENTS),
            ColumnSpec::new(5, "De unde provine", 12.0, 14.0, Blank).in_group(DOCUMENTS),
            ColumnSpec::new(
                6,
                "Nr. identificare al mijlocului de transport sau numele navei, nr. aeronavei",
                26.0,
                26.0,
                Field(Identification),
            ),
            ColumnSpec::new(
                7,
                "Numele exportatorului / expeditorului",
                28.0,
                28.0,
                Field(ExporterName),
            ),
            ColumnSpec::new(8, "Felul", 10.0, 10.0, Blank).in_group(PACKAGES),
            ColumnSpec::new(9, "Buc.", 10.0, 10.0, Field(Quantity))
                .in_group(PACKAGES)
                .numeric(),
            ColumnSpec::new(10, "Mărci și numere", 12.0, 14.0, Blank).in_group(PACKAGES),
            ColumnSpec::new(11, "Greutate", 10.0, 10.0, Field(Weight)).numeric(),
            ColumnSpec::new(12, "Felul mărfurilor", 28.0, 36.0, Field(Description)),
            ColumnSpec::new(13, "Mențiuni speciale", 16.0, 18.0, Blank),
            ColumnSpec::new(14, "Data", 12.0, 14.0, Field(DeclarationDate)),
        ];

        let banner = Banner {
            title: "REGISTRU DE EVIDENȚĂ A MĂRFURILOR LA IEȘIRE".to_string(),
            left_label: "PREZENTATE LA IEȘIRE".to_string(),
            right_label: "IEȘIRE EFECTIVĂ".to_string(),
            split: 13,
        };

        Self { columns, banner }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, ordinal: u32) -> Option<&ColumnSpec> {
        self.columns.get(ordinal as usize)
    }

    /// Number of columns.
    pub fn len(&self) -> u32 {
        self.columns.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the last column.
    pub fn last_column(&self) -> u32 {
        self.len().saturating_sub(1)
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Header groups from left to right.
    pub fn groups(&self) -> Vec<ColumnGroup<'_>> {
        let mut groups: Vec<ColumnGroup<'_>> = Vec::new();
        for column in &self.columns {
            if let (Some(label), Some(last)) = (&column.group, groups.last_mut())
                && !last.single
                && last.label == label.as_str()
            {
                last.last = column.ordinal;
                continue;
            }

            let (label, single) = match &column.group {
                Some(label) => (label.as_str(), false),
                None => (column.leaf_label.as_str(), true),
            };
            groups.push(ColumnGroup {
                label,
                first: column.ordinal,
                last: column.ordinal,
                single,
            });
        }
        groups
    }

    /// Anchor used to find the leaf header row: the first grouped column.
    pub fn anchor(&self) -> Option<HeaderAnchor<'_>> {
        self.columns.iter().find_map(|column| {
            column.group.as_deref().map(|group_label| HeaderAnchor {
                column: column.ordinal,
                leaf_label: &column.leaf_label,
                group_label,
            })
        })
    }

    /// Check the layout for internal consistency.
    ///
    /// Ordinals must be contiguous from 0, width bounds ordered, each group
    /// a single contiguous run, the banner split strictly inside the
    /// columns, and at least one grouped column must exist to anchor the
    /// header lookup.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidLayout("layout has no columns".to_string()));
        }

        for (index, column) in self.columns.iter().enumerate() {
            if column.ordinal as usize != index {
                return Err(Error::InvalidLayout(format!(
                    "column '{}' has ordinal {} at position {}",
                    column.leaf_label, column.ordinal, index
                )));
            }
            if column.min_width < 0.0 || column.min_width > column.max_width {
                return Err(Error::InvalidLayout(format!(
                    "column {} has width bounds {}..{}",
                    column.ordinal, column.min_width, column.max_width
                )));
            }
            if column.leaf_label.trim().is_empty() {
                return Err(Error::InvalidLayout(format!(
                    "column {} has no label",
                    column.ordinal
                )));
            }
        }

        let groups = self.groups();
        for (index, group) in groups.iter().enumerate().filter(|(_, g)| !g.single) {
            if groups[index + 1..]
                .iter()
                .any(|later| !later.single && later.label == group.label)
            {
                return Err(Error::InvalidLayout(format!(
                    "group '{}' is split into non-adjacent columns",
                    group.label
                )));
            }
        }

        if self.banner.split == 0 || self.banner.split > self.last_column() {
            return Err(Error::InvalidLayout(format!(
                "banner split {} must fall inside columns 1..={}",
                self.banner.split,
                self.last_column()
            )));
        }

        if self.anchor().is_none() {
            return Err(Error::InvalidLayout(
                "layout needs a grouped column to anchor the header".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_layout_is_valid() {
        let layout = ColumnLayout::reference();
        layout.validate().unwrap();
        assert_eq!(layout.len(), 15);
        assert_eq!(layout.banner().split, 13);
    }

    #[test]
    fn reference_groups() {
        let layout = ColumnLayout::reference();
        let groups = layout.groups();

        let spans: Vec<(u32, u32, bool)> = groups.iter().map(|g| (g.first, g.last, g.single)).collect();
        assert_eq!(
            spans,
            vec![
                (0, 0, true),
                (1, 1, true),
                (2, 5, false),
                (6, 6, true),
                (7, 7, true),
                (8, 10, false),
                (11, 11, true),
                (12, 12, true),
                (13, 13, true),
                (14, 14, true),
            ]
        );
        assert_eq!(groups[2].label, "Documente însoțitoare");
        assert_eq!(groups[5].label, "Colete");
    }

    #[test]
    fn anchor_is_first_grouped_column() {
        let layout = ColumnLayout::reference();
        let anchor = layout.anchor().unwrap();
        assert_eq!(anchor.column, 2);
        assert_eq!(anchor.leaf_label, "Felul");
        assert_eq!(anchor.group_label, "Documente însoțitoare");
    }

    #[test]
    fn numeric_columns() {
        let layout = ColumnLayout::reference();
        let numeric: Vec<u32> = layout
            .columns()
            .iter()
            .filter(|c| c.numeric)
            .map(|c| c.ordinal)
            .collect();
        assert_eq!(numeric, vec![0, 9, 11]);
    }

    #[test]
    fn rejects_split_group() {
        let mut columns = ColumnLayout::reference().columns().to_vec();
        columns[8].group = Some("Documente însoțitoare".to_string());
        columns[9].group = None;
        columns[10].group = None;
        let banner = ColumnLayout::reference().banner().clone();

        let err = ColumnLayout::new(columns, banner).unwrap_err();
        assert!(err.to_string().contains("non-adjacent"));
    }

    #[test]
    fn rejects_bad_widths_and_ordinals() {
        let reference = ColumnLayout::reference();

        let mut columns = reference.columns().to_vec();
        columns[3].min_width = 30.0;
        assert!(ColumnLayout::new(columns, reference.banner().clone()).is_err());

        let mut columns = reference.columns().to_vec();
        columns.swap(4, 5);
        assert!(ColumnLayout::new(columns, reference.banner().clone()).is_err());

        let mut banner = reference.banner().clone();
        banner.split = 15;
        assert!(ColumnLayout::new(reference.columns().to_vec(), banner).is_err());
    }
}
