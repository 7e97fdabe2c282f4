//! Interpretation of the extractor's output.
//!
//! The extractor prints one JSON array per run. Each element is either a
//! record (`{"file": .., "dataDeclaratie": .., ..}`) or an error marker
//! (`{"file": .., "error": ..}`). Records reach the ledger only after the
//! markers and empty items have been filtered out here.

use serde_json::Value;
use tracing::{info, warn};

use crate::common::{Error, Result};
use crate::ledger::record::Record;

const UNKNOWN_FILE: &str = "<unknown>";

/// One element of the extractor output.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorItem {
    Record { file: String, record: Record },
    Failed { file: String, error: String },
}

impl ExtractorItem {
    pub fn file(&self) -> &str {
        match self {
            ExtractorItem::Record { file, .. } | ExtractorItem::Failed { file, .. } => file,
        }
    }
}

/// An item left out of the batch, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub file: String,
    pub reason: String,
}

/// Parse the extractor's stdout.
///
/// The output must be a JSON array; anything else fails with
/// [`Error::Extractor`]. Elements that are not objects become
/// [`ExtractorItem::Failed`].
pub fn parse_extractor_output(json: &str) -> Result<Vec<ExtractorItem>> {
    let trimmed = json.trim();
    if !trimmed.starts_with('[') {
        let preview: String = trimmed.lines().take(3).collect::<Vec<_>>().join(" ");
        return Err(Error::Extractor(format!(
            "expected a JSON array, output was: {}",
            preview
        )));
    }

    let Value::Array(nodes) = serde_json::from_str::<Value>(trimmed)? else {
        return Err(Error::Extractor("expected a JSON array".to_string()));
    };

    nodes.into_iter().map(parse_item).collect()
}

fn parse_item(node: Value) -> Result<ExtractorItem> {
    let file = node
        .get("file")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_FILE)
        .to_string();

    if !node.is_object() {
        return Ok(ExtractorItem::Failed {
            file,
            error: format!("unexpected item {}", node),
        });
    }

    if let Some(error) = node.get("error").filter(|e| !e.is_null()) {
        let error = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(ExtractorItem::Failed { file, error });
    }

    match serde_json::from_value::<Record>(node) {
        Ok(record) => Ok(ExtractorItem::Record { file, record }),
        Err(e) => Ok(ExtractorItem::Failed {
            file,
            error: e.to_string(),
        }),
    }
}

/// Split parsed items into the records to append and the items skipped.
///
/// Error markers and records without any expected field are skipped and
/// logged; record order is preserved.
pub fn split_batch(items: Vec<ExtractorItem>) -> (Vec<Record>, Vec<SkippedItem>) {
    let mut records = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for item in items {
        match item {
            ExtractorItem::Failed { file, error } => {
                warn!(file = %file, error = %error, "extractor reported a failure");
                skipped.push(SkippedItem { file, reason: error });
            },
            ExtractorItem::Record { file, record } if !record.has_data() => {
                warn!(file = %file, "record has none of the expected fields");
                skipped.push(SkippedItem {
                    file,
                    reason: "wrong structure".to_string(),
                });
            },
            ExtractorItem::Record { file, record } => {
                info!(
                    file = %file,
                    mrn = record.reference_number.as_deref().unwrap_or_default(),
                    "parsed record"
                );
                records.push(record);
            },
        }
    }

    info!(records = records.len(), skipped = skipped.len(), "extractor batch split");
    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = r#"[
        {"file": "1.pdf", "nrMrn": "MRN1", "buc": "3"},
        {"file": "2.pdf", "error": "no text layer"},
        {"file": "3.pdf", "unrelated": true},
        {"file": "4.pdf", "nrMrn": "MRN4", "greutate": 12.5},
        42
    ]"#;

    #[test]
    fn parses_records_and_markers() {
        let items = parse_extractor_output(OUTPUT).unwrap();
        assert_eq!(items.len(), 5);
        assert!(matches!(&items[0], ExtractorItem::Record { file, .. } if file == "1.pdf"));
        assert_eq!(
            items[1],
            ExtractorItem::Failed {
                file: "2.pdf".to_string(),
                error: "no text layer".to_string()
            }
        );
        assert_eq!(items[4].file(), UNKNOWN_FILE);
    }

    #[test]
    fn split_keeps_order_and_drops_unusable_items() {
        let (records, skipped) = split_batch(parse_extractor_output(OUTPUT).unwrap());

        let mrns: Vec<_> = records.iter().map(|r| r.reference_number.as_deref()).collect();
        assert_eq!(mrns, vec![Some("MRN1"), Some("MRN4")]);
        assert_eq!(records[1].weight.as_deref(), Some("12.5"));

        let files: Vec<_> = skipped.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, vec!["2.pdf", "3.pdf", UNKNOWN_FILE]);
        assert_eq!(skipped[1].reason, "wrong structure");
    }

    #[test]
    fn rejects_non_array_output() {
        let err = parse_extractor_output("Traceback (most recent call last):").unwrap_err();
        assert!(matches!(err, Error::Extractor(_)));
        assert!(parse_extractor_output(r#"{"file": "1.pdf"}"#).is_err());
        assert!(parse_extractor_output("[{").is_err());
    }
}
