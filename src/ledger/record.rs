//! Input records, one per source document.

use serde::{Deserialize, Deserializer, Serialize};

/// A named field of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    DeclarationDate,
    ReferenceNumber,
    Identification,
    ExporterName,
    Quantity,
    Weight,
    Description,
}

impl RecordField {
    pub const ALL: [RecordField; 7] = [
        RecordField::DeclarationDate,
        RecordField::ReferenceNumber,
        RecordField::Identification,
        RecordField::ExporterName,
        RecordField::Quantity,
        RecordField::Weight,
        RecordField::Description,
    ];

    /// Key of the field in the extractor's JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            RecordField::DeclarationDate => "dataDeclaratie",
            RecordField::ReferenceNumber => "nrMrn",
            RecordField::Identification => "identificare",
            RecordField::ExporterName => "numeExportator",
            RecordField::Quantity => "buc",
            RecordField::Weight => "greutate",
            RecordField::Description => "descriereaMarfurilor",
        }
    }
}

/// One normalized record. Every field is optional text.
///
/// Unknown keys in the input are ignored. Numbers and booleans are
/// accepted where text is expected and kept in their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "dataDeclaratie", deserialize_with = "lenient_text")]
    pub declaration_date: Option<String>,
    #[serde(rename = "nrMrn", deserialize_with = "lenient_text")]
    pub reference_number: Option<String>,
    #[serde(rename = "identificare", deserialize_with = "lenient_text")]
    pub identification: Option<String>,
    #[serde(rename = "numeExportator", deserialize_with = "lenient_text")]
    pub exporter_name: Option<String>,
    #[serde(rename = "buc", deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
    #[serde(rename = "greutate", deserialize_with = "lenient_text")]
    pub weight: Option<String>,
    #[serde(rename = "descriereaMarfurilor", deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style.
    pub fn with(mut self, field: RecordField, value: impl Into<String>) -> Self {
        *self.slot(field) = Some(value.into());
        self
    }

    pub fn get(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::DeclarationDate => self.declaration_date.as_deref(),
            RecordField::ReferenceNumber => self.reference_number.as_deref(),
            RecordField::Identification => self.identification.as_deref(),
            RecordField::ExporterName => self.exporter_name.as_deref(),
            RecordField::Quantity => self.quantity.as_deref(),
            RecordField::Weight => self.weight.as_deref(),
            RecordField::Description => self.description.as_deref(),
        }
    }

    /// Whether at least one field is present.
    pub fn has_data(&self) -> bool {
        RecordField::ALL.iter().any(|field| self.get(*field).is_some())
    }

    fn slot(&mut self, field: RecordField) -> &mut Option<String> {
        match field {
            RecordField::DeclarationDate => &mut self.declaration_date,
            RecordField::ReferenceNumber => &mut self.reference_number,
            RecordField::Identification => &mut self.identification,
            RecordField::ExporterName => &mut self.exporter_name,
            RecordField::Quantity => &mut self.quantity,
            RecordField::Weight => &mut self.weight,
            RecordField::Description => &mut self.description,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientText {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LenientText>::deserialize(deserializer)?.map(|value| match value {
        LenientText::Text(s) => s,
        LenientText::Int(i) => i.to_string(),
        LenientText::Float(f) => f.to_string(),
        LenientText::Bool(b) => b.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_extractor_keys() {
        let json = r#"{
            "file": "01.pdf",
            "dataDeclaratie": "12.03.2024",
            "nrMrn": "24RO1234567890ABC1",
            "identificare": "B-123-XYZ",
            "numeExportator": "SC Exemplu SRL",
            "buc": 4,
            "greutate": "12,5",
            "descriereaMarfurilor": null,
            "confidence": 0.93
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.declaration_date.as_deref(), Some("12.03.2024"));
        assert_eq!(record.get(RecordField::ReferenceNumber), Some("24RO1234567890ABC1"));
        assert_eq!(record.quantity.as_deref(), Some("4"));
        assert_eq!(record.weight.as_deref(), Some("12,5"));
        assert_eq!(record.description, None);
        assert!(record.has_data());
    }

    #[test]
    fn builder_and_empty_record() {
        assert!(!Record::new().has_data());
        let record = Record::new().with(RecordField::Weight, "N/A");
        assert_eq!(record.get(RecordField::Weight), Some("N/A"));
        assert!(record.has_data());
    }

    #[test]
    fn keys_match_serde_names() {
        for field in RecordField::ALL {
            let record = Record::new().with(field, "x");
            let value = serde_json::to_value(&record).unwrap();
            assert_eq!(value[field.key()], "x");
        }
    }
}
