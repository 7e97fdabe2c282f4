//! Office Open XML (OOXML) support, limited to what the ledger needs.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): ZIP package access, content types and relationships
//! 2. **Metadata** (`metadata`): core and extended document properties
//! 3. **Spreadsheet** (`xlsx`): workbook model, part parsers and writers

pub mod metadata;
pub mod opc;
pub mod xlsx;

pub use metadata::DocumentProperties;
pub use xlsx::XlsxDocument;
