//! Writer side of the xlsx layer: style and string tables, worksheet parts
//! and the package itself.

pub mod sheet;
pub mod strings;
pub mod styles;
pub mod workbook;

pub use sheet::{CellStyleMap, worksheet_to_xml};
pub use strings::MutableSharedStrings;
pub use styles::StylesBuilder;
pub use workbook::{build_styles, generate_workbook_xml, write_package};
