//! XML helpers shared by the part writers and parsers.

pub mod escape;
pub mod reader;

pub use escape::{encode_ooxml_escapes, escape_xml, needs_space_preserve};
pub use reader::{decode_ooxml_escapes, push_reference, read_text};
