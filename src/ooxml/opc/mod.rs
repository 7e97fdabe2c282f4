//! Open Packaging Conventions (OPC) support for the spreadsheet package.
//!
//! An `.xlsx` file is a ZIP archive of XML parts tied together by
//! relationship files. This module provides the constants, the `.rels`
//! model and the physical reader/writer the xlsx layer is built on.

pub mod constants;
pub mod package;
pub mod rel;

pub use package::{PackageReader, PackageWriter};
pub use rel::{Relationship, Relationships, resolve_target};
