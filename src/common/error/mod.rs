//! Unified error types for the ledger engine.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! line up with the three fatal failure categories a caller has to handle
//! (I/O, header mismatch, corrupt document) plus the low-level format
//! errors that are folded into those categories while loading.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, ErrorKind, Result};
