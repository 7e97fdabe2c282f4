//! Common types and utilities shared by the format layer and the ledger.

// Submodule declarations
pub mod error;
pub mod logging;
pub mod number;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};
pub use logging::init_tracing;
pub use number::parse_decimal;
