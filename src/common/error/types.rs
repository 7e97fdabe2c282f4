use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the temporary sibling or replacing the target failed
    #[error("failed to commit ledger to {}: {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No leaf-header row could be located in the scanned rows
    #[error("header not found: no header anchor in the first {scanned_rows} rows")]
    HeaderNotFound { scanned_rows: u32 },

    /// The leaf-header row does not match the column layout
    #[error("Header mismatch at column {column}. Expected: '{expected}', Found: '{found}'.")]
    HeaderMismatch {
        /// 1-based column number
        column: u32,
        expected: String,
        found: String,
    },

    /// Existing ledger cannot be read as a spreadsheet
    #[error("existing ledger is unreadable or corrupted: {}: {reason}", path.display())]
    CorruptDocument { path: PathBuf, reason: String },

    /// XML parsing or generation error
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// Part missing from the package
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Display index must start at 1 or above
    #[error("invalid start index {0}: display indices start at 1")]
    InvalidStartIndex(i64),

    /// Column layout is internally inconsistent
    #[error("invalid column layout: {0}")]
    InvalidLayout(String),

    /// Options could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Extractor output could not be interpreted
    #[error("extractor output error: {0}")]
    Extractor(String),
}

/// Failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Creating, writing or replacing files failed
    IoFailure,
    /// Header anchor missing or a leaf label differs from the layout
    HeaderMismatch,
    /// The existing file is not a readable spreadsheet
    CorruptDocument,
    /// Caller supplied invalid input or configuration
    InvalidInput,
}

impl Error {
    /// Classify the error into one of the caller-facing categories.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Commit { .. } => ErrorKind::IoFailure,
            Error::HeaderNotFound { .. } | Error::HeaderMismatch { .. } => {
                ErrorKind::HeaderMismatch
            },
            Error::CorruptDocument { .. }
            | Error::Xml(_)
            | Error::Zip(_)
            | Error::PartNotFound(_) => ErrorKind::CorruptDocument,
            Error::InvalidStartIndex(_)
            | Error::InvalidLayout(_)
            | Error::Config(_)
            | Error::Extractor(_) => ErrorKind::InvalidInput,
        }
    }

    /// Whether the ledger header failed validation.
    pub fn is_header_mismatch(&self) -> bool {
        self.kind() == ErrorKind::HeaderMismatch
    }

    /// Wrap a failure while decoding the bytes of `path` as a corrupt-document error.
    ///
    /// Only used once the file has been read into memory, so an IO error at
    /// this point comes from a truncated archive rather than the disk.
    pub(crate) fn into_corrupt(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::CorruptDocument { .. } => self,
            other => Error::CorruptDocument {
                path: path.into(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;
