//! Custom error types for the mat-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum MatError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly on an element boundary.
    ///
    /// The raw element read loop absorbs this; it only surfaces when an
    /// element decoder is driven directly.
    #[error("End of stream")]
    EndOfStream,

    /// The 128-byte file header is missing or unreadable.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The header declares a version other than 0x0100.
    #[error("Unsupported MAT file version: {0:#06x}. Only Level 5 (0x0100) is supported.")]
    UnsupportedVersion(u16),

    /// A data element is truncated, carries an unknown type, or is otherwise corrupt.
    #[error("Malformed element: {0}")]
    MalformedElement(String),

    /// A compressed element could not be inflated.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// A structure array was queried for a field it does not have.
    #[error("Field not found: '{0}'")]
    FieldNotFound(String),

    /// A coordinate or flattened index lies outside the array.
    #[error("Index {index} out of bounds (bound {bound})")]
    IndexOutOfBounds { index: usize, bound: usize },

    /// Field sequences handed to a structure array disagree with its dimensions.
    #[error("Invalid structure: field '{field}' has {found} values, expected {expected}")]
    InvalidStructure {
        field: String,
        expected: usize,
        found: usize,
    },

    /// The operation is not available on this type.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl MatError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedElement(message.into())
    }
}

/// A convenience `Result` type alias using the crate's `MatError` type.
pub type Result<T> = std::result::Result<T, MatError>;
