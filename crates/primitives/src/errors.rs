//! Errors during parsing/handling/conversion of primitives.

use thiserror::Error;

/// Parsing errors that can occur with fixed-width buffers and other primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The provided text is not valid hex.
    #[error("supplied value is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The provided bytes do not have the expected length.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Length required by the target type.
        expected: usize,

        /// Length that was supplied.
        actual: usize,
    },
}
