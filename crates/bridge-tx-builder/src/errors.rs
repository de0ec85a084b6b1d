//! Enumerated errors related to building staking scripts and transactions.

use bitcoin::{psbt, Amount, ScriptBuf};
use stakebridge_primitives::{buf::Buf20, errors::ParseError};
use thiserror::Error;

/// Error during building of staking scripts and transactions.
#[derive(Debug, Error)]
pub enum BridgeTxBuilderError {
    /// The inputs are malformed or out of range.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No subset of the available UTXOs covers the amount and its fee.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(#[from] InsufficientFundsError),

    /// The fee for the selected inputs could not be determined.
    #[error("could not determine the transaction fee")]
    FeeCalculation,

    /// The lock height is at or above the cutoff where consensus reads locktimes as timestamps.
    #[error("lock height {0} is not a block height (must be below 500000000)")]
    InvalidLocktime(u32),

    /// Error building a release or recapture transaction.
    #[error("could not build release transaction: {0}")]
    ReleaseTransaction(#[from] ReleaseTransactionError),

    /// Error while wrapping the unsigned transaction into a PSBT.
    #[error("could not create psbt: {0}")]
    Psbt(#[from] psbt::Error),
}

/// Result type alias that has [`BridgeTxBuilderError`] as the error type for succinctness.
pub type BridgeTxBuilderResult<T> = Result<T, BridgeTxBuilderError>;

/// Malformed or out-of-range inputs.
///
/// The variants fall into the categories callers match on: invalid input types
/// ([`ValidationError::InvalidType`]), invalid input lengths
/// ([`ValidationError::InvalidEvmAddressLength`], [`ValidationError::InvalidLength`]) and
/// invalid numeric inputs (everything else).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The input could not be read as bytes, e.g. text that is not hex.
    #[error("invalid input types: {0}")]
    InvalidType(String),

    /// The EVM address is not 20 bytes long.
    #[error("invalid EVM address length: {0} != 20")]
    InvalidEvmAddressLength(usize),

    /// A fixed-width input has the wrong length.
    #[error("invalid input lengths: {field} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Name of the offending input.
        field: &'static str,

        /// Required length.
        expected: usize,

        /// Supplied length.
        actual: usize,
    },

    /// A numeric input does not fit the range the protocol allows.
    #[error("invalid numeric inputs: {field} = {value} exceeds {max}")]
    NumericOutOfRange {
        /// Name of the offending input.
        field: &'static str,

        /// Supplied value.
        value: u64,

        /// Largest allowed value.
        max: u64,
    },

    /// The amount to lock is zero.
    #[error("invalid numeric inputs: amount must be greater than zero")]
    ZeroAmount,

    /// The fee rate is zero.
    #[error("invalid numeric inputs: fee rate must be greater than zero")]
    ZeroFeeRate,

    /// The fee for a release is zero or would consume the whole locked output.
    #[error("invalid numeric inputs: fee {fee} must be positive and below the output value {output_value}")]
    InvalidMinimumFee {
        /// Requested fee.
        fee: Amount,

        /// Value of the output being spent.
        output_value: Amount,
    },

    /// The prior transaction has no output at the requested index.
    #[error("invalid numeric inputs: output index {index} out of range ({num_outputs} outputs)")]
    OutputIndexOutOfRange {
        /// Requested index.
        index: u32,

        /// Number of outputs in the prior transaction.
        num_outputs: usize,
    },

    /// Summing the amounts overflowed.
    #[error("invalid numeric inputs: amount overflow")]
    AmountOverflow,
}

impl ValidationError {
    /// Maps a buffer parse failure for `field` onto the matching category.
    ///
    /// Length failures against a 20-byte buffer are EVM address length failures.
    pub fn from_parse_error(field: &'static str, err: ParseError) -> Self {
        match err {
            ParseError::InvalidHex(e) => Self::InvalidType(format!("{field}: {e}")),
            ParseError::InvalidLength { expected, actual } if expected == Buf20::LEN => {
                Self::InvalidEvmAddressLength(actual)
            }
            ParseError::InvalidLength { expected, actual } => Self::InvalidLength {
                field,
                expected,
                actual,
            },
        }
    }
}

/// No subset of the available UTXOs covers the amount and its fee.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsufficientFundsError {
    /// The caller supplied no UTXOs at all.
    #[error("no UTXOs available")]
    NoUtxos,

    /// Every UTXO was selected and the total still falls short.
    #[error("unable to gather enough UTXOs (need {required}, have {available})")]
    NotEnoughUtxos {
        /// Amount plus the fee for spending every UTXO.
        required: Amount,

        /// Sum of all the UTXOs.
        available: Amount,
    },
}

/// Error building a release or recapture transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseTransactionError {
    /// The output being spent does not pay to the witness script hash of the given script.
    #[error("output does not pay to the given script (expected {expected:?}, found {found:?})")]
    ScriptMismatch {
        /// `script_pubkey` derived from the script.
        expected: ScriptBuf,

        /// `script_pubkey` of the output.
        found: ScriptBuf,
    },

    /// The relative lock of an owner spend is shorter than the one the script enforces, or the
    /// script has no owner branch at all.
    #[error("relative lock of {requested} blocks does not satisfy the script (enforces {committed:?})")]
    TimeLockMismatch {
        /// Lock the script's owner branch checks, if it has one.
        committed: Option<u16>,

        /// Lock the spend was asked to carry.
        requested: u16,
    },
}
