//! Build staking bridge scripts and transactions.
//!
//! Handles creation of bitcoin scripts and PSBTs via `bitcoin-rs`. Provides high-level APIs to
//! get the deposit and staking scripts of the protocol, and the transactions that lock funds under
//! them and later release or recapture those funds. Nothing here signs or broadcasts; the PSBTs
//! are handed to an external signer.

use bitcoin::Amount;
use context::BuildContext;
use errors::BridgeTxBuilderResult;
use stakebridge_primitives::l1::{BitcoinPsbt, Utxo};

pub mod constants;
pub mod context;
pub mod errors;
pub mod fees;
pub mod locking;
pub mod operations;
pub mod prelude;
pub mod release;
pub mod scripts;
pub mod selection;

/// Trait for any (staking) transaction.
///
/// This is implemented by any struct that contains the information required to create one of the
/// protocol's transactions.
pub trait TxKind {
    /// Construct the PSBT for this transaction along with the fee it pays and the outputs it
    /// spends.
    fn construct_signing_data<C: BuildContext>(
        &self,
        build_context: &C,
    ) -> BridgeTxBuilderResult<TxSigningData>;
}

/// The output of the transaction builders: everything an external signer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TxSigningData {
    /// The PSBT, with `witness_utxo` (and `witness_script` where relevant) set on every input.
    pub psbt: BitcoinPsbt,

    /// The fee the transaction was built for.
    pub fee: Amount,

    /// The outputs being spent, in input order.
    pub spent_utxos: Vec<Utxo>,
}
