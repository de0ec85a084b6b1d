//! Provides some common, standalone utilities and wrappers over [`bitcoin`](bitcoin) to create
//! addresses, transactions and PSBTs.

use bitcoin::{
    absolute::LockTime, transaction, Address, Amount, Network, OutPoint, Psbt, Script, ScriptBuf,
    Sequence, Transaction, TxIn, TxOut, Witness,
};
use stakebridge_primitives::l1::{BitcoinPsbt, Utxo};

use crate::errors::BridgeTxBuilderResult;

/// Create the pay-to-witness-script-hash address that locks funds under `script`.
pub fn locking_address(script: &Script, network: Network) -> Address {
    Address::p2wsh(script, network)
}

/// Create a bitcoin [`Transaction`] for the given transaction inputs and outputs.
pub fn create_tx(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>, lock_time: LockTime) -> Transaction {
    Transaction {
        version: transaction::Version(2),
        lock_time,
        input: tx_ins,
        output: tx_outs,
    }
}

/// Create a list of [`TxIn`]'s from given [`OutPoint`]'s.
///
/// This wraps the [`OutPoint`] in a structure that includes a blank `witness`, a blank
/// `script_sig` and the given `sequence`.
pub fn create_tx_ins(utxos: impl IntoIterator<Item = OutPoint>, sequence: Sequence) -> Vec<TxIn> {
    let mut tx_ins = Vec::new();

    for utxo in utxos {
        tx_ins.push(TxIn {
            previous_output: utxo,
            sequence,
            script_sig: ScriptBuf::default(),
            witness: Witness::new(),
        });
    }

    tx_ins
}

/// Create a list of [`TxOut`]'s' based on pairs of scripts and corresponding amounts.
pub fn create_tx_outs(
    scripts_and_amounts: impl IntoIterator<Item = (ScriptBuf, Amount)>,
) -> Vec<TxOut> {
    let mut tx_outs: Vec<TxOut> = Vec::new();

    for (script, amount) in scripts_and_amounts {
        tx_outs.push(TxOut {
            script_pubkey: script,
            value: amount,
        })
    }

    tx_outs
}

/// Wrap `unsigned_tx` in a PSBT whose inputs carry the outputs they spend.
///
/// `prevouts` must line up with the transaction's inputs. If `witness_script` is given, it is
/// attached to every input, as needed to spend outputs locked under it.
pub fn create_psbt(
    unsigned_tx: Transaction,
    prevouts: &[Utxo],
    witness_script: Option<&ScriptBuf>,
) -> BridgeTxBuilderResult<BitcoinPsbt> {
    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)?;

    for (input, prevout) in psbt.inputs.iter_mut().zip(prevouts) {
        input.witness_utxo = Some(prevout.txout());
        input.witness_script = witness_script.cloned();
    }

    Ok(BitcoinPsbt::from(psbt))
}
