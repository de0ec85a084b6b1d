use bitcoin::{
    absolute::LockTime,
    hashes::{sha256d, Hash},
    key::{rand, Keypair, Secp256k1},
    transaction::Version,
    Address, Amount, Network, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use stakebridge_primitives::l1::Utxo;

use crate::ArbitraryGenerator;

/// Generates a fresh taproot address on `network` controlled by a random key.
pub fn test_address(network: Network) -> Address {
    let secp = Secp256k1::new();
    let keypair = Keypair::new(&secp, &mut rand::thread_rng());
    let (x_only_public_key, _) = keypair.x_only_public_key();

    Address::p2tr(&secp, x_only_public_key, None, network)
}

/// Creates a deterministic txid from a seed so that tests can tell UTXOs apart.
pub fn test_txid(seed: u8) -> Txid {
    Txid::from_raw_hash(sha256d::Hash::hash(&[seed; 32]))
}

/// Generates a UTXO holding `value` sats with an arbitrary outpoint and P2WSH script.
pub fn generate_utxo(value: u64) -> Utxo {
    let mut utxo: Utxo = ArbitraryGenerator::new_with_size(256).generate();
    utxo.value = Amount::from_sat(value);

    utxo
}

/// Generates one UTXO per entry of `values`, each with a distinct outpoint.
pub fn generate_utxos(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let mut utxo = generate_utxo(*value);
            utxo.txid = test_txid(i as u8);
            utxo.vout = i as u32;
            utxo
        })
        .collect()
}

/// Creates a transaction paying `amount` to `script_pubkey` in its only output, from an
/// arbitrary previous output.
pub fn create_test_locking_tx(amount: Amount, script_pubkey: ScriptBuf) -> Transaction {
    let inputs = vec![TxIn {
        previous_output: OutPoint::new(test_txid(0xff), 0),
        script_sig: ScriptBuf::default(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness: Witness::new(),
    }];

    let outputs = vec![TxOut {
        value: amount,
        script_pubkey,
    }];

    Transaction {
        version: Version(2),
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    }
}
