//! Bitcoin-side types handed to and returned from the transaction builders.

use arbitrary::{Arbitrary, Unstructured};
use bitcoin::{
    hashes::Hash, Amount, OutPoint, Psbt, ScriptBuf, Transaction, TxOut, Txid, WScriptHash,
};
use serde::{Deserialize, Serialize};

/// An unspent output from the caller's wallet view.
///
/// The `txid` is displayed and (de)serialized in the usual reversed-hex convention.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    /// Id of the transaction that created the output.
    pub txid: Txid,

    /// Index of the output in that transaction.
    pub vout: u32,

    /// Value of the output.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,

    /// Locking script of the output.
    pub script_pubkey: ScriptBuf,
}

impl Utxo {
    /// Creates a new [`Utxo`].
    pub fn new(txid: Txid, vout: u32, value: Amount, script_pubkey: ScriptBuf) -> Self {
        Self {
            txid,
            vout,
            value,
            script_pubkey,
        }
    }

    /// Builds the [`Utxo`] for output `vout` of `tx`, if it exists.
    pub fn from_tx_output(tx: &Transaction, vout: u32) -> Option<Self> {
        let txout = tx.output.get(vout as usize)?;

        Some(Self {
            txid: tx.compute_txid(),
            vout,
            value: txout.value,
            script_pubkey: txout.script_pubkey.clone(),
        })
    }

    /// The [`OutPoint`] referencing this output.
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    /// The output itself, as needed for `witness_utxo` in a PSBT input.
    pub fn txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

impl<'a> Arbitrary<'a> for Utxo {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let txid = Txid::from_byte_array(u.arbitrary()?);
        let vout = u.int_in_range(0..=u32::MAX)?;
        let value = Amount::from_sat(u.int_in_range(0..=Amount::MAX_MONEY.to_sat())?);

        // a P2WSH output over some arbitrary witness script hash
        let script_pubkey = ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array(u.arbitrary()?));

        Ok(Self {
            txid,
            vout,
            value,
            script_pubkey,
        })
    }
}

/// A partially signed transaction produced by the builders and handed to an external signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinPsbt(Psbt);

impl BitcoinPsbt {
    /// Get a reference to the underlying [`Psbt`].
    pub fn inner(&self) -> &Psbt {
        &self.0
    }

    /// The unsigned transaction inside the PSBT.
    pub fn unsigned_tx(&self) -> &Transaction {
        &self.0.unsigned_tx
    }

    /// Computes the id of the transaction once signed (witness data does not change it).
    pub fn compute_txid(&self) -> Txid {
        self.0.unsigned_tx.compute_txid()
    }
}

impl From<Psbt> for BitcoinPsbt {
    fn from(value: Psbt) -> Self {
        Self(value)
    }
}

impl From<BitcoinPsbt> for Psbt {
    fn from(value: BitcoinPsbt) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{absolute::LockTime, transaction::Version};

    use super::*;

    #[test]
    fn test_utxo_from_json() {
        let json = r#"{
            "txid": "4cfbec13cf1510545f285cceceb6229bd7b6a918a8f6eba1dbee64d26226a3b7",
            "vout": 1,
            "value": 200000,
            "script_pubkey": "0014751e76e8199196d454941c45d1b3a323f1433bd6"
        }"#;

        let utxo: Utxo = serde_json::from_str(json).expect("should parse utxo");

        assert_eq!(utxo.vout, 1);
        assert_eq!(utxo.value, Amount::from_sat(200_000));
        assert_eq!(
            utxo.outpoint().txid.to_string(),
            "4cfbec13cf1510545f285cceceb6229bd7b6a918a8f6eba1dbee64d26226a3b7",
            "txid should keep its display byte order"
        );
        assert!(utxo.script_pubkey.is_p2wpkh());
    }

    #[test]
    fn test_utxo_from_tx_output() {
        let script_pubkey = ScriptBuf::new_p2wsh(&WScriptHash::all_zeros());
        let tx = Transaction {
            version: Version(2),
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![TxOut {
                value: Amount::from_sat(5_000),
                script_pubkey: script_pubkey.clone(),
            }],
        };

        let utxo = Utxo::from_tx_output(&tx, 0).expect("output 0 exists");
        assert_eq!(utxo.txid, tx.compute_txid());
        assert_eq!(utxo.txout(), tx.output[0]);

        assert!(Utxo::from_tx_output(&tx, 1).is_none());
    }
}
