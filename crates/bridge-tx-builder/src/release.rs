//! Builders related to spending a locked output: the release by validator and delegator, and the
//! recapture by the owner once the transfer time lock has passed.

use std::slice;

use bitcoin::{absolute::LockTime, Address, Amount, ScriptBuf, Sequence, Transaction};
use serde::{Deserialize, Serialize};
use stakebridge_primitives::l1::Utxo;
use tracing::{debug, warn};

use crate::{
    context::BuildContext,
    errors::{BridgeTxBuilderResult, ReleaseTransactionError, ValidationError},
    operations::{create_psbt, create_tx, create_tx_ins, create_tx_outs},
    scripts::committed_transfer_time_lock,
    TxKind, TxSigningData,
};

/// The branch of the staking script a release spends through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendPath {
    /// Validator and delegator sign together; no time gate applies.
    Validator,

    /// The owner signs alone after `transfer_time_lock` blocks.
    Owner {
        /// Relative lock in blocks, as committed to in the staking script.
        transfer_time_lock: u16,
    },
}

impl SpendPath {
    /// The `nSequence` the input needs for this branch to be spendable.
    pub fn sequence(&self) -> Sequence {
        match self {
            Self::Validator => Sequence::ENABLE_RBF_NO_LOCKTIME,
            Self::Owner { transfer_time_lock } => Sequence::from_height(*transfer_time_lock),
        }
    }
}

/// The information required to spend a locked output back out to a destination.
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    /// The script the output was locked under.
    script: ScriptBuf,

    /// The transaction that created the locked output.
    prior_locking_tx: Transaction,

    /// Where the released funds go.
    destination: Address,

    /// The fee to pay, deducted from the locked value.
    minimum_fee: Amount,

    /// Index of the locked output in `prior_locking_tx`.
    output_index: u32,

    /// Which branch of the script is used.
    spend_path: SpendPath,
}

impl TxKind for ReleaseInfo {
    fn construct_signing_data<C: BuildContext>(
        &self,
        build_context: &C,
    ) -> BridgeTxBuilderResult<TxSigningData> {
        let prevout = self.locked_output()?;
        self.check_spend_path()?;

        let net_value = prevout
            .value
            .checked_sub(self.minimum_fee)
            .ok_or(ValidationError::InvalidMinimumFee {
                fee: self.minimum_fee,
                output_value: prevout.value,
            })?;

        if net_value <= build_context.dust_limit() {
            warn!(%net_value, dust_limit = %build_context.dust_limit(), "release output is dust");
        }

        let tx_ins = create_tx_ins([prevout.outpoint()], self.spend_path.sequence());
        let tx_outs = create_tx_outs([(self.destination.script_pubkey(), net_value)]);
        let unsigned_tx = create_tx(tx_ins, tx_outs, LockTime::ZERO);

        let psbt = create_psbt(unsigned_tx, slice::from_ref(&prevout), Some(&self.script))?;

        debug!(
            txid = %psbt.compute_txid(),
            spent = %prevout.outpoint(),
            spend_path = ?self.spend_path,
            network = %build_context.network(),
            fee = %self.minimum_fee,
            "built release transaction"
        );

        Ok(TxSigningData {
            psbt,
            fee: self.minimum_fee,
            spent_utxos: vec![prevout],
        })
    }
}

impl ReleaseInfo {
    /// Create a new release info that spends through the validator and delegator multisig.
    pub fn new(
        script: ScriptBuf,
        prior_locking_tx: Transaction,
        destination: Address,
        minimum_fee: Amount,
        output_index: u32,
    ) -> Self {
        Self {
            script,
            prior_locking_tx,
            destination,
            minimum_fee,
            output_index,
            spend_path: SpendPath::Validator,
        }
    }

    /// Switch to the given spend path.
    pub fn with_spend_path(mut self, spend_path: SpendPath) -> Self {
        self.spend_path = spend_path;
        self
    }

    /// Get the spend path.
    pub fn spend_path(&self) -> SpendPath {
        self.spend_path
    }

    /// Get the output being spent, after checking that it exists, pays to `script` and can cover
    /// the fee.
    fn locked_output(&self) -> BridgeTxBuilderResult<Utxo> {
        let prevout = Utxo::from_tx_output(&self.prior_locking_tx, self.output_index).ok_or(
            ValidationError::OutputIndexOutOfRange {
                index: self.output_index,
                num_outputs: self.prior_locking_tx.output.len(),
            },
        )?;

        if self.minimum_fee == Amount::ZERO || self.minimum_fee >= prevout.value {
            return Err(ValidationError::InvalidMinimumFee {
                fee: self.minimum_fee,
                output_value: prevout.value,
            })?;
        }

        let expected = self.script.to_p2wsh();
        if prevout.script_pubkey != expected {
            return Err(ReleaseTransactionError::ScriptMismatch {
                expected,
                found: prevout.script_pubkey,
            })?;
        }

        Ok(prevout)
    }

    /// An owner spend must carry at least the relative lock the script's owner branch checks.
    fn check_spend_path(&self) -> BridgeTxBuilderResult<()> {
        let SpendPath::Owner { transfer_time_lock } = self.spend_path else {
            return Ok(());
        };

        let committed = committed_transfer_time_lock(&self.script);
        if committed.map_or(true, |lock| transfer_time_lock < lock) {
            return Err(ReleaseTransactionError::TimeLockMismatch {
                committed,
                requested: transfer_time_lock,
            })?;
        }

        Ok(())
    }
}

/// Build the PSBT that releases output `output_index` of `prior_locking_tx` to `destination`
/// through the validator branch of `script`.
///
/// The single output pays the locked value minus `minimum_fee`.
pub fn build_release_transaction<C: BuildContext>(
    build_context: &C,
    script: &ScriptBuf,
    prior_locking_tx: &Transaction,
    destination: &Address,
    minimum_fee: Amount,
    output_index: u32,
) -> BridgeTxBuilderResult<TxSigningData> {
    ReleaseInfo::new(
        script.clone(),
        prior_locking_tx.clone(),
        destination.clone(),
        minimum_fee,
        output_index,
    )
    .construct_signing_data(build_context)
}

/// Build the PSBT through which the owner reclaims output `output_index` of `prior_locking_tx`
/// after `transfer_time_lock` blocks.
///
/// Identical to [`build_release_transaction`] except that the input's sequence encodes the
/// relative lock, which the owner branch of the script checks. `transfer_time_lock` must be at
/// least the lock committed to in `script`, otherwise the spend could never confirm.
pub fn build_recapture_transaction<C: BuildContext>(
    build_context: &C,
    script: &ScriptBuf,
    prior_locking_tx: &Transaction,
    destination: &Address,
    minimum_fee: Amount,
    output_index: u32,
    transfer_time_lock: u16,
) -> BridgeTxBuilderResult<TxSigningData> {
    ReleaseInfo::new(
        script.clone(),
        prior_locking_tx.clone(),
        destination.clone(),
        minimum_fee,
        output_index,
    )
    .with_spend_path(SpendPath::Owner { transfer_time_lock })
    .construct_signing_data(build_context)
}
