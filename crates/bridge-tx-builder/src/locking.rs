//! Builders related to locking funds under a staking or deposit script.

use bitcoin::{absolute::LockTime, Address, Amount, ScriptBuf, Sequence};
use stakebridge_primitives::l1::Utxo;
use tracing::{debug, warn};

use crate::{
    constants::LOCKING_TX_NUM_OUTPUTS,
    context::BuildContext,
    errors::{BridgeTxBuilderError, BridgeTxBuilderResult, InsufficientFundsError, ValidationError},
    operations::{create_psbt, create_tx, create_tx_ins, create_tx_outs, locking_address},
    selection::select_inputs_for_amount,
    TxKind, TxSigningData,
};

/// The information required to create a transaction that locks funds under a script.
#[derive(Debug, Clone)]
pub struct LockingInfo {
    /// The script the funds are locked under, as a P2WSH output.
    script: ScriptBuf,

    /// The amount to lock.
    amount: Amount,

    /// Where leftover funds go, if they are worth an output.
    change_address: Address,

    /// The UTXOs available to fund the transaction.
    input_utxos: Vec<Utxo>,

    /// The fee rate in sats/byte.
    fee_rate: u64,

    /// The block height before which the transaction cannot be mined, if any.
    lock_height: Option<u32>,
}

impl TxKind for LockingInfo {
    fn construct_signing_data<C: BuildContext>(
        &self,
        build_context: &C,
    ) -> BridgeTxBuilderResult<TxSigningData> {
        let lock_time = self.validate()?;

        let locking_addr = locking_address(&self.script, *build_context.network());

        let selection = select_inputs_for_amount(
            &self.input_utxos,
            self.amount,
            self.fee_rate,
            LOCKING_TX_NUM_OUTPUTS,
        )?;
        let total = selection.total_value()?;
        let fee = selection.fee;

        let change = total
            .checked_sub(self.amount)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or_else(|| InsufficientFundsError::NotEnoughUtxos {
                required: self.amount + fee,
                available: total,
            })?;

        // the locking output always comes first so that callers can rely on its index
        let mut scripts_and_amounts = vec![(locking_addr.script_pubkey(), self.amount)];

        if change > build_context.dust_limit() {
            scripts_and_amounts.push((self.change_address.script_pubkey(), change));
        } else if change > Amount::ZERO {
            warn!(%change, dust_limit = %build_context.dust_limit(), "dropping dust change");
        }

        let tx_ins = create_tx_ins(
            selection.selected_utxos.iter().map(Utxo::outpoint),
            Sequence::ENABLE_RBF_NO_LOCKTIME,
        );
        let tx_outs = create_tx_outs(scripts_and_amounts);
        let unsigned_tx = create_tx(tx_ins, tx_outs, lock_time);

        let psbt = create_psbt(unsigned_tx, &selection.selected_utxos, None)?;

        debug!(
            txid = %psbt.compute_txid(),
            %locking_addr,
            amount = %self.amount,
            %fee,
            %change,
            "built locking transaction"
        );

        Ok(TxSigningData {
            psbt,
            fee,
            spent_utxos: selection.selected_utxos,
        })
    }
}

impl LockingInfo {
    /// Create a new locking info with all the data required to create a locking transaction.
    pub fn new(
        script: ScriptBuf,
        amount: Amount,
        change_address: Address,
        input_utxos: Vec<Utxo>,
        fee_rate: u64,
        lock_height: Option<u32>,
    ) -> Self {
        Self {
            script,
            amount,
            change_address,
            input_utxos,
            fee_rate,
            lock_height,
        }
    }

    /// Get the script the funds get locked under.
    pub fn script(&self) -> &ScriptBuf {
        &self.script
    }

    /// Get the amount to lock.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Get the lock height, if any.
    pub fn lock_height(&self) -> Option<u32> {
        self.lock_height
    }

    /// Checks the inputs before anything is computed and returns the lock time to use.
    fn validate(&self) -> BridgeTxBuilderResult<LockTime> {
        if self.amount == Amount::ZERO {
            return Err(ValidationError::ZeroAmount)?;
        }

        if self.fee_rate == 0 {
            return Err(ValidationError::ZeroFeeRate)?;
        }

        match self.lock_height {
            // only height-based locktimes are supported, values past the threshold are timestamps
            Some(height) => LockTime::from_height(height)
                .map_err(|_| BridgeTxBuilderError::InvalidLocktime(height)),
            None => Ok(LockTime::ZERO),
        }
    }
}

/// Build the PSBT that locks `amount` under `script`, funded from `input_utxos`.
///
/// The first output pays `amount` to the P2WSH address of `script`; a second output returns the
/// change to `change_address` when it is above the dust limit.
pub fn build_locking_transaction<C: BuildContext>(
    build_context: &C,
    script: &ScriptBuf,
    amount: Amount,
    change_address: &Address,
    input_utxos: &[Utxo],
    fee_rate: u64,
    lock_height: Option<u32>,
) -> BridgeTxBuilderResult<TxSigningData> {
    LockingInfo::new(
        script.clone(),
        amount,
        change_address.clone(),
        input_utxos.to_vec(),
        fee_rate,
        lock_height,
    )
    .construct_signing_data(build_context)
}

#[cfg(test)]
mod tests {
    use bitcoin::Network;
    use stakebridge_config::{CommitmentEncoding, TxBuilderConfig};
    use stakebridge_test_utils::bitcoin::{generate_utxos, test_address};

    use super::*;
    use crate::{
        context::TxBuildContext,
        fees::estimate_fee,
        scripts::{build_deposit_script, build_staking_script, StakingScriptParams},
    };

    fn context() -> TxBuildContext {
        TxBuildContext::new(Network::Regtest, CommitmentEncoding::BigEndian)
    }

    fn staking_script() -> ScriptBuf {
        let params = StakingScriptParams::new(
            [0x11; 20].into(),
            [0x22; 32].into(),
            [0x33; 32].into(),
            144,
            1,
            1,
        );

        build_staking_script(&params, CommitmentEncoding::BigEndian)
    }

    #[test]
    fn test_locking_tx_with_change() {
        let context = context();
        let script = staking_script();
        let change_address = test_address(Network::Regtest);
        let utxos = generate_utxos(&[200_000]);

        let signing_data = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(100_000),
            &change_address,
            &utxos,
            10,
            None,
        )
        .expect("should build the locking transaction");

        assert_eq!(signing_data.fee, Amount::from_sat(2_590));
        assert_eq!(signing_data.spent_utxos, utxos);

        let tx = signing_data.psbt.unsigned_tx();
        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.output.len(), 2, "locking output and change");

        assert_eq!(tx.output[0].value, Amount::from_sat(100_000));
        assert_eq!(tx.output[0].script_pubkey, script.to_p2wsh());

        assert_eq!(tx.output[1].value, Amount::from_sat(97_410));
        assert_eq!(tx.output[1].script_pubkey, change_address.script_pubkey());

        assert_eq!(tx.lock_time, LockTime::ZERO);
    }

    #[test]
    fn test_locking_tx_inputs() {
        let context = context();
        let script = build_deposit_script(&[0x11; 20].into(), &[0x22; 32].into());
        let utxos = generate_utxos(&[30_000, 80_000, 50_000]);

        let signing_data = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(120_000),
            &test_address(Network::Regtest),
            &utxos,
            2,
            None,
        )
        .unwrap();

        let psbt = signing_data.psbt.inner();
        assert_eq!(psbt.inputs.len(), 2);
        assert_eq!(signing_data.spent_utxos, vec![utxos[1].clone(), utxos[2].clone()]);

        for ((txin, input), utxo) in psbt
            .unsigned_tx
            .input
            .iter()
            .zip(&psbt.inputs)
            .zip(&signing_data.spent_utxos)
        {
            assert_eq!(txin.previous_output, utxo.outpoint());
            assert!(
                txin.sequence.is_rbf() && !txin.sequence.is_final(),
                "inputs must signal replaceability and not be final"
            );
            assert_eq!(input.witness_utxo.as_ref(), Some(&utxo.txout()));
            assert!(input.witness_script.is_none());
        }

        let total_in: Amount = signing_data.spent_utxos.iter().map(|u| u.value).sum();
        let total_out: Amount = psbt.unsigned_tx.output.iter().map(|o| o.value).sum();
        assert_eq!(total_in - total_out, signing_data.fee);
        assert_eq!(signing_data.fee, estimate_fee(2, 2, 2));
    }

    #[test]
    fn test_locking_tx_drops_dust_change() {
        let context = context();
        let script = staking_script();
        let fee = estimate_fee(10, 1, 2);

        for leftover in [0, 1, 546] {
            let utxos = generate_utxos(&[100_000 + fee.to_sat() + leftover]);

            let signing_data = build_locking_transaction(
                &context,
                &script,
                Amount::from_sat(100_000),
                &test_address(Network::Regtest),
                &utxos,
                10,
                None,
            )
            .unwrap();

            let tx = signing_data.psbt.unsigned_tx();
            assert_eq!(
                tx.output.len(),
                1,
                "change of {leftover} sats should not get an output"
            );
            assert_eq!(signing_data.fee, fee);
        }

        let utxos = generate_utxos(&[100_000 + fee.to_sat() + 547]);
        let signing_data = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(100_000),
            &test_address(Network::Regtest),
            &utxos,
            10,
            None,
        )
        .unwrap();

        let tx = signing_data.psbt.unsigned_tx();
        assert_eq!(tx.output.len(), 2, "change above the dust limit is kept");
        assert_eq!(tx.output[1].value, Amount::from_sat(547));
    }

    #[test]
    fn test_locking_tx_lock_height() {
        let context = context();
        let script = staking_script();
        let utxos = generate_utxos(&[200_000]);
        let change_address = test_address(Network::Regtest);

        let build = |lock_height| {
            build_locking_transaction(
                &context,
                &script,
                Amount::from_sat(100_000),
                &change_address,
                &utxos,
                10,
                lock_height,
            )
        };

        let signing_data = build(Some(840_000)).unwrap();
        assert_eq!(
            signing_data.psbt.unsigned_tx().lock_time,
            LockTime::from_height(840_000).unwrap()
        );

        let signing_data = build(Some(499_999_999)).unwrap();
        assert!(signing_data.psbt.unsigned_tx().lock_time.is_block_height());

        assert!(matches!(
            build(Some(500_000_000)),
            Err(BridgeTxBuilderError::InvalidLocktime(500_000_000))
        ));
        assert!(matches!(
            build(Some(u32::MAX)),
            Err(BridgeTxBuilderError::InvalidLocktime(u32::MAX))
        ));
    }

    #[test]
    fn test_locking_tx_honors_context_dust_limit() {
        let script = staking_script();
        let fee = estimate_fee(10, 1, 2);
        let utxos = generate_utxos(&[100_000 + fee.to_sat() + 800]);

        let info = LockingInfo::new(
            script.clone(),
            Amount::from_sat(100_000),
            test_address(Network::Regtest),
            utxos,
            10,
            Some(1_000),
        );
        assert_eq!(info.script(), &script);
        assert_eq!(info.amount(), Amount::from_sat(100_000));
        assert_eq!(info.lock_height(), Some(1_000));

        // 800 sats of change is above the default limit
        let signing_data = info.construct_signing_data(&context()).unwrap();
        assert_eq!(signing_data.psbt.unsigned_tx().output.len(), 2);

        let strict = context().with_dust_limit(Amount::from_sat(1_000));
        let signing_data = info.construct_signing_data(&strict).unwrap();
        let tx = signing_data.psbt.unsigned_tx();
        assert_eq!(tx.output.len(), 1, "change under a raised dust limit is dropped");
        assert_eq!(tx.lock_time, LockTime::from_height(1_000).unwrap());

        let config = TxBuilderConfig {
            dust_limit: 799,
            ..TxBuilderConfig::new(Network::Regtest)
        };
        let signing_data = info
            .construct_signing_data(&TxBuildContext::from_config(&config))
            .unwrap();
        assert_eq!(
            signing_data.psbt.unsigned_tx().output[1].value,
            Amount::from_sat(800)
        );
    }

    #[test]
    fn test_locking_tx_rejects_bad_inputs() {
        let context = context();
        let script = staking_script();
        let change_address = test_address(Network::Regtest);
        let utxos = generate_utxos(&[200_000]);

        let result = build_locking_transaction(
            &context,
            &script,
            Amount::ZERO,
            &change_address,
            &utxos,
            10,
            None,
        );
        assert!(matches!(
            result,
            Err(BridgeTxBuilderError::Validation(ValidationError::ZeroAmount))
        ));

        let result = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(1_000),
            &change_address,
            &utxos,
            0,
            None,
        );
        assert!(matches!(
            result,
            Err(BridgeTxBuilderError::Validation(ValidationError::ZeroFeeRate))
        ));

        // validation happens before selection, even with nothing to select from
        let result = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(1_000),
            &change_address,
            &[],
            10,
            Some(600_000_000),
        );
        assert!(matches!(
            result,
            Err(BridgeTxBuilderError::InvalidLocktime(600_000_000))
        ));
    }

    #[test]
    fn test_locking_tx_insufficient_funds() {
        let context = context();
        let script = staking_script();

        let result = build_locking_transaction(
            &context,
            &script,
            Amount::from_sat(100_000),
            &test_address(Network::Regtest),
            &generate_utxos(&[50_000, 40_000]),
            10,
            None,
        );

        assert!(matches!(
            result,
            Err(BridgeTxBuilderError::InsufficientFunds(
                InsufficientFundsError::NotEnoughUtxos { .. }
            ))
        ));
    }

    #[test]
    fn test_locking_tx_uses_context_network() {
        let script = staking_script();
        let utxos = generate_utxos(&[200_000]);

        for network in [Network::Bitcoin, Network::Testnet, Network::Regtest] {
            let context = TxBuildContext::new(network, CommitmentEncoding::BigEndian);

            let signing_data = build_locking_transaction(
                &context,
                &script,
                Amount::from_sat(100_000),
                &test_address(network),
                &utxos,
                10,
                None,
            )
            .unwrap();

            let locking_output = &signing_data.psbt.unsigned_tx().output[0];
            assert_eq!(
                locking_output.script_pubkey,
                locking_address(&script, network).script_pubkey()
            );
        }
    }
}
