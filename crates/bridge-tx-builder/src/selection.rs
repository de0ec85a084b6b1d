//! Greedy coin selection.

use std::cmp::Reverse;

use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use stakebridge_primitives::l1::Utxo;
use tracing::{debug, trace};

use crate::{
    errors::{BridgeTxBuilderError, BridgeTxBuilderResult, InsufficientFundsError, ValidationError},
    fees::estimate_fee,
};

/// The inputs chosen to fund a transaction and the fee estimated for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// The selected UTXOs, highest value first.
    pub selected_utxos: Vec<Utxo>,

    /// The fee for exactly this set of inputs.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub fee: Amount,
}

impl SelectionResult {
    /// Sum of the selected UTXOs' values.
    pub fn total_value(&self) -> BridgeTxBuilderResult<Amount> {
        sum_values(&self.selected_utxos)
    }
}

/// Sums the values of `utxos`, failing on overflow.
pub fn sum_values<'a>(utxos: impl IntoIterator<Item = &'a Utxo>) -> BridgeTxBuilderResult<Amount> {
    utxos
        .into_iter()
        .try_fold(Amount::ZERO, |acc, utxo| acc.checked_add(utxo.value))
        .ok_or_else(|| ValidationError::AmountOverflow.into())
}

/// Choose UTXOs to cover `amount` plus the fee for spending them.
///
/// UTXOs are taken highest value first, re-estimating the fee for `num_outputs` outputs after
/// each one, until the running total reaches `amount + fee`. This is greedy, not optimal: it
/// neither minimizes the number of inputs nor the change, but stops at the first UTXO that makes
/// the total sufficient.
///
/// # Errors
///
/// [`InsufficientFundsError`] if `utxos` is empty or even all of them fall short.
pub fn select_inputs_for_amount(
    utxos: &[Utxo],
    amount: Amount,
    fee_rate: u64,
    num_outputs: u32,
) -> BridgeTxBuilderResult<SelectionResult> {
    if utxos.is_empty() {
        return Err(InsufficientFundsError::NoUtxos)?;
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by_key(|utxo| Reverse(utxo.value));

    let mut selected_utxos = Vec::new();
    let mut accumulated = Amount::ZERO;
    let mut fee = None;
    let mut required = amount;

    for utxo in sorted {
        accumulated = accumulated
            .checked_add(utxo.value)
            .ok_or(ValidationError::AmountOverflow)?;
        selected_utxos.push(utxo.clone());

        let num_inputs =
            u32::try_from(selected_utxos.len()).map_err(|_| ValidationError::AmountOverflow)?;
        let current_fee = estimate_fee(fee_rate, num_inputs, num_outputs);
        fee = Some(current_fee);

        required = amount
            .checked_add(current_fee)
            .ok_or(ValidationError::AmountOverflow)?;

        trace!(
            outpoint = %utxo.outpoint(),
            value = %utxo.value,
            %accumulated,
            %required,
            "added utxo to selection"
        );

        if accumulated >= required {
            break;
        }
    }

    let fee = fee.ok_or(BridgeTxBuilderError::FeeCalculation)?;

    if accumulated < required {
        return Err(InsufficientFundsError::NotEnoughUtxos {
            required,
            available: accumulated,
        })?;
    }

    debug!(
        num_selected = selected_utxos.len(),
        num_available = utxos.len(),
        %amount,
        %fee,
        "selected utxos"
    );

    Ok(SelectionResult {
        selected_utxos,
        fee,
    })
}
