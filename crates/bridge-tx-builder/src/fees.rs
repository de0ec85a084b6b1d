//! Linear fee heuristic used when selecting inputs.

use bitcoin::Amount;

use crate::constants::{INPUT_SIZE_ESTIMATE, OUTPUT_SIZE_ESTIMATE, TX_OVERHEAD_ESTIMATE};

/// Estimate the size in bytes of a transaction with the given number of inputs and outputs.
///
/// Every input is counted at [`INPUT_SIZE_ESTIMATE`] plus one byte, which overshoots both legacy
/// and witness spends so that the resulting fee is always sufficient.
pub fn estimate_size(num_inputs: u32, num_outputs: u32) -> u64 {
    let num_inputs = u64::from(num_inputs);
    let num_outputs = u64::from(num_outputs);

    num_inputs
        .saturating_mul(INPUT_SIZE_ESTIMATE)
        .saturating_add(num_outputs.saturating_mul(OUTPUT_SIZE_ESTIMATE))
        .saturating_add(TX_OVERHEAD_ESTIMATE)
        .saturating_add(num_inputs)
}

/// Estimate the fee for a transaction at `fee_rate` sats/byte:
/// `(num_inputs * 180 + num_outputs * 34 + 10 + num_inputs) * fee_rate`.
///
/// Saturates instead of overflowing, so the result never decreases as any argument grows.
pub fn estimate_fee(fee_rate: u64, num_inputs: u32, num_outputs: u32) -> Amount {
    Amount::from_sat(estimate_size(num_inputs, num_outputs).saturating_mul(fee_rate))
}
