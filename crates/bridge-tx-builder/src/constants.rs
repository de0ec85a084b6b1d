//! Constants related to staking scripts and transactions.

use bitcoin::Amount;
use stakebridge_config::DEFAULT_DUST_LIMIT;

/// Change at or below this is not emitted unless the context says otherwise.
pub const DUST_LIMIT: Amount = Amount::from_sat(DEFAULT_DUST_LIMIT);

/// Estimated size of a single input, in bytes.
///
/// This overestimates both legacy and witness inputs so that the fee always suffices.
pub const INPUT_SIZE_ESTIMATE: u64 = 180;

/// Estimated size of a single output, in bytes.
pub const OUTPUT_SIZE_ESTIMATE: u64 = 34;

/// Estimated size of the fixed transaction overhead (version, counts, locktime), in bytes.
pub const TX_OVERHEAD_ESTIMATE: u64 = 10;

/// Outputs budgeted for when selecting inputs for a locking transaction: the locking output and
/// a possible change output.
pub const LOCKING_TX_NUM_OUTPUTS: u32 = 2;

/// Size of the `(validator_index, nonce)` commitment pushed in the validator branch.
pub const COMMITMENT_SIZE: usize = 8;

/// Number of signatures (and keys) in the validator branch multisig.
pub const VALIDATOR_MULTISIG_THRESHOLD: i64 = 2;
