use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// Default value for `dust_limit` in [`TxBuilderConfig`], in sats.
///
/// Outputs worth less than this cost more to spend than they hold.
pub const DEFAULT_DUST_LIMIT: u64 = 546;

/// Configuration for building staking scripts and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBuilderConfig {
    /// The network to build addresses and transactions for.
    pub network: Network,

    /// How the `(validator_index, nonce)` commitment is laid out in staking scripts.
    #[serde(default)]
    pub commitment_encoding: CommitmentEncoding,

    /// Change at or below this many sats is left to the miner instead of getting an output.
    #[serde(default = "default_dust_limit")]
    pub dust_limit: u64,
}

impl TxBuilderConfig {
    /// Creates a config for `network` with every other field at its default.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            commitment_encoding: CommitmentEncoding::default(),
            dust_limit: DEFAULT_DUST_LIMIT,
        }
    }
}

fn default_dust_limit() -> u64 {
    DEFAULT_DUST_LIMIT
}

/// Byte layout of the 8-byte `(validator_index, nonce)` commitment in the validator branch of
/// the staking script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentEncoding {
    /// Each value as a 4-byte big-endian integer.
    #[default]
    BigEndian,

    /// Each value as its low byte repeated four times.
    ///
    /// Scripts already deployed on chain were built this way, so spending or recognizing them
    /// requires reproducing it byte for byte.
    RepeatedLowByte,
}
