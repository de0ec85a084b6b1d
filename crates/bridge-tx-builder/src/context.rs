//! Provides the configuration that script and transaction builders are parameterized over.
//!
//! Nothing network- or deployment-specific is read from global state: every builder takes a
//! [`BuildContext`] explicitly.

use bitcoin::{Amount, Network};
use stakebridge_config::{CommitmentEncoding, TxBuilderConfig};

use crate::constants::DUST_LIMIT;

/// Provides methods that allow access to components required to build staking transactions.
pub trait BuildContext {
    /// Get the bitcoin network for which the builder constructs addresses and transactions.
    fn network(&self) -> &Network;

    /// Get the layout of the `(validator_index, nonce)` commitment in staking scripts.
    fn commitment_encoding(&self) -> CommitmentEncoding;

    /// Get the threshold at or below which change is dropped instead of being paid out.
    fn dust_limit(&self) -> Amount;
}

/// A [`BuildContext`] holding its values directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBuildContext {
    /// The network to build the transactions for.
    network: Network,

    /// The commitment layout used for staking scripts.
    commitment_encoding: CommitmentEncoding,

    /// The dust threshold for change outputs.
    dust_limit: Amount,
}

impl TxBuildContext {
    /// Create a new [`TxBuildContext`] with the standard dust limit.
    pub fn new(network: Network, commitment_encoding: CommitmentEncoding) -> Self {
        Self {
            network,
            commitment_encoding,
            dust_limit: DUST_LIMIT,
        }
    }

    /// Create a new [`TxBuildContext`] from a loaded [`TxBuilderConfig`].
    pub fn from_config(config: &TxBuilderConfig) -> Self {
        Self {
            network: config.network,
            commitment_encoding: config.commitment_encoding,
            dust_limit: Amount::from_sat(config.dust_limit),
        }
    }

    /// Overrides the dust limit.
    pub fn with_dust_limit(mut self, dust_limit: Amount) -> Self {
        self.dust_limit = dust_limit;
        self
    }
}

impl BuildContext for TxBuildContext {
    fn network(&self) -> &Network {
        &self.network
    }

    fn commitment_encoding(&self) -> CommitmentEncoding {
        self.commitment_encoding
    }

    fn dust_limit(&self) -> Amount {
        self.dust_limit
    }
}

impl From<&TxBuilderConfig> for TxBuildContext {
    fn from(config: &TxBuilderConfig) -> Self {
        Self::from_config(config)
    }
}
