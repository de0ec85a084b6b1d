//! Configuration types for the staking bridge transaction builders.

mod config;

pub use config::{CommitmentEncoding, TxBuilderConfig, DEFAULT_DUST_LIMIT};
