//! Re-exports of the types and builders most callers need.

pub use crate::{
    context::{BuildContext, TxBuildContext},
    errors::{
        BridgeTxBuilderError, BridgeTxBuilderResult, InsufficientFundsError,
        ReleaseTransactionError, ValidationError,
    },
    fees::estimate_fee,
    locking::{build_locking_transaction, LockingInfo},
    release::{build_recapture_transaction, build_release_transaction, ReleaseInfo, SpendPath},
    scripts::{build_deposit_script, build_staking_script, StakingScriptParams},
    selection::{select_inputs_for_amount, SelectionResult},
    TxKind, TxSigningData,
};
