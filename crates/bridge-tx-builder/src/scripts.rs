//! Compiles the protocol's spending policies into scripts.
//!
//! Two shapes exist:
//!
//! - the *deposit script*, a single signature check against the staker's key with the EVM address
//!   embedded as a commitment, and
//! - the *staking script*, which the owner can redeem alone after a relative timelock, or the
//!   validator and delegator can redeem together at any time with a 2-of-2 multisig.
//!
//! Both are deterministic functions of their inputs.

use bitcoin::{
    opcodes::all::{
        OP_CHECKMULTISIG, OP_CHECKSIG, OP_CSV, OP_DROP, OP_DUP, OP_ELSE, OP_ENDIF, OP_EQUAL,
        OP_EQUALVERIFY, OP_IF,
    },
    script::{Builder, Instruction},
    Script, ScriptBuf,
};
use serde::{Deserialize, Serialize};
use stakebridge_config::CommitmentEncoding;
use stakebridge_primitives::buf::{Buf20, Buf32};
use tracing::trace;

use crate::{
    constants::{COMMITMENT_SIZE, VALIDATOR_MULTISIG_THRESHOLD},
    errors::ValidationError,
};

/// Everything the staking script commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingScriptParams {
    /// The staker's EVM address. Supplying it selects the owner branch.
    pub evm_address: Buf20,

    /// The delegator's key, required on both branches.
    pub delegator_key: Buf32,

    /// The validator's key, required on the multisig branch.
    pub validator_key: Buf32,

    /// Blocks that must pass after confirmation before the owner branch can be used.
    pub transfer_time_lock: u16,

    /// Index of the validator the stake is delegated to.
    pub validator_index: u32,

    /// Nonce distinguishing stakes with the same validator.
    pub nonce: u32,
}

impl StakingScriptParams {
    /// Create a new set of staking script parameters.
    pub fn new(
        evm_address: Buf20,
        delegator_key: Buf32,
        validator_key: Buf32,
        transfer_time_lock: u16,
        validator_index: u32,
        nonce: u32,
    ) -> Self {
        Self {
            evm_address,
            delegator_key,
            validator_key,
            transfer_time_lock,
            validator_index,
            nonce,
        }
    }

    /// Create the parameters from untyped inputs, checking lengths and numeric ranges.
    pub fn from_raw(
        evm_address: &[u8],
        delegator_key: &[u8],
        validator_key: &[u8],
        transfer_time_lock: u64,
        validator_index: u64,
        nonce: u64,
    ) -> Result<Self, ValidationError> {
        let evm_address = Buf20::try_from(evm_address)
            .map_err(|e| ValidationError::from_parse_error("evm_address", e))?;
        let delegator_key = Buf32::try_from(delegator_key)
            .map_err(|e| ValidationError::from_parse_error("delegator_key", e))?;
        let validator_key = Buf32::try_from(validator_key)
            .map_err(|e| ValidationError::from_parse_error("validator_key", e))?;

        let transfer_time_lock = u16::try_from(transfer_time_lock).map_err(|_| {
            numeric_out_of_range("transfer_time_lock", transfer_time_lock, u16::MAX.into())
        })?;
        let validator_index = u32::try_from(validator_index).map_err(|_| {
            numeric_out_of_range("validator_index", validator_index, u32::MAX.into())
        })?;
        let nonce = u32::try_from(nonce)
            .map_err(|_| numeric_out_of_range("nonce", nonce, u32::MAX.into()))?;

        Ok(Self {
            evm_address,
            delegator_key,
            validator_key,
            transfer_time_lock,
            validator_index,
            nonce,
        })
    }
}

fn numeric_out_of_range(field: &'static str, value: u64, max: u64) -> ValidationError {
    ValidationError::NumericOutOfRange { field, value, max }
}

/// Parses a hex-encoded EVM address (with or without `0x`).
pub fn parse_evm_address(s: &str) -> Result<Buf20, ValidationError> {
    s.parse()
        .map_err(|e| ValidationError::from_parse_error("evm_address", e))
}

/// Parses a hex-encoded 32-byte staking key; `field` names it in the error.
pub fn parse_staking_key(field: &'static str, s: &str) -> Result<Buf32, ValidationError> {
    s.parse()
        .map_err(|e| ValidationError::from_parse_error(field, e))
}

/// Create the deposit script: `<evm_address> OP_DROP <pos_pubkey> OP_CHECKSIG`.
///
/// The EVM address is only a commitment and is dropped right away; the spending condition is a
/// signature under `pos_pubkey`.
pub fn build_deposit_script(evm_address: &Buf20, pos_pubkey: &Buf32) -> ScriptBuf {
    Builder::new()
        .push_slice(evm_address.as_bytes())
        .push_opcode(OP_DROP)
        .push_slice(pos_pubkey.as_bytes())
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Create the staking script for `params`.
///
/// ```text
/// OP_DUP <evm_address> OP_EQUAL
/// OP_IF
///     OP_DROP <transfer_time_lock> OP_CHECKSEQUENCEVERIFY OP_DROP
///     <delegator_key> OP_CHECKSIG
/// OP_ELSE
///     <commitment> OP_EQUALVERIFY
///     OP_2 <validator_key> <delegator_key> OP_2 OP_CHECKMULTISIG
/// OP_ENDIF
/// ```
///
/// Which branch runs depends only on the witness the spender supplies. The time lock is pushed
/// as a minimally encoded script number, the way `OP_CHECKSEQUENCEVERIFY` reads it, and the
/// commitment is laid out according to `encoding`.
pub fn build_staking_script(
    params: &StakingScriptParams,
    encoding: CommitmentEncoding,
) -> ScriptBuf {
    let commitment = encode_commitment(params.validator_index, params.nonce, encoding);

    let script = Builder::new()
        .push_opcode(OP_DUP)
        .push_slice(params.evm_address.as_bytes())
        .push_opcode(OP_EQUAL)
        .push_opcode(OP_IF)
        // owner path
        .push_opcode(OP_DROP)
        .push_int(i64::from(params.transfer_time_lock))
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_slice(params.delegator_key.as_bytes())
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_ELSE)
        // validator path
        .push_slice(commitment)
        .push_opcode(OP_EQUALVERIFY)
        .push_int(VALIDATOR_MULTISIG_THRESHOLD)
        .push_slice(params.validator_key.as_bytes())
        .push_slice(params.delegator_key.as_bytes())
        .push_int(VALIDATOR_MULTISIG_THRESHOLD)
        .push_opcode(OP_CHECKMULTISIG)
        .push_opcode(OP_ENDIF)
        .into_script();

    trace!(?encoding, script_len = script.len(), "built staking script");

    script
}

/// Read back the relative lock enforced by the owner branch of a staking script.
///
/// Returns `None` if `script` does not open with the owner branch, e.g. for deposit scripts.
pub fn committed_transfer_time_lock(script: &Script) -> Option<u16> {
    let head = script
        .instructions()
        .take(7)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let [dup, Instruction::PushBytes(_), equal, if_, drop, lock, csv] = head.as_slice() else {
        return None;
    };

    let owner_branch = [
        (dup, OP_DUP),
        (equal, OP_EQUAL),
        (if_, OP_IF),
        (drop, OP_DROP),
        (csv, OP_CSV),
    ];
    if !owner_branch
        .iter()
        .all(|(instruction, op)| **instruction == Instruction::Op(*op))
    {
        return None;
    }

    u16::try_from(lock.script_num()?).ok()
}

/// Encode the `(validator_index, nonce)` commitment as two 4-byte halves.
pub fn encode_commitment(
    validator_index: u32,
    nonce: u32,
    encoding: CommitmentEncoding,
) -> [u8; COMMITMENT_SIZE] {
    let mut commitment = [0u8; COMMITMENT_SIZE];

    let (index_half, nonce_half) = commitment.split_at_mut(COMMITMENT_SIZE / 2);
    index_half.copy_from_slice(&encode_u32(validator_index, encoding));
    nonce_half.copy_from_slice(&encode_u32(nonce, encoding));

    commitment
}

fn encode_u32(value: u32, encoding: CommitmentEncoding) -> [u8; 4] {
    match encoding {
        CommitmentEncoding::BigEndian => value.to_be_bytes(),
        // truncates to the low byte on purpose, see `CommitmentEncoding::RepeatedLowByte`
        CommitmentEncoding::RepeatedLowByte => [value as u8; 4],
    }
}
