use stakebridge_primitives::buf::{Buf20, Buf32};

use crate::ArbitraryGenerator;

/// Policy inputs shared by deposit and staking scripts.
#[derive(Debug, Clone, Copy)]
pub struct StakingKeys {
    pub evm_address: Buf20,
    pub delegator_key: Buf32,
    pub validator_key: Buf32,
}

/// Generates an arbitrary EVM address and two distinct staking keys.
pub fn generate_staking_keys() -> StakingKeys {
    let arb = ArbitraryGenerator::new_with_size(1024);

    let evm_address: Buf20 = arb.generate();
    let delegator_key: Buf32 = arb.generate();
    let mut validator_key: Buf32 = arb.generate();

    if validator_key == delegator_key {
        let mut bytes: [u8; 32] = validator_key.into();
        bytes[0] ^= 0xff;
        validator_key = bytes.into();
    }

    StakingKeys {
        evm_address,
        delegator_key,
        validator_key,
    }
}

/// The fixed policy inputs used in the documented staking script vector.
pub fn fixed_staking_keys() -> StakingKeys {
    StakingKeys {
        evm_address: Buf20::new([0x11; 20]),
        delegator_key: Buf32::new([0x22; 32]),
        validator_key: Buf32::new([0x33; 32]),
    }
}
