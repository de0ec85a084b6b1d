use std::cell::Cell;

use arbitrary::{Arbitrary, Unstructured};
use rand::{rngs::OsRng, RngCore};

pub mod bitcoin;
pub mod bridge;

/// Entropy drawn up front, enough for a few hundred UTXOs or keys.
const DEFAULT_ENTROPY_LEN: usize = 1 << 14;

/// Draws arbitrary values out of a pool of random bytes.
///
/// Each call to [`generate`](Self::generate) consumes fresh bytes, so consecutive values are
/// independent. Once the pool runs dry `arbitrary` falls back to zeroed data, so size the pool
/// for the number of values a test needs.
#[derive(Debug)]
pub struct ArbitraryGenerator {
    entropy: Vec<u8>,
    consumed: Cell<usize>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self::new_with_size(DEFAULT_ENTROPY_LEN)
    }

    pub fn new_with_size(len: usize) -> Self {
        let mut entropy = vec![0; len];
        OsRng.fill_bytes(&mut entropy);

        Self::from_entropy(entropy)
    }

    /// Uses the given bytes as the pool, which makes the generated values reproducible.
    pub fn from_entropy(entropy: Vec<u8>) -> Self {
        Self {
            entropy,
            consumed: Cell::new(0),
        }
    }

    pub fn generate<'a, T: Arbitrary<'a>>(&'a self) -> T {
        let remaining = &self.entropy[self.consumed.get()..];
        let mut u = Unstructured::new(remaining);

        let value = T::arbitrary(&mut u).expect("arbitrary instance from raw bytes");
        self.consumed
            .set(self.consumed.get() + remaining.len() - u.len());

        value
    }
}
