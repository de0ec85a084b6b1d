//! Fixed-width byte buffers used for policy parameters.
//!
//! The staking protocol commits to 20-byte EVM addresses and its own 32-byte key convention,
//! neither of which map onto secp256k1 types, so they are carried as raw fixed-width buffers.

use std::{fmt, str::FromStr};

use arbitrary::{Arbitrary, Unstructured};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;

macro_rules! impl_buf {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Length of the buffer in bytes.
            pub const LEN: usize = $len;

            /// Wraps the given bytes.
            pub const fn new(data: [u8; $len]) -> Self {
                Self(data)
            }

            /// Returns the all-zero buffer.
            pub const fn zero() -> Self {
                Self([0; $len])
            }

            /// Returns the underlying array.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Returns the buffer as a slice.
            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(data: [u8; $len]) -> Self {
                Self(data)
            }
        }

        impl<'a> From<&'a [u8; $len]> for $name {
            fn from(data: &'a [u8; $len]) -> Self {
                Self(*data)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = ParseError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                let data: [u8; $len] = value.try_into().map_err(|_| ParseError::InvalidLength {
                    expected: $len,
                    actual: value.len(),
                })?;

                Ok(Self(data))
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;

                Self::try_from(bytes.as_slice())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        // Human-readable hex so that configs and fixtures stay legible.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }

        impl<'a> Arbitrary<'a> for $name {
            fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
                let mut array = [0u8; $len];
                u.fill_buffer(&mut array)?;
                Ok(Self(array))
            }
        }
    };
}

/// 20-byte buffer, used for EVM addresses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Buf20([u8; 20]);
impl_buf!(Buf20, 20);

/// 32-byte buffer, used for the protocol's staking keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Buf32([u8; 32]);
impl_buf!(Buf32, 32);
