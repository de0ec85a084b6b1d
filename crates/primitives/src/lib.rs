//! Collection of generic data types shared by the staking bridge crates.

pub mod buf;
pub mod errors;
pub mod l1;
