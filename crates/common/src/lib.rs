//! Crate includes reusable utils for services that embed the transaction builders.
//! Such as initializing the tracing framework.

pub mod logging;
