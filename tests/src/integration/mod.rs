//! Cross-crate integration scenarios.

pub mod atomicity;
pub mod concurrency;
pub mod fee_flows;
pub mod invariants;
pub mod migration;
pub mod policy_flows;
