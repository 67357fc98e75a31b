//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementation of the staking oracle port.

mod memory_staking;

pub use memory_staking::InMemoryStakingOracle;
