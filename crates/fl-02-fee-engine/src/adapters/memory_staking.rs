//! In-Memory Staking Oracle
//!
//! Implements the `StakingOracle` port over a settable stake table.

use crate::ports::StakingOracle;
use parking_lot::RwLock;
use shared_types::{Address, U256};
use std::collections::HashMap;

/// Stake table for tests and simulations.
#[derive(Debug, Default)]
pub struct InMemoryStakingOracle {
    stakes: RwLock<HashMap<Address, U256>>,
}

impl InMemoryStakingOracle {
    /// No stakes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stake of `account`.
    pub fn set_stake(&self, account: Address, amount: U256) {
        self.stakes.write().insert(account, amount);
    }
}

impl StakingOracle for InMemoryStakingOracle {
    fn staked_balance(&self, account: Address) -> U256 {
        self.stakes.read().get(&account).copied().unwrap_or_default()
    }
}
