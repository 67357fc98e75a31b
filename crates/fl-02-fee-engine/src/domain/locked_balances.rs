//! # Locked Balances
//!
//! Per-vault record of investment-fee tokens that trading may not spend.
//! The record travels with the vault, so a migration leaves it untouched.

use serde::{Deserialize, Serialize};
use shared_types::{math, Address, MathError, U256};
use std::collections::BTreeMap;

/// Locked amount per token for one vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalances {
    locked: BTreeMap<Address, U256>,
}

impl LockedBalances {
    /// Nothing locked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locked amount of `token`.
    #[must_use]
    pub fn locked(&self, token: Address) -> U256 {
        self.locked.get(&token).copied().unwrap_or_default()
    }

    /// Part of `balance` that is free to spend.
    #[must_use]
    pub fn spendable(&self, token: Address, balance: U256) -> U256 {
        balance.saturating_sub(self.locked(token))
    }

    /// Adds `amount` to the locked balance of `token` and returns the new total.
    ///
    /// # Errors
    ///
    /// `Overflow`.
    pub fn lock(&mut self, token: Address, amount: U256) -> Result<U256, MathError> {
        let total = math::add(self.locked(token), amount)?;
        self.set(token, total);
        Ok(total)
    }

    /// Releases `locked * numerator / denominator` of `token` and returns the
    /// released amount.
    ///
    /// # Errors
    ///
    /// `DivisionByZero` for a zero denominator.
    pub fn release_proportional(
        &mut self,
        token: Address,
        numerator: U256,
        denominator: U256,
    ) -> Result<U256, MathError> {
        let current = self.locked(token);
        if current.is_zero() {
            return Ok(U256::zero());
        }
        let released = math::mul_div(current, numerator, denominator)?.min(current);
        self.set(token, current - released);
        Ok(released)
    }

    /// Iterates over tokens with a non-zero lock.
    pub fn iter(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.locked.iter().map(|(token, amount)| (*token, *amount))
    }

    fn set(&mut self, token: Address, amount: U256) {
        if amount.is_zero() {
            self.locked.remove(&token);
        } else {
            self.locked.insert(token, amount);
        }
    }
}
