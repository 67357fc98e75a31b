//! # Share Ledger
//!
//! Fungible share balances for one vault. Pure bookkeeping: the capability
//! checks live on [`VaultState`](super::vault::VaultState).

use crate::errors::VaultError;
use serde::{Deserialize, Serialize};
use shared_types::math;
use shared_types::{Address, U256};
use std::collections::BTreeMap;

/// Holder balances plus the total supply they sum to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
}

impl ShareLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total shares in existence.
    #[must_use]
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Shares held by `holder`.
    #[must_use]
    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    /// Holders with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.balances.iter().map(|(holder, amount)| (*holder, *amount))
    }

    /// Creates `amount` shares for `holder`.
    ///
    /// # Errors
    ///
    /// `Math(Overflow)` past `U256::MAX`.
    pub fn mint(&mut self, holder: Address, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        let supply = math::add(self.total_supply, amount)?;
        let balance = math::add(self.balance_of(holder), amount)?;
        self.total_supply = supply;
        self.balances.insert(holder, balance);
        Ok(())
    }

    /// Destroys `amount` shares held by `holder`.
    ///
    /// # Errors
    ///
    /// `InsufficientShares` when `amount` exceeds the holder's balance.
    pub fn burn(&mut self, holder: Address, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        let remaining = self.debit_amount(holder, amount)?;
        self.total_supply = math::sub(self.total_supply, amount)?;
        self.set_balance(holder, remaining);
        Ok(())
    }

    /// Moves `amount` shares between holders.
    ///
    /// # Errors
    ///
    /// `InsufficientShares` when `from` holds less than `amount`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() || from == to {
            return self.debit_amount(from, amount).map(|_| ());
        }
        let remaining = self.debit_amount(from, amount)?;
        let credited = math::add(self.balance_of(to), amount)?;
        self.set_balance(from, remaining);
        self.balances.insert(to, credited);
        Ok(())
    }

    fn debit_amount(&self, holder: Address, amount: U256) -> Result<U256, VaultError> {
        let available = self.balance_of(holder);
        available
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientShares {
                holder,
                required: amount,
                available,
            })
    }

    fn set_balance(&mut self, holder: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, amount);
        }
    }
}
