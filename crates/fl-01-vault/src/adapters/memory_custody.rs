//! In-Memory Custody Adapter
//!
//! Implements the `AssetCustody` port over a balance map. Assets can be
//! paused, recipients blocked and per-asset transfer hooks installed to
//! imitate externally authored tokens that call back into the engine.

use crate::errors::CustodyError;
use crate::ports::AssetCustody;
use parking_lot::RwLock;
use shared_types::{math, Address, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Callback run before an asset transfer is applied. Returning an error
/// aborts the transfer.
pub type TransferHook =
    Arc<dyn Fn(Address, Address, U256) -> Result<(), CustodyError> + Send + Sync>;

/// In-memory token balances.
#[derive(Default)]
pub struct InMemoryCustody {
    balances: RwLock<HashMap<(Address, Address), U256>>,
    decimals: RwLock<HashMap<Address, u8>>,
    paused: RwLock<HashSet<Address>>,
    blocked: RwLock<HashSet<Address>>,
    hooks: RwLock<HashMap<Address, TransferHook>>,
}

impl InMemoryCustody {
    /// Empty custody.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` of `asset` to `holder` out of thin air.
    pub fn mint(&self, asset: Address, holder: Address, amount: U256) {
        let mut balances = self.balances.write();
        let entry = balances.entry((asset, holder)).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Overrides the decimals reported for `asset`.
    pub fn set_decimals(&self, asset: Address, decimals: u8) {
        self.decimals.write().insert(asset, decimals);
    }

    /// Makes every transfer of `asset` fail.
    pub fn pause(&self, asset: Address) {
        self.paused.write().insert(asset);
    }

    /// Re-enables transfers of `asset`.
    pub fn unpause(&self, asset: Address) {
        self.paused.write().remove(&asset);
    }

    /// Makes `recipient` reject every incoming transfer.
    pub fn block_recipient(&self, recipient: Address) {
        self.blocked.write().insert(recipient);
    }

    /// Lifts a recipient block.
    pub fn unblock_recipient(&self, recipient: Address) {
        self.blocked.write().remove(&recipient);
    }

    /// Installs a hook run on every transfer of `asset`.
    pub fn set_hook(&self, asset: Address, hook: TransferHook) {
        self.hooks.write().insert(asset, hook);
    }

    /// Removes the hook on `asset`.
    pub fn clear_hook(&self, asset: Address) {
        self.hooks.write().remove(&asset);
    }
}

impl AssetCustody for InMemoryCustody {
    fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        self.balances
            .read()
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), CustodyError> {
        if self.paused.read().contains(&asset) {
            return Err(CustodyError::TransfersPaused(asset));
        }
        if self.blocked.read().contains(&to) {
            return Err(CustodyError::RecipientRejected(to));
        }

        // The hook may re-enter the engine, which reads balances.
        let hook = self.hooks.read().get(&asset).cloned();
        if let Some(hook) = hook {
            hook(from, to, amount)?;
        }

        let mut balances = self.balances.write();
        let available = balances.get(&(asset, from)).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientBalance {
                asset,
                holder: from,
                required: amount,
                available,
            })?;
        if from != to {
            let credited = balances.get(&(asset, to)).copied().unwrap_or_default();
            let credited = math::add(credited, amount).map_err(|err| CustodyError::Callback {
                kind: err.kind(),
                message: err.to_string(),
            })?;
            balances.insert((asset, from), remaining);
            balances.insert((asset, to), credited);
        }
        trace!(?asset, ?from, ?to, %amount, "custody transfer");
        Ok(())
    }

    fn decimals(&self, asset: Address) -> u8 {
        self.decimals.read().get(&asset).copied().unwrap_or(18)
    }
}
