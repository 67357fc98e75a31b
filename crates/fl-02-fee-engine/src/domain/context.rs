//! # Settlement Context
//!
//! Everything a fee may read or mutate during one hook invocation, borrowed
//! from the comptroller's staged fund state.

use crate::domain::{FeeEnvironment, LockedBalances, ReferralBook};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::{GavSource, StakingOracle};
use fl_01_vault::{CustodyTx, SwapRouter, VaultState};
use shared_types::{math, Address, U256};

/// Mutable view of a fund handed to fee modules.
pub struct FeeContext<'a, 'c> {
    /// The comptroller driving the vault (its accessor).
    pub comptroller: Address,
    /// Staged vault record.
    pub vault: &'a mut VaultState,
    /// Journaled custody.
    pub custody: &'a mut CustodyTx<'c>,
    /// Router for asset swaps.
    pub router: &'a dyn SwapRouter,
    /// Stake lookups for tiered splits.
    pub staking: &'a dyn StakingOracle,
    /// Gross asset value calculator.
    pub gav: &'a dyn GavSource,
    /// Investment-fee locked balances of the vault.
    pub locked: &'a mut LockedBalances,
    /// Referral book of the vault.
    pub referrals: &'a ReferralBook,
    /// Protocol-wide fee parameters.
    pub env: &'a FeeEnvironment,
    /// Call timestamp.
    pub now: u64,
    /// Collected events.
    pub events: &'a mut Vec<FeeEvent>,
}

impl FeeContext<'_, '_> {
    /// Gross asset value of the vault right now.
    ///
    /// # Errors
    ///
    /// `Valuation` when an asset cannot be priced.
    pub fn calc_gav(&self) -> Result<U256, FeeError> {
        self.gav.calc_gav(&*self.vault, &*self.custody)
    }

    /// One unit of the denomination asset.
    #[must_use]
    pub fn denomination_unit(&self) -> U256 {
        math::unit(self.custody.decimals(self.vault.denomination_asset()))
    }

    /// Shares held by the vault itself (performance fee outstanding).
    #[must_use]
    pub fn shares_outstanding(&self) -> U256 {
        self.vault.balance_of(self.vault.address())
    }

    /// Emits `event`.
    pub fn emit(&mut self, event: FeeEvent) {
        self.events.push(event);
    }
}
