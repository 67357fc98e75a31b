//! # Driven Ports (SPI - Outbound)
//!
//! [`Fee`] is the plug-in seam: the fee manager keeps a registry of fee
//! modules keyed by id and dispatches hooks to them. [`StakingOracle`] and
//! [`GavSource`] are collaborators fees read during settlement.

use crate::domain::{FeeContext, FeeHook, FeeState, HookArgs, Settlement};
use crate::errors::FeeError;
use fl_01_vault::{CustodyTx, VaultState};
use shared_types::{Address, U256};

// =============================================================================
// FEE MODULE
// =============================================================================

/// A pluggable fee.
///
/// Implementations are stateless; everything per fund lives in the
/// [`FeeState`] the manager hands back on every call.
pub trait Fee: Send + Sync {
    /// Registry id.
    fn id(&self) -> Address;

    /// Stable human readable identifier, e.g. `MANAGEMENT`.
    fn identifier(&self) -> &'static str;

    /// Hooks on which [`Fee::settle`] runs.
    fn settles_on(&self) -> &'static [FeeHook];

    /// Hooks on which [`Fee::update`] runs.
    fn updates_on(&self) -> &'static [FeeHook] {
        &[]
    }

    /// Parses a fund's settings payload into its initial state.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` for a malformed or out-of-domain payload.
    fn add_fund_settings(&self, settings: &[u8]) -> Result<FeeState, FeeError>;

    /// Runs once when the fund's comptroller becomes active.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn activate_for_fund(
        &self,
        _ctx: &mut FeeContext<'_, '_>,
        _state: &mut FeeState,
    ) -> Result<(), FeeError> {
        Ok(())
    }

    /// Settles whatever is due on `hook`.
    ///
    /// # Errors
    ///
    /// Implementation specific; an error aborts the triggering action.
    fn settle(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        hook: FeeHook,
        args: &HookArgs,
    ) -> Result<Settlement, FeeError>;

    /// Refreshes tracking data after `hook`.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn update(
        &self,
        _ctx: &mut FeeContext<'_, '_>,
        _state: &mut FeeState,
        _hook: FeeHook,
        _args: &HookArgs,
    ) -> Result<(), FeeError> {
        Ok(())
    }

    /// Whether shares outstanding may be paid out now.
    fn payout_allowed(&self, _state: &FeeState, _now: u64) -> bool {
        false
    }

    /// Pays out shares outstanding. `forced` skips the period check (used
    /// when the fund migrates away). Returns whether anything was paid.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn payout(
        &self,
        _ctx: &mut FeeContext<'_, '_>,
        _state: &mut FeeState,
        _forced: bool,
    ) -> Result<bool, FeeError> {
        Ok(false)
    }

    /// Parameter values in a fixed order, checked against protocol bounds.
    fn parameter_values(&self, state: &FeeState) -> Vec<U256>;
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Staked balances used for tiered splits.
pub trait StakingOracle: Send + Sync {
    /// Tokens `account` has staked.
    fn staked_balance(&self, account: Address) -> U256;
}

/// Gross asset value of a vault in its denomination asset.
pub trait GavSource {
    /// GAV of `vault` using balances seen through `custody`.
    ///
    /// # Errors
    ///
    /// `Valuation` when an asset cannot be priced.
    fn calc_gav(&self, vault: &VaultState, custody: &CustodyTx<'_>) -> Result<U256, FeeError>;
}
