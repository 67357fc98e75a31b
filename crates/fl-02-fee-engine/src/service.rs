//! # Fee Manager
//!
//! Registry of fee modules plus the per-fund dispatch logic: configuring a
//! fund's fees, activating them and invoking hooks in settlement order.
//!
//! The registry is shared by every comptroller; registration is gated by the
//! protocol controller that owns the manager.

use crate::domain::{FeeContext, FeeHook, FeeState, FundFeeConfig, HookArgs, Settlement};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::Fee;
use parking_lot::RwLock;
use shared_types::{has_duplicates, Address, U256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shared registry and dispatcher of fee modules.
#[derive(Default)]
pub struct FeeManager {
    fees: RwLock<BTreeMap<Address, Arc<dyn Fee>>>,
}

impl FeeManager {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Registers fee modules.
    ///
    /// # Errors
    ///
    /// `EmptyFeeList`, `DuplicateFees`, or `AlreadyRegistered`. Nothing is
    /// registered on error.
    pub fn register_fees(&self, fees: Vec<Arc<dyn Fee>>) -> Result<(), FeeError> {
        if fees.is_empty() {
            return Err(FeeError::EmptyFeeList);
        }
        let ids: Vec<Address> = fees.iter().map(|fee| fee.id()).collect();
        if has_duplicates(&ids) {
            return Err(FeeError::DuplicateFees);
        }
        let mut registry = self.fees.write();
        if let Some(id) = ids.iter().find(|id| registry.contains_key(id)) {
            return Err(FeeError::AlreadyRegistered(*id));
        }
        for fee in fees {
            info!(fee = ?fee.id(), identifier = fee.identifier(), "Fee registered");
            registry.insert(fee.id(), fee);
        }
        Ok(())
    }

    /// Removes fee modules. Funds that already enabled them keep their state.
    ///
    /// # Errors
    ///
    /// `EmptyFeeList` or `NotRegistered`. Nothing is removed on error.
    pub fn deregister_fees(&self, ids: &[Address]) -> Result<(), FeeError> {
        if ids.is_empty() {
            return Err(FeeError::EmptyFeeList);
        }
        let mut registry = self.fees.write();
        if let Some(id) = ids.iter().find(|id| !registry.contains_key(id)) {
            return Err(FeeError::NotRegistered(*id));
        }
        for id in ids {
            registry.remove(id);
            info!(fee = ?id, "Fee deregistered");
        }
        Ok(())
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: Address) -> bool {
        self.fees.read().contains_key(&id)
    }

    /// Registered fee ids.
    #[must_use]
    pub fn registered(&self) -> Vec<Address> {
        self.fees.read().keys().copied().collect()
    }

    /// Module registered under `id`.
    #[must_use]
    pub fn fee(&self, id: Address) -> Option<Arc<dyn Fee>> {
        self.fees.read().get(&id).cloned()
    }

    fn require(&self, id: Address) -> Result<Arc<dyn Fee>, FeeError> {
        self.fee(id).ok_or(FeeError::NotRegistered(id))
    }

    // =========================================================================
    // PER-FUND CONFIGURATION
    // =========================================================================

    /// Parses the settings of every fee a new fund enables. An empty list
    /// yields an empty configuration.
    ///
    /// # Errors
    ///
    /// `LengthMismatch`, `DuplicateFees`, `NotRegistered`, or the fee's own
    /// settings validation error.
    pub fn set_config_for_fund(
        &self,
        fees: &[Address],
        settings: &[Vec<u8>],
    ) -> Result<(FundFeeConfig, Vec<FeeEvent>), FeeError> {
        if fees.len() != settings.len() {
            return Err(FeeError::LengthMismatch {
                fees: fees.len(),
                settings: settings.len(),
            });
        }
        if has_duplicates(fees) {
            return Err(FeeError::DuplicateFees);
        }

        let mut config = FundFeeConfig::new();
        let mut events = Vec::with_capacity(fees.len());
        for (id, payload) in fees.iter().zip(settings) {
            let fee = self.require(*id)?;
            let state = fee.add_fund_settings(payload)?;
            events.push(FeeEvent::FundSettingsAdded {
                fee: *id,
                parameters: fee.parameter_values(&state),
            });
            config.insert(*id, state);
        }
        Ok((config, events))
    }

    /// Parameter values of `fee` as enabled in `config`, for bound checks.
    ///
    /// # Errors
    ///
    /// `NotRegistered` or `NotEnabled`.
    pub fn parameter_values(
        &self,
        config: &FundFeeConfig,
        fee: Address,
    ) -> Result<Vec<U256>, FeeError> {
        let module = self.require(fee)?;
        let state = config.state(fee).ok_or(FeeError::NotEnabled(fee))?;
        Ok(module.parameter_values(state))
    }

    /// Activates every enabled fee, in order.
    ///
    /// # Errors
    ///
    /// The first activation failure.
    pub fn activate_for_fund(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        config: &mut FundFeeConfig,
    ) -> Result<(), FeeError> {
        for id in config.enabled().to_vec() {
            let fee = self.require(id)?;
            with_state(config, id, |state| fee.activate_for_fund(ctx, state))?;
            ctx.emit(FeeEvent::ActivatedForFund { fee: id });
        }
        Ok(())
    }

    // =========================================================================
    // HOOKS
    // =========================================================================

    /// Settles every enabled fee that settles on `hook`, then updates every
    /// enabled fee that updates on it.
    ///
    /// # Errors
    ///
    /// The first fee failure; the caller discards the staged state.
    #[instrument(skip(self, ctx, config, args), fields(fees = config.enabled().len()))]
    pub fn invoke_hook(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        config: &mut FundFeeConfig,
        hook: FeeHook,
        args: &HookArgs,
    ) -> Result<Vec<(Address, Settlement)>, FeeError> {
        let modules = config
            .enabled()
            .iter()
            .map(|id| self.require(*id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut settlements = Vec::new();
        for fee in modules.iter().filter(|fee| fee.settles_on().contains(&hook)) {
            let settlement = with_state(config, fee.id(), |state| {
                fee.settle(ctx, state, hook, args)
            })?;
            if settlement != Settlement::none() {
                ctx.emit(FeeEvent::Settled {
                    fee: fee.id(),
                    hook,
                    settlement: settlement.kind,
                    amount: settlement.amount,
                });
                settlements.push((fee.id(), settlement));
            }
        }
        for fee in modules.iter().filter(|fee| fee.updates_on().contains(&hook)) {
            with_state(config, fee.id(), |state| fee.update(ctx, state, hook, args))?;
        }
        debug!(?hook, settled = settlements.len(), "Fee hook invoked");
        Ok(settlements)
    }

    /// Pays out shares outstanding for `fees` whose period allows it.
    /// Returns the fees that paid.
    ///
    /// # Errors
    ///
    /// `NotEnabled` for a fee the fund does not use, or a payout failure.
    pub fn payout_shares_outstanding(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        config: &mut FundFeeConfig,
        fees: &[Address],
    ) -> Result<Vec<Address>, FeeError> {
        let mut paid = Vec::new();
        for id in fees {
            if !config.is_enabled(*id) {
                return Err(FeeError::NotEnabled(*id));
            }
            let fee = self.require(*id)?;
            if with_state(config, *id, |state| fee.payout(ctx, state, false))? {
                paid.push(*id);
            }
        }
        Ok(paid)
    }

    /// Final settlement before a fund migrates away: a continuous settle of
    /// every fee followed by a payout that ignores crystallisation periods.
    ///
    /// # Errors
    ///
    /// The first settlement or payout failure.
    #[instrument(skip_all)]
    pub fn settle_for_migration(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        config: &mut FundFeeConfig,
    ) -> Result<(), FeeError> {
        self.invoke_hook(ctx, config, FeeHook::Continuous, &HookArgs::continuous())?;
        for id in config.enabled().to_vec() {
            let fee = self.require(id)?;
            with_state(config, id, |state| fee.payout(ctx, state, true))?;
        }
        info!("Fees settled for migration");
        Ok(())
    }

    /// Whether `fee` could pay out now for a fund using `config`.
    #[must_use]
    pub fn payout_allowed(&self, config: &FundFeeConfig, fee: Address, now: u64) -> bool {
        match (self.fee(fee), config.state(fee)) {
            (Some(module), Some(state)) => module.payout_allowed(state, now),
            _ => false,
        }
    }
}

/// Runs `f` on the state of `fee`, always putting the state back.
fn with_state<T>(
    config: &mut FundFeeConfig,
    fee: Address,
    f: impl FnOnce(&mut FeeState) -> Result<T, FeeError>,
) -> Result<T, FeeError> {
    let mut state = config.take(fee)?;
    let result = f(&mut state);
    config.restore(fee, state);
    result
}
