//! # Performance Fee
//!
//! High-water-mark fee crystallised once per period.
//!
//! ## Accrual
//!
//! ```text
//! netSupply         = supply - outstanding
//! aggregateValueDue += (max(HWM, price) - max(HWM, lastPrice)) * netSupply * rate
//! sharesDue         = aggregateValueDue * netSupply / (gav - aggregateValueDue) - outstanding
//! ```
//!
//! Shares outstanding are held by the vault itself; a positive `sharesDue`
//! mints more, a negative one burns some back.
//!
//! ## Payout
//!
//! Once a full period has passed since activation and no payout happened in
//! the current period, outstanding shares are burned from the vault, the
//! owner receives their tiered split as shares and the staking pool and DAO
//! redeem theirs virtually.

use super::decode_settings;
use crate::domain::{
    distribute, FeeContext, FeeHook, FeeState, HookArgs, PerformanceFeeState, Settlement,
    SettlementType, SplitShares,
};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::Fee;
use serde::{Deserialize, Serialize};
use shared_types::math::{self, RATE_DIVISOR, SHARE_UNIT};
use shared_types::{Address, MathError, U256};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Identifier of the performance fee.
pub const IDENTIFIER: &str = "PERFORMANCE";

/// Settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceFeeSettings {
    /// Fee rate, 18 decimals. Must be greater than 0.
    pub rate: U256,
    /// Crystallisation period in seconds. Must be greater than 0.
    pub period: u64,
}

/// High-water-mark performance fee.
#[derive(Debug, Clone)]
pub struct PerformanceFee {
    id: Address,
}

impl PerformanceFee {
    /// Fee module registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }

    /// Gross value of one share; one denomination unit when supply is zero.
    ///
    /// # Errors
    ///
    /// Arithmetic errors.
    pub fn gross_share_value(gav: U256, supply: U256, unit: U256) -> Result<U256, MathError> {
        if supply.is_zero() {
            return Ok(unit);
        }
        math::mul_div(gav, unit, supply)
    }

    /// Aggregate value due after moving from `last_price` to `price`.
    ///
    /// # Errors
    ///
    /// Arithmetic errors.
    pub fn calc_aggregate_value_due(
        fee_state: &PerformanceFeeState,
        net_supply: U256,
        price: U256,
    ) -> Result<U256, MathError> {
        let hwm = fee_state.high_water_mark;
        let next = hwm.max(price);
        let prev = hwm.max(fee_state.last_share_price);
        let value_due = |delta: U256| -> Result<U256, MathError> {
            let value = math::mul_div(delta, net_supply, SHARE_UNIT)?;
            math::mul_div(value, fee_state.rate, RATE_DIVISOR)
        };
        match next.cmp(&prev) {
            Ordering::Greater => {
                math::add(fee_state.aggregate_value_due, value_due(next - prev)?)
            }
            Ordering::Less => Ok(fee_state
                .aggregate_value_due
                .saturating_sub(value_due(prev - next)?)),
            Ordering::Equal => Ok(fee_state.aggregate_value_due),
        }
    }

    /// Period check shared by [`Fee::payout_allowed`] and payouts.
    #[must_use]
    pub fn is_payout_allowed(fee_state: &PerformanceFeeState, now: u64) -> bool {
        if fee_state.period == 0 || now < fee_state.activated {
            return false;
        }
        let since_activation = now - fee_state.activated;
        if since_activation < fee_state.period {
            return false;
        }
        let period_start = now - since_activation % fee_state.period;
        fee_state.last_paid < period_start
    }
}

impl Fee for PerformanceFee {
    fn id(&self) -> Address {
        self.id
    }

    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn settles_on(&self) -> &'static [FeeHook] {
        &[
            FeeHook::Continuous,
            FeeHook::PreBuyShares,
            FeeHook::PreRedeemShares,
        ]
    }

    fn updates_on(&self) -> &'static [FeeHook] {
        &[
            FeeHook::Continuous,
            FeeHook::PostBuyShares,
            FeeHook::PreRedeemShares,
        ]
    }

    fn add_fund_settings(&self, settings: &[u8]) -> Result<FeeState, FeeError> {
        let settings: PerformanceFeeSettings = decode_settings(IDENTIFIER, settings)?;
        if settings.rate.is_zero() {
            return Err(FeeError::InvalidSettings {
                fee: IDENTIFIER,
                reason: "feeRate must be greater than 0".into(),
            });
        }
        if settings.period == 0 {
            return Err(FeeError::InvalidSettings {
                fee: IDENTIFIER,
                reason: "feePeriod must be greater than 0".into(),
            });
        }
        Ok(FeeState::Performance(PerformanceFeeState {
            rate: settings.rate,
            period: settings.period,
            ..PerformanceFeeState::default()
        }))
    }

    fn activate_for_fund(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
    ) -> Result<(), FeeError> {
        let gav = ctx.calc_gav()?;
        let price =
            Self::gross_share_value(gav, ctx.vault.total_supply(), ctx.denomination_unit())?;
        let fee_state = state.as_performance_mut(IDENTIFIER)?;
        fee_state.activated = ctx.now;
        fee_state.high_water_mark = price;
        fee_state.last_share_price = price;
        Ok(())
    }

    fn settle(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        _hook: FeeHook,
        _args: &HookArgs,
    ) -> Result<Settlement, FeeError> {
        let fee_state = state.as_performance_mut(IDENTIFIER)?;
        let supply = ctx.vault.total_supply();
        let outstanding = ctx.shares_outstanding();
        if supply.is_zero() || supply == outstanding {
            return Ok(Settlement::none());
        }
        let gav = ctx.calc_gav()?;
        if gav.is_zero() {
            return Ok(Settlement::none());
        }

        let net_supply = supply - outstanding;
        let price = Self::gross_share_value(gav, supply, ctx.denomination_unit())?;
        let value_due = Self::calc_aggregate_value_due(fee_state, net_supply, price)?;
        fee_state.aggregate_value_due = value_due;

        let target = if value_due.is_zero() {
            U256::zero()
        } else {
            math::mul_div(value_due, net_supply, math::sub(gav, value_due)?)?
        };

        let vault_address = ctx.vault.address();
        let settlement = match target.cmp(&outstanding) {
            Ordering::Greater => {
                let diff = target - outstanding;
                ctx.vault
                    .mint_shares(ctx.comptroller, vault_address, diff)?;
                Settlement::new(SettlementType::MintSharesOutstanding, diff)
            }
            Ordering::Less => {
                let diff = outstanding - target;
                ctx.vault
                    .burn_shares(ctx.comptroller, vault_address, diff)?;
                Settlement::new(SettlementType::BurnSharesOutstanding, diff)
            }
            Ordering::Equal => return Ok(Settlement::none()),
        };

        ctx.emit(FeeEvent::PerformanceUpdated {
            aggregate_value_due: value_due,
            prev_shares_outstanding: outstanding,
            next_shares_outstanding: target,
        });
        debug!(%value_due, %outstanding, %target, "Performance fee shares outstanding updated");
        Ok(settlement)
    }

    fn update(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        hook: FeeHook,
        args: &HookArgs,
    ) -> Result<(), FeeError> {
        let mut gav = ctx.calc_gav()?;
        let mut supply = ctx.vault.total_supply();
        if hook == FeeHook::PreRedeemShares && !supply.is_zero() {
            let redeemed = args.shares_quantity.min(supply);
            gav = math::sub(gav, math::mul_div(gav, redeemed, supply)?)?;
            supply -= redeemed;
        }
        let next = Self::gross_share_value(gav, supply, ctx.denomination_unit())?;

        let fee_state = state.as_performance_mut(IDENTIFIER)?;
        let prev = fee_state.last_share_price;
        if next != prev {
            fee_state.last_share_price = next;
            ctx.emit(FeeEvent::LastSharePriceUpdated { prev, next });
        }
        Ok(())
    }

    fn payout_allowed(&self, state: &FeeState, now: u64) -> bool {
        state
            .as_performance(IDENTIFIER)
            .map(|s| Self::is_payout_allowed(s, now))
            .unwrap_or(false)
    }

    fn payout(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        forced: bool,
    ) -> Result<bool, FeeError> {
        let fee_state = state.as_performance_mut(IDENTIFIER)?;
        if !forced && !Self::is_payout_allowed(fee_state, ctx.now) {
            return Ok(false);
        }
        fee_state.last_paid = ctx.now;
        fee_state.high_water_mark = fee_state.high_water_mark.max(fee_state.last_share_price);
        fee_state.aggregate_value_due = U256::zero();
        let high_water_mark = fee_state.high_water_mark;

        let outstanding = ctx.shares_outstanding();
        if outstanding.is_zero() {
            return Ok(true);
        }

        let vault_address = ctx.vault.address();
        ctx.vault
            .burn_shares(ctx.comptroller, vault_address, outstanding)?;
        let staked = ctx.staking.staked_balance(ctx.vault.owner());
        let owner_split = ctx.env.performance_split.owner_split(staked);
        let split = SplitShares::with_owner_split(outstanding, owner_split)?;
        distribute(ctx, &split)?;

        ctx.emit(FeeEvent::PerformancePaidOut {
            high_water_mark,
            shares_outstanding: outstanding,
            owner_shares: split.owner,
            staking_shares: split.staking,
            dao_shares: split.dao,
        });
        info!(%outstanding, forced, "Performance fee paid out");
        Ok(true)
    }

    fn parameter_values(&self, state: &FeeState) -> Vec<U256> {
        state
            .as_performance(IDENTIFIER)
            .map(|s| vec![s.rate, U256::from(s.period)])
            .unwrap_or_default()
    }
}
