//! # Management Fee
//!
//! Continuous, time-based fee compounding at a per-second rate:
//!
//! ```text
//! sharesDue = netSupply * (rpow(rate, Δt, 1e27) - 1e27) / 1e27
//! ```
//!
//! The owner's portion is minted; the staking pool and DAO portions are
//! virtually redeemed for vault assets.

use super::decode_settings;
use crate::domain::{
    distribute, FeeContext, FeeHook, FeeState, HookArgs, ManagementFeeState, Settlement,
    SettlementType, SplitShares,
};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::Fee;
use serde::{Deserialize, Serialize};
use shared_types::math::{self, RATE_SCALE};
use shared_types::{Address, MathError, U256};
use tracing::debug;

/// Identifier of the management fee.
pub const IDENTIFIER: &str = "MANAGEMENT";

/// Settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementFeeSettings {
    /// Per-second compounding factor, 27 decimals. Must be greater than 0.
    pub scaled_per_second_rate: U256,
}

/// Continuous management fee.
#[derive(Debug, Clone)]
pub struct ManagementFee {
    id: Address,
}

impl ManagementFee {
    /// Fee module registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }

    /// Shares due on `net_supply` after `seconds` at `rate`.
    ///
    /// # Errors
    ///
    /// Arithmetic errors.
    pub fn calc_shares_due(
        rate: U256,
        net_supply: U256,
        seconds: u64,
    ) -> Result<U256, MathError> {
        let factor = math::rpow(rate, seconds, RATE_SCALE)?;
        let growth = factor.saturating_sub(RATE_SCALE);
        math::mul_div(net_supply, growth, RATE_SCALE)
    }
}

impl Fee for ManagementFee {
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

    fn add_fund_settings(&self, settings: &[u8]) -> Result<FeeState, FeeError> {
        let settings: ManagementFeeSettings = decode_settings(IDENTIFIER, settings)?;
        if settings.scaled_per_second_rate.is_zero() {
            return Err(FeeError::InvalidSettings {
                fee: IDENTIFIER,
                reason: "scaledPerSecondRate must be greater than 0".into(),
            });
        }
        Ok(FeeState::Management(ManagementFeeState {
            scaled_per_second_rate: settings.scaled_per_second_rate,
            last_settled: 0,
        }))
    }

    fn activate_for_fund(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
    ) -> Result<(), FeeError> {
        let fee_state = state.as_management_mut(IDENTIFIER)?;
        // A migrated fund already has shares; accrual restarts now.
        if !ctx.vault.total_supply().is_zero() {
            fee_state.last_settled = ctx.now;
        }
        Ok(())
    }

    fn settle(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        _hook: FeeHook,
        _args: &HookArgs,
    ) -> Result<Settlement, FeeError> {
        let fee_state = state.as_management_mut(IDENTIFIER)?;
        let last_settled = fee_state.last_settled;
        if ctx.now <= last_settled {
            return Ok(Settlement::none());
        }
        let net_supply = math::sub(ctx.vault.total_supply(), ctx.shares_outstanding())?;
        fee_state.last_settled = ctx.now;
        if last_settled == 0 || net_supply.is_zero() {
            return Ok(Settlement::none());
        }

        let seconds = ctx.now - last_settled;
        let shares_due =
            Self::calc_shares_due(fee_state.scaled_per_second_rate, net_supply, seconds)?;
        if shares_due.is_zero() {
            return Ok(Settlement::none());
        }

        let split = SplitShares::with_management_split(shares_due, &ctx.env.management_split)?;
        distribute(ctx, &split)?;
        ctx.emit(FeeEvent::ManagementFeeSettled {
            shares_due,
            owner_shares: split.owner,
            staking_shares: split.staking,
            dao_shares: split.dao,
            seconds_since_settlement: seconds,
        });
        debug!(%shares_due, seconds, "Management fee settled");
        Ok(Settlement::new(SettlementType::Mint, shares_due))
    }

    fn parameter_values(&self, state: &FeeState) -> Vec<U256> {
        state
            .as_management(IDENTIFIER)
            .map(|s| vec![s.scaled_per_second_rate])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::test_support::Fixture;
    use shared_types::math::{ether, from_dec, SECONDS_PER_YEAR};

    fn one_percent() -> U256 {
        from_dec("1000000000318694059332284760").unwrap()
    }

    fn enabled() -> FeeState {
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let payload = serde_json::to_vec(&ManagementFeeSettings {
            scaled_per_second_rate: one_percent(),
        })
        .unwrap();
        fee.add_fund_settings(&payload).unwrap()
    }

    #[test]
    fn test_zero_rate_rejected() {
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let payload = serde_json::to_vec(&ManagementFeeSettings {
            scaled_per_second_rate: U256::zero(),
        })
        .unwrap();
        assert!(matches!(
            fee.add_fund_settings(&payload),
            Err(FeeError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn test_one_year_shares_due() {
        let due = ManagementFee::calc_shares_due(one_percent(), ether(1), SECONDS_PER_YEAR).unwrap();
        assert_eq!(due, U256::from(10_101_010_101_010_100u64));
    }

    #[test]
    fn test_first_settlement_only_records_time() {
        let mut fixture = Fixture::new();
        fixture.seed_fund(ether(1), ether(1));
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let mut state = enabled();

        let settlement = fixture
            .with_ctx(|ctx| fee.settle(ctx, &mut state, FeeHook::Continuous, &HookArgs::continuous()))
            .unwrap();
        assert_eq!(settlement, Settlement::none());
        assert_eq!(
            state.as_management(IDENTIFIER).unwrap().last_settled,
            fixture.now
        );
        assert_eq!(fixture.vault.total_supply(), ether(1));
    }

    #[test]
    fn test_zero_elapsed_is_noop() {
        let mut fixture = Fixture::new();
        fixture.seed_fund(ether(1), ether(1));
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let mut state = enabled();
        state.as_management_mut(IDENTIFIER).unwrap().last_settled = fixture.now;

        let settlement = fixture
            .with_ctx(|ctx| fee.settle(ctx, &mut state, FeeHook::Continuous, &HookArgs::continuous()))
            .unwrap();
        assert_eq!(settlement.kind, SettlementType::None);
        assert!(fixture.events.is_empty());
    }

    #[test]
    fn test_one_year_distribution() {
        let mut fixture = Fixture::new();
        fixture.seed_fund(ether(1), ether(1));
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let mut state = enabled();
        state.as_management_mut(IDENTIFIER).unwrap().last_settled = fixture.now;
        fixture.now += SECONDS_PER_YEAR;

        let settlement = fixture
            .with_ctx(|ctx| fee.settle(ctx, &mut state, FeeHook::Continuous, &HookArgs::continuous()))
            .unwrap();

        let due = U256::from(10_101_010_101_010_100u64);
        assert_eq!(settlement, Settlement::new(SettlementType::Mint, due));
        let owner_shares = fixture.vault.balance_of(fixture.vault.owner());
        assert_eq!(owner_shares, U256::from(5_050_505_050_505_050u64));
        assert!(fixture.events.iter().any(|e| matches!(
            e,
            FeeEvent::ManagementFeeSettled { shares_due, owner_shares, staking_shares, dao_shares, .. }
                if *shares_due == due && *owner_shares + *staking_shares + *dao_shares == due
        )));

        let ratio = math::mul_div(owner_shares, ether(1), fixture.vault.total_supply()).unwrap();
        let expected = from_dec("5025125628140703").unwrap();
        let diff = if ratio > expected { ratio - expected } else { expected - ratio };
        assert!(diff < U256::from(10));

        assert_eq!(
            fixture.custody_balance(fixture.env.staking_pool),
            U256::from(2_506_265_664_160_400u64)
        );
        assert_eq!(
            fixture.custody_balance(fixture.env.dao),
            U256::from(2_499_984_296_581_051u64)
        );
    }

    #[test]
    fn test_failed_recipient_gets_shares() {
        let mut fixture = Fixture::new();
        fixture.seed_fund(ether(1), ether(1));
        fixture.custody.block_recipient(fixture.env.dao);
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let mut state = enabled();
        state.as_management_mut(IDENTIFIER).unwrap().last_settled = fixture.now;
        fixture.now += SECONDS_PER_YEAR;

        fixture
            .with_ctx(|ctx| fee.settle(ctx, &mut state, FeeHook::Continuous, &HookArgs::continuous()))
            .unwrap();

        assert_eq!(
            fixture.vault.balance_of(fixture.env.dao),
            U256::from(2_525_252_525_252_525u64)
        );
        assert!(fixture.custody_balance(fixture.env.dao).is_zero());
        assert!(fixture
            .events
            .iter()
            .any(|e| matches!(e, FeeEvent::FallbackSharesMinted { .. })));
    }

    #[test]
    fn test_migrated_activation_restarts_accrual() {
        let mut fixture = Fixture::new();
        fixture.seed_fund(ether(1), ether(1));
        let fee = ManagementFee::new(Address::repeat_byte(0xF1));
        let mut state = enabled();
        fixture
            .with_ctx(|ctx| fee.activate_for_fund(ctx, &mut state))
            .unwrap();
        assert_eq!(
            state.as_management(IDENTIFIER).unwrap().last_settled,
            fixture.now
        );
    }
}
