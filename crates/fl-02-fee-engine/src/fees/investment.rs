//! # Investment Fee
//!
//! One-shot fee on purchases: `investment * rate / 1e18` of the
//! denomination asset is swapped into the protocol's investment token and
//! locked in the vault. Locked tokens count towards GAV but trading cannot
//! spend them; redemptions and fee payouts release them proportionally.

use super::decode_settings;
use crate::domain::{
    FeeContext, FeeHook, FeeState, HookArgs, InvestmentFeeState, Settlement, SettlementType,
};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::Fee;
use fl_01_vault::SwapOrder;
use serde::{Deserialize, Serialize};
use shared_types::math::{self, RATE_DIVISOR};
use shared_types::{Address, U256};
use tracing::info;

/// Identifier of the investment fee.
pub const IDENTIFIER: &str = "INVESTMENT";

/// Settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentFeeSettings {
    /// Fee rate, 18 decimals. Must be greater than 0.
    pub rate: U256,
}

/// Investment fee locking part of every purchase.
#[derive(Debug, Clone)]
pub struct InvestmentFee {
    id: Address,
}

impl InvestmentFee {
    /// Fee module registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }
}

impl Fee for InvestmentFee {
    fn id(&self) -> Address {
        self.id
    }

    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn settles_on(&self) -> &'static [FeeHook] {
        &[FeeHook::PostBuyShares]
    }

    fn add_fund_settings(&self, settings: &[u8]) -> Result<FeeState, FeeError> {
        let settings: InvestmentFeeSettings = decode_settings(IDENTIFIER, settings)?;
        if settings.rate.is_zero() {
            return Err(FeeError::InvalidSettings {
                fee: IDENTIFIER,
                reason: "feeRate must be greater than 0".into(),
            });
        }
        Ok(FeeState::Investment(InvestmentFeeState {
            rate: settings.rate,
        }))
    }

    fn settle(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        _hook: FeeHook,
        args: &HookArgs,
    ) -> Result<Settlement, FeeError> {
        let rate = state.as_investment(IDENTIFIER)?.rate;
        let due = math::mul_div(args.investment_amount, rate, RATE_DIVISOR)?;
        if due.is_zero() {
            return Ok(Settlement::none());
        }

        let denomination = ctx.vault.denomination_asset();
        let token = ctx.env.investment_token;
        let received = if token == denomination {
            due
        } else {
            let path = [denomination, token];
            let order = SwapOrder {
                path: &path,
                amount: due,
                min_amount_out: U256::zero(),
                deadline: ctx.now,
                recipient: ctx.vault.address(),
            };
            ctx.vault
                .swap_asset(ctx.comptroller, ctx.custody, ctx.router, &order)?
        };
        let total_locked = ctx.locked.lock(token, received)?;

        ctx.emit(FeeEvent::InvestmentFeeSettled {
            amount_in: due,
            amount_locked: received,
            total_locked,
        });
        info!(amount_in = %due, %received, %total_locked, "Investment fee locked");
        Ok(Settlement::new(SettlementType::Direct, due))
    }

    fn parameter_values(&self, state: &FeeState) -> Vec<U256> {
        state
            .as_investment(IDENTIFIER)
            .map(|s| vec![s.rate])
            .unwrap_or_default()
    }
}
