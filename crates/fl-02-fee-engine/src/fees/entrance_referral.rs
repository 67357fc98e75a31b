//! # Entrance Referral Fee
//!
//! One-shot fee on purchases: `shares * rate / (1e18 + rate)` of the newly
//! minted shares moves from the buyer to their referrer, or to the
//! configured beneficiary when the buyer was not referred.

use super::decode_settings;
use crate::domain::{
    EntranceReferralFeeState, FeeContext, FeeHook, FeeState, HookArgs, Settlement,
    SettlementType,
};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::Fee;
use serde::{Deserialize, Serialize};
use shared_types::math::{self, RATE_DIVISOR};
use shared_types::{Address, U256};
use tracing::debug;

/// Identifier of the entrance referral fee.
pub const IDENTIFIER: &str = "ENTRANCE_REFERRAL";

/// Settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceReferralFeeSettings {
    /// Fee rate, 18 decimals. Must be greater than 0.
    pub rate: U256,
    /// Receiver when the buyer has no referrer.
    #[serde(default)]
    pub beneficiary: Option<Address>,
}

/// Referral fee charged on purchases.
#[derive(Debug, Clone)]
pub struct EntranceReferralFee {
    id: Address,
}

impl EntranceReferralFee {
    /// Fee module registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }
}

impl Fee for EntranceReferralFee {
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
        let settings: EntranceReferralFeeSettings = decode_settings(IDENTIFIER, settings)?;
        if settings.rate.is_zero() {
            return Err(FeeError::InvalidSettings {
                fee: IDENTIFIER,
                reason: "feeRate must be greater than 0".into(),
            });
        }
        Ok(FeeState::EntranceReferral(EntranceReferralFeeState {
            rate: settings.rate,
            beneficiary: settings.beneficiary.filter(|b| !b.is_zero()),
        }))
    }

    fn settle(
        &self,
        ctx: &mut FeeContext<'_, '_>,
        state: &mut FeeState,
        _hook: FeeHook,
        args: &HookArgs,
    ) -> Result<Settlement, FeeError> {
        let fee_state = state.as_entrance_referral(IDENTIFIER)?;
        let recipient = ctx
            .referrals
            .referrer_of(args.actor)
            .or(fee_state.beneficiary);
        let Some(recipient) = recipient else {
            return Ok(Settlement::none());
        };

        let denominator = math::add(RATE_DIVISOR, fee_state.rate)?;
        let due = math::mul_div(args.shares_quantity, fee_state.rate, denominator)?;
        if due.is_zero() {
            return Ok(Settlement::none());
        }

        ctx.vault
            .transfer_shares(ctx.comptroller, args.actor, recipient, due)?;
        ctx.emit(FeeEvent::ReferralFeeSettled {
            buyer: args.actor,
            recipient,
            shares: due,
        });
        debug!(buyer = ?args.actor, ?recipient, shares = %due, "Referral fee settled");
        Ok(Settlement::new(SettlementType::Direct, due))
    }

    fn parameter_values(&self, state: &FeeState) -> Vec<U256> {
        state
            .as_entrance_referral(IDENTIFIER)
            .map(|s| vec![s.rate])
            .unwrap_or_default()
    }
}
