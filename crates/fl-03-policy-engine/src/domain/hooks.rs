//! Points at which policy rules are evaluated.

use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Hook a policy may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyHook {
    /// Before shares are issued to a buyer.
    PreBuyShares,
    /// Before shares are redeemed.
    PreRedeemShares,
}

/// Arguments handed to [`Policy::passes_rule`](crate::ports::Policy::passes_rule).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleArgs {
    /// Buyer or redeemer.
    pub actor: Address,
    /// Denomination asset amount invested (buys).
    pub investment_amount: U256,
    /// Shares bought or redeemed.
    pub shares_quantity: U256,
    /// Evaluation time.
    pub now: u64,
}

impl RuleArgs {
    /// Arguments for a purchase.
    #[must_use]
    pub fn buy(actor: Address, investment_amount: U256, now: u64) -> Self {
        Self {
            actor,
            investment_amount,
            shares_quantity: U256::zero(),
            now,
        }
    }

    /// Arguments for a redemption.
    #[must_use]
    pub fn redeem(actor: Address, shares_quantity: U256, now: u64) -> Self {
        Self {
            actor,
            investment_amount: U256::zero(),
            shares_quantity,
            now,
        }
    }
}
