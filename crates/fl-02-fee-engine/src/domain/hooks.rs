//! # Hooks and Settlements
//!
//! The comptroller invokes fee hooks around share actions. A fee declares
//! which hooks it settles on and which it updates on.

use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Points in a share action at which fees run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeHook {
    /// Explicit settlement outside any share action.
    Continuous,
    /// Before shares are priced for a purchase.
    PreBuyShares,
    /// After shares were minted for a purchase.
    PostBuyShares,
    /// Before shares are redeemed.
    PreRedeemShares,
}

/// How a settlement moved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementType {
    /// Nothing was due.
    None,
    /// Shares or assets moved directly between accounts.
    Direct,
    /// New shares were minted and distributed.
    Mint,
    /// Shares outstanding were minted to the vault.
    MintSharesOutstanding,
    /// Shares outstanding were burned from the vault.
    BurnSharesOutstanding,
    /// Assets were paid out of the vault.
    Payout,
}

/// Result of a single fee settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// What happened.
    pub kind: SettlementType,
    /// Shares (or asset units, for asset fees) involved.
    pub amount: U256,
}

impl Settlement {
    /// A settlement that moved nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: SettlementType::None,
            amount: U256([0, 0, 0, 0]),
        }
    }

    /// Settlement of `kind` moving `amount`.
    #[must_use]
    pub const fn new(kind: SettlementType, amount: U256) -> Self {
        Self { kind, amount }
    }
}

/// Action-specific data passed along with a hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookArgs {
    /// Buyer or redeemer. Zero for continuous settlement.
    pub actor: Address,
    /// Denomination amount invested (buy hooks).
    pub investment_amount: U256,
    /// Shares minted (post-buy) or about to be redeemed (pre-redeem).
    pub shares_quantity: U256,
}

impl HookArgs {
    /// Arguments for a continuous settlement.
    #[must_use]
    pub fn continuous() -> Self {
        Self::default()
    }
}
