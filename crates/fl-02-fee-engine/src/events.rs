//! # Fee Events
//!
//! Records emitted while configuring and settling fees. The comptroller
//! collects them into its event history after a successful call.

use crate::domain::{FeeHook, SettlementType};
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Event emitted by the fee engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeEvent {
    /// A fund enabled a fee with the given parameter values.
    FundSettingsAdded {
        /// Fee id.
        fee: Address,
        /// Parameter values in the fee's declared order.
        parameters: Vec<U256>,
    },
    /// A fee was activated for a fund.
    ActivatedForFund {
        /// Fee id.
        fee: Address,
    },
    /// A settlement on a hook moved value.
    Settled {
        /// Fee id.
        fee: Address,
        /// Triggering hook.
        hook: FeeHook,
        /// Settlement type.
        settlement: SettlementType,
        /// Shares or asset units involved.
        amount: U256,
    },
    /// Management fee shares were distributed.
    ManagementFeeSettled {
        /// Total shares due.
        shares_due: U256,
        /// Owner portion (minted).
        owner_shares: U256,
        /// Staking portion (virtually redeemed).
        staking_shares: U256,
        /// DAO portion (virtually redeemed).
        dao_shares: U256,
        /// Seconds covered by this settlement.
        seconds_since_settlement: u64,
    },
    /// Performance fee shares outstanding changed.
    PerformanceUpdated {
        /// Value owed after the update.
        aggregate_value_due: U256,
        /// Shares outstanding before.
        prev_shares_outstanding: U256,
        /// Shares outstanding after.
        next_shares_outstanding: U256,
    },
    /// Performance fee reference price changed.
    LastSharePriceUpdated {
        /// Previous price.
        prev: U256,
        /// New price.
        next: U256,
    },
    /// Performance fee crystallised and paid out.
    PerformancePaidOut {
        /// High-water mark after the payout.
        high_water_mark: U256,
        /// Shares outstanding burned from the vault.
        shares_outstanding: U256,
        /// Owner portion (minted).
        owner_shares: U256,
        /// Staking portion (virtually redeemed).
        staking_shares: U256,
        /// DAO portion (virtually redeemed).
        dao_shares: U256,
    },
    /// Virtual shares redeemed for a fee recipient.
    VirtualSharesRedeemed {
        /// Recipient.
        recipient: Address,
        /// Virtual shares redeemed.
        shares: U256,
        /// Assets paid.
        payouts: Vec<(Address, U256)>,
    },
    /// An asset transfer to a fee recipient failed; shares were minted instead.
    FallbackSharesMinted {
        /// Recipient.
        recipient: Address,
        /// Shares minted.
        shares: U256,
        /// Failure that triggered the fallback.
        reason: String,
    },
    /// Referral fee moved from the buyer.
    ReferralFeeSettled {
        /// Buyer.
        buyer: Address,
        /// Referrer or beneficiary.
        recipient: Address,
        /// Shares moved.
        shares: U256,
    },
    /// Investment fee swapped into the locked investment token.
    InvestmentFeeSettled {
        /// Denomination amount swapped.
        amount_in: U256,
        /// Investment token received.
        amount_locked: U256,
        /// Locked total after the settlement.
        total_locked: U256,
    },
    /// Locked investment tokens were released.
    LockedBalanceReleased {
        /// Token.
        token: Address,
        /// Amount released.
        amount: U256,
    },
}
