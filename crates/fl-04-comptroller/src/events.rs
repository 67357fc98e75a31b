//! # Fund Events
//!
//! Every successful call appends its events to the fund's history. Vault
//! effects, fee and policy events are wrapped as they are; the comptroller's
//! own actions use [`ComptrollerEvent`].

use crate::domain::ComptrollerStatus;
use fl_01_vault::VaultEffect;
use fl_02_fee_engine::FeeEvent;
use fl_03_policy_engine::PolicyEvent;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Selector, U256};

/// Event emitted by the comptroller itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComptrollerEvent {
    /// Shares issued for an investment.
    SharesBought {
        /// Buyer.
        buyer: Address,
        /// Denomination amount invested.
        investment_amount: U256,
        /// Shares minted.
        shares_issued: U256,
        /// Shares the buyer kept after post-buy fees.
        shares_received: U256,
    },
    /// Shares redeemed for a basket of assets.
    SharesRedeemed {
        /// Redeemer.
        redeemer: Address,
        /// Shares burned.
        shares_quantity: U256,
        /// Assets paid and amounts.
        payouts: Vec<(Address, U256)>,
    },
    /// A redemption payout swapped on its way to the redeemer.
    AssetSwappedAndTransferred {
        /// Asset taken from the vault.
        source_asset: Address,
        /// Asset delivered.
        destination_asset: Address,
        /// Redeemer.
        target: Address,
        /// Amount of the source asset.
        source_amount: U256,
        /// Amount delivered.
        destination_amount: U256,
    },
    /// A buyer was linked to a referrer.
    ReferralRecorded {
        /// Buyer.
        referee: Address,
        /// Referrer.
        referrer: Address,
    },
    /// Owner pause override changed.
    OverridePauseSet {
        /// New value.
        override_pause: bool,
    },
    /// Registered vault call executed.
    VaultCallExecuted {
        /// Contract called.
        target: Address,
        /// Function selector.
        selector: Selector,
    },
    /// Trade through an integration adapter.
    CallOnIntegrationExecuted {
        /// Adapter.
        adapter: Address,
        /// Adapter method.
        selector: Selector,
        /// Incoming assets and amounts received.
        incoming: Vec<(Address, U256)>,
        /// Spend assets and amounts spent.
        spent: Vec<(Address, U256)>,
    },
    /// Account allowed to trade.
    AuthUserAdded {
        /// Account.
        user: Address,
    },
    /// Account no longer allowed to trade.
    AuthUserRemoved {
        /// Account.
        user: Address,
    },
    /// Comptroller lifecycle transition.
    StatusChanged {
        /// Comptroller id.
        comptroller: Address,
        /// New status.
        status: ComptrollerStatus,
    },
    /// A migration-out hook failed and was bypassed.
    MigrationHookFailed {
        /// Comptroller id.
        comptroller: Address,
        /// Failure message.
        reason: String,
    },
}

/// Any event recorded in a fund's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundEvent {
    /// Vault mutation.
    Vault(VaultEffect),
    /// Fee engine event.
    Fee(FeeEvent),
    /// Policy engine event.
    Policy(PolicyEvent),
    /// Comptroller action.
    Comptroller(ComptrollerEvent),
}

impl From<VaultEffect> for FundEvent {
    fn from(effect: VaultEffect) -> Self {
        Self::Vault(effect)
    }
}

impl From<FeeEvent> for FundEvent {
    fn from(event: FeeEvent) -> Self {
        Self::Fee(event)
    }
}

impl From<PolicyEvent> for FundEvent {
    fn from(event: PolicyEvent) -> Self {
        Self::Policy(event)
    }
}

impl From<ComptrollerEvent> for FundEvent {
    fn from(event: ComptrollerEvent) -> Self {
        Self::Comptroller(event)
    }
}

/// History entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Time of the call that produced the event.
    pub timestamp: u64,
    /// Event.
    pub event: FundEvent,
}
