//! # Comptroller Record
//!
//! Per-comptroller configuration and bookkeeping. A fund normally has one
//! record; while a migration is pending it holds a second, inactive one.

use fl_02_fee_engine::FundFeeConfig;
use fl_03_policy_engine::FundPolicyConfig;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle of a comptroller.
///
/// ```text
/// Inactive ──activate──→ Active ──migrate out──→ Destructed
/// ```
///
/// Paused is not a status: it is derived from the fund deployer's release
/// status and the owner's override flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComptrollerStatus {
    /// Created, not yet the vault's accessor.
    Inactive,
    /// Accessor of its vault.
    Active,
    /// Replaced by a newer comptroller.
    Destructed,
}

/// Release status of a fund deployer generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
    /// Deployed, not yet accepting funds.
    PreLaunch,
    /// Accepting new funds and migrations.
    Live,
    /// Paused by the protocol owner.
    Paused,
}

/// Persisted comptroller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComptrollerRecord {
    /// Comptroller id.
    pub address: Address,
    /// Fund deployer generation that created it.
    pub fund_deployer: Address,
    /// Account that created the configuration.
    pub creator: Address,
    /// Denomination asset.
    pub denomination_asset: Address,
    /// Minimum seconds between a holder's last buy and a redemption.
    pub shares_action_timelock: u64,
    /// Lifecycle status.
    pub status: ComptrollerStatus,
    /// Owner override of a deployer pause.
    pub override_pause: bool,
    /// Enabled fees and their state.
    pub fees: FundFeeConfig,
    /// Enabled policies and their state.
    pub policies: FundPolicyConfig,
    /// Last purchase time per holder.
    pub last_shares_action: BTreeMap<Address, u64>,
    /// Accounts the owner allowed to trade.
    pub authorized_users: BTreeSet<Address>,
    /// Creation time.
    pub created_at: u64,
}

impl ComptrollerRecord {
    /// Inactive record with no bookkeeping yet.
    #[must_use]
    pub fn new(
        address: Address,
        fund_deployer: Address,
        creator: Address,
        denomination_asset: Address,
        shares_action_timelock: u64,
        fees: FundFeeConfig,
        policies: FundPolicyConfig,
        created_at: u64,
    ) -> Self {
        Self {
            address,
            fund_deployer,
            creator,
            denomination_asset,
            shares_action_timelock,
            status: ComptrollerStatus::Inactive,
            override_pause: false,
            fees,
            policies,
            last_shares_action: BTreeMap::new(),
            authorized_users: BTreeSet::new(),
            created_at,
        }
    }

    /// Seconds until `holder` may redeem, zero if free to.
    #[must_use]
    pub fn timelock_remaining(&self, holder: Address, now: u64) -> u64 {
        let Some(last) = self.last_shares_action.get(&holder) else {
            return 0;
        };
        (last + self.shares_action_timelock).saturating_sub(now)
    }

    /// Whether the comptroller is paused given its deployer's status.
    #[must_use]
    pub fn is_paused(&self, release: ReleaseStatus) -> bool {
        release == ReleaseStatus::Paused && !self.override_pause
    }
}
