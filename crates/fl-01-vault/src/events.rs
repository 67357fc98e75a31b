//! # Effect Records
//!
//! Every mutating vault call records one of these. The comptroller drains
//! them after a successful call and publishes them with its own events.

use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Structured record of a vault mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEffect {
    /// Shares created for `holder`.
    SharesMinted {
        /// Receiving holder.
        holder: Address,
        /// Shares minted.
        amount: U256,
    },
    /// Shares destroyed from `holder`.
    SharesBurned {
        /// Debited holder.
        holder: Address,
        /// Shares burned.
        amount: U256,
    },
    /// Shares moved by the accessor.
    SharesTransferred {
        /// Debited holder.
        from: Address,
        /// Credited holder.
        to: Address,
        /// Shares moved.
        amount: U256,
    },
    /// Asset added to the tracked set.
    TrackedAssetAdded {
        /// Asset.
        asset: Address,
    },
    /// Asset removed from the tracked set.
    TrackedAssetRemoved {
        /// Asset.
        asset: Address,
    },
    /// Custody funds left the vault.
    AssetWithdrawn {
        /// Asset.
        asset: Address,
        /// Recipient.
        target: Address,
        /// Amount.
        amount: U256,
    },
    /// Vault swapped one asset for another through the router.
    AssetSwapped {
        /// Asset sent to the router.
        source_asset: Address,
        /// Asset received from the router.
        destination_asset: Address,
        /// Receiver of the output.
        target: Address,
        /// Amount sent.
        source_amount: U256,
        /// Amount received.
        destination_amount: U256,
    },
    /// Spender allowance changed.
    SpenderApproved {
        /// Asset.
        asset: Address,
        /// Spender.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// Accessor swapped.
    AccessorSet {
        /// Previous accessor.
        prev: Address,
        /// New accessor.
        next: Address,
    },
    /// Migrator changed.
    MigratorSet {
        /// Previous migrator.
        prev: Address,
        /// New migrator.
        next: Address,
    },
    /// Owner changed.
    OwnerSet {
        /// Previous owner.
        prev: Address,
        /// New owner.
        next: Address,
    },
}
