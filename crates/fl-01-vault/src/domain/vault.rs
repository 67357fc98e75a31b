//! # Vault
//!
//! Custody and share accounting for one fund. Every mutation is gated by a
//! capability check against the caller:
//!
//! | Operation | Required caller |
//! |-----------|-----------------|
//! | mint / burn / move shares, asset movements, tracked assets, approvals | accessor |
//! | `set_accessor`, `set_owner` | creator (the dispatcher) |
//! | `set_migrator` | owner |

use crate::domain::custody_tx::CustodyTx;
use crate::domain::share_ledger::ShareLedger;
use crate::errors::VaultError;
use crate::events::VaultEffect;
use crate::ports::SwapRouter;
use serde::{Deserialize, Serialize};
use shared_types::{math, Address, U256};
use std::collections::BTreeMap;

/// Parameters for a vault swap.
#[derive(Debug, Clone)]
pub struct SwapOrder<'p> {
    /// Hops; first is the source asset, last the destination.
    pub path: &'p [Address],
    /// Amount of the source asset to sell.
    pub amount: U256,
    /// Minimum destination amount.
    pub min_amount_out: U256,
    /// Unix deadline.
    pub deadline: u64,
    /// Receiver of the destination asset.
    pub recipient: Address,
}

/// The persisted vault record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    address: Address,
    creator: Address,
    owner: Address,
    accessor: Address,
    migrator: Address,
    denomination_asset: Address,
    name: String,
    symbol: String,
    shares: ShareLedger,
    tracked_assets: Vec<Address>,
    allowances: BTreeMap<Address, BTreeMap<Address, U256>>,
    #[serde(skip)]
    pending_effects: Vec<VaultEffect>,
}

impl VaultState {
    /// Creates a vault whose only tracked asset is `denomination_asset`.
    #[must_use]
    pub fn new(
        address: Address,
        creator: Address,
        owner: Address,
        accessor: Address,
        denomination_asset: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            address,
            creator,
            owner,
            accessor,
            migrator: Address::ZERO,
            denomination_asset,
            name: name.into(),
            symbol: symbol.into(),
            shares: ShareLedger::new(),
            tracked_assets: vec![denomination_asset],
            allowances: BTreeMap::new(),
            pending_effects: Vec::new(),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Vault address (its custody account).
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Creator (dispatcher) address.
    #[must_use]
    pub fn creator(&self) -> Address {
        self.creator
    }

    /// Fund owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Current accessor (the live comptroller).
    #[must_use]
    pub fn accessor(&self) -> Address {
        self.accessor
    }

    /// Optional migrator; zero when unset.
    #[must_use]
    pub fn migrator(&self) -> Address {
        self.migrator
    }

    /// Denomination asset.
    #[must_use]
    pub fn denomination_asset(&self) -> Address {
        self.denomination_asset
    }

    /// Fund name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Share token symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Read access to the share ledger.
    #[must_use]
    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    /// Total share supply.
    #[must_use]
    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    /// Shares held by `holder`.
    #[must_use]
    pub fn balance_of(&self, holder: Address) -> U256 {
        self.shares.balance_of(holder)
    }

    /// Tracked assets in insertion order (denomination asset first).
    #[must_use]
    pub fn tracked_assets(&self) -> &[Address] {
        &self.tracked_assets
    }

    /// Whether `asset` is tracked.
    #[must_use]
    pub fn is_tracked_asset(&self, asset: Address) -> bool {
        self.tracked_assets.contains(&asset)
    }

    /// Remaining allowance of `spender` over `asset`.
    #[must_use]
    pub fn allowance(&self, asset: Address, spender: Address) -> U256 {
        self.allowances
            .get(&asset)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `account` may act as the fund owner or migrator.
    #[must_use]
    pub fn can_migrate(&self, account: Address) -> bool {
        account == self.owner || (!self.migrator.is_zero() && account == self.migrator)
    }

    /// Takes the effects recorded since the last drain.
    pub fn drain_effects(&mut self) -> Vec<VaultEffect> {
        std::mem::take(&mut self.pending_effects)
    }

    // =========================================================================
    // SHARE LEDGER
    // =========================================================================

    /// Mints shares. Accessor only.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for any other caller.
    pub fn mint_shares(
        &mut self,
        caller: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        self.shares.mint(holder, amount)?;
        self.record(VaultEffect::SharesMinted { holder, amount }, amount);
        Ok(())
    }

    /// Burns shares. Accessor only.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `InsufficientShares` beyond the holder's balance.
    pub fn burn_shares(
        &mut self,
        caller: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        self.shares.burn(holder, amount)?;
        self.record(VaultEffect::SharesBurned { holder, amount }, amount);
        Ok(())
    }

    /// Moves shares on behalf of the accessor (fee payouts, referral fees).
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `InsufficientShares`.
    pub fn transfer_shares(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        self.shares.transfer(from, to, amount)?;
        self.record(VaultEffect::SharesTransferred { from, to, amount }, amount);
        Ok(())
    }

    /// Holder-initiated transfer. Shares are non-transferable, so this
    /// always fails.
    ///
    /// # Errors
    ///
    /// Always `TransfersDisabled`.
    pub fn transfer(&self, _caller: Address, _to: Address, _amount: U256) -> Result<(), VaultError> {
        Err(VaultError::TransfersDisabled)
    }

    // =========================================================================
    // ASSETS
    // =========================================================================

    /// Adds `asset` to the tracked set. Idempotent.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-accessors, `InvalidArgument` for the zero address.
    pub fn add_tracked_asset(&mut self, caller: Address, asset: Address) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        if asset.is_zero() {
            return Err(VaultError::InvalidArgument("asset cannot be empty".into()));
        }
        if !self.is_tracked_asset(asset) {
            self.tracked_assets.push(asset);
            self.pending_effects
                .push(VaultEffect::TrackedAssetAdded { asset });
        }
        Ok(())
    }

    /// Removes `asset` from the tracked set.
    ///
    /// # Errors
    ///
    /// `DenominationAssetRequired` for the denomination asset,
    /// `NonZeroBalance` when custody still holds some of it.
    pub fn remove_tracked_asset(
        &mut self,
        caller: Address,
        custody: &CustodyTx<'_>,
        asset: Address,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        if asset == self.denomination_asset {
            return Err(VaultError::DenominationAssetRequired(asset));
        }
        let balance = custody.balance_of(asset, self.address);
        if !balance.is_zero() {
            return Err(VaultError::NonZeroBalance { asset, balance });
        }
        if let Some(position) = self.tracked_assets.iter().position(|a| *a == asset) {
            self.tracked_assets.remove(position);
            self.pending_effects
                .push(VaultEffect::TrackedAssetRemoved { asset });
        }
        Ok(())
    }

    /// Untracks every non-denomination asset whose custody balance is zero.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-accessors.
    pub fn prune_empty_assets(
        &mut self,
        caller: Address,
        custody: &CustodyTx<'_>,
    ) -> Result<Vec<Address>, VaultError> {
        self.ensure_accessor(caller)?;
        let vault = self.address;
        let denomination = self.denomination_asset;
        let (kept, removed): (Vec<Address>, Vec<Address>) =
            self.tracked_assets.iter().partition(|asset| {
                **asset == denomination || !custody.balance_of(**asset, vault).is_zero()
            });
        self.tracked_assets = kept;
        for asset in &removed {
            self.pending_effects
                .push(VaultEffect::TrackedAssetRemoved { asset: *asset });
        }
        Ok(removed)
    }

    /// Sends `amount` of `asset` from custody to `target`.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or the custody failure.
    pub fn withdraw_asset_to(
        &mut self,
        caller: Address,
        custody: &mut CustodyTx<'_>,
        asset: Address,
        target: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        custody.transfer(asset, self.address, target, amount)?;
        self.record(
            VaultEffect::AssetWithdrawn {
                asset,
                target,
                amount,
            },
            amount,
        );
        Ok(())
    }

    /// Sells `order.amount` of `order.path[0]` through `router` and delivers
    /// the output to `order.recipient`. Output delivered to the vault itself
    /// is tracked.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidArgument` for a path shorter than two hops,
    /// router failures (`SlippageExceeded`, deadline, no route) and custody
    /// failures.
    pub fn swap_asset(
        &mut self,
        caller: Address,
        custody: &mut CustodyTx<'_>,
        router: &dyn SwapRouter,
        order: &SwapOrder<'_>,
    ) -> Result<U256, VaultError> {
        self.ensure_accessor(caller)?;
        let (Some(source), Some(destination)) = (order.path.first(), order.path.last()) else {
            return Err(VaultError::InvalidArgument("swap path is empty".into()));
        };
        if order.path.len() < 2 {
            return Err(VaultError::InvalidArgument(
                "swap path needs a source and a destination".into(),
            ));
        }
        let (source, destination) = (*source, *destination);

        custody.transfer(source, self.address, router.address(), order.amount)?;
        let amount_out = router.swap(
            order.path,
            order.amount,
            order.min_amount_out,
            order.deadline,
        )?;
        custody.transfer(destination, router.address(), order.recipient, amount_out)?;

        if order.recipient == self.address && !amount_out.is_zero() {
            self.add_tracked_asset(caller, destination)?;
        }
        self.pending_effects.push(VaultEffect::AssetSwapped {
            source_asset: source,
            destination_asset: destination,
            target: order.recipient,
            source_amount: order.amount,
            destination_amount: amount_out,
        });
        Ok(amount_out)
    }

    /// Sets the allowance of `spender` over `asset`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-accessors.
    pub fn approve_asset_spender(
        &mut self,
        caller: Address,
        asset: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        self.ensure_accessor(caller)?;
        let spenders = self.allowances.entry(asset).or_default();
        if amount.is_zero() {
            spenders.remove(&spender);
        } else {
            spenders.insert(spender, amount);
        }
        if spenders.is_empty() {
            self.allowances.remove(&asset);
        }
        self.pending_effects.push(VaultEffect::SpenderApproved {
            asset,
            spender,
            amount,
        });
        Ok(())
    }

    /// Pulls `amount` of `asset` from custody into `spender`, consuming its
    /// allowance. Used by trade adapters during `take_order`.
    ///
    /// # Errors
    ///
    /// `AllowanceExceeded` beyond the approved amount, or the custody failure.
    pub fn spend_allowance(
        &mut self,
        custody: &mut CustodyTx<'_>,
        asset: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), VaultError> {
        let allowance = self.allowance(asset, spender);
        let remaining = allowance
            .checked_sub(amount)
            .ok_or(VaultError::AllowanceExceeded {
                asset,
                spender,
                allowance,
                requested: amount,
            })?;
        custody.transfer(asset, self.address, spender, amount)?;
        let accessor = self.accessor;
        self.approve_asset_spender(accessor, asset, spender, remaining)
    }

    // =========================================================================
    // ROLES
    // =========================================================================

    /// Swaps the accessor. Creator only.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for anyone but the creator.
    pub fn set_accessor(&mut self, caller: Address, next: Address) -> Result<(), VaultError> {
        self.ensure_creator(caller)?;
        let prev = self.accessor;
        self.accessor = next;
        self.pending_effects
            .push(VaultEffect::AccessorSet { prev, next });
        Ok(())
    }

    /// Transfers vault ownership. Creator only.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for anyone but the creator.
    pub fn set_owner(&mut self, caller: Address, next: Address) -> Result<(), VaultError> {
        self.ensure_creator(caller)?;
        let prev = self.owner;
        self.owner = next;
        self.pending_effects.push(VaultEffect::OwnerSet { prev, next });
        Ok(())
    }

    /// Sets (or clears, with zero) the migrator. Owner only.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `Unchanged` when already set.
    pub fn set_migrator(&mut self, caller: Address, next: Address) -> Result<(), VaultError> {
        if caller != self.owner {
            return Err(VaultError::Unauthorized {
                caller,
                role: "owner",
            });
        }
        if next == self.migrator {
            return Err(VaultError::Unchanged("migrator"));
        }
        let prev = self.migrator;
        self.migrator = next;
        self.pending_effects
            .push(VaultEffect::MigratorSet { prev, next });
        Ok(())
    }

    /// Gross balance of every tracked asset in custody.
    #[must_use]
    pub fn tracked_balances(&self, custody: &CustodyTx<'_>) -> Vec<(Address, U256)> {
        self.tracked_assets
            .iter()
            .map(|asset| (*asset, custody.balance_of(*asset, self.address)))
            .collect()
    }

    /// `balance * numerator / denominator` for `asset` held by the vault.
    ///
    /// # Errors
    ///
    /// Arithmetic errors (zero denominator).
    pub fn proportional_balance(
        &self,
        custody: &CustodyTx<'_>,
        asset: Address,
        numerator: U256,
        denominator: U256,
    ) -> Result<U256, VaultError> {
        let balance = custody.balance_of(asset, self.address);
        Ok(math::mul_div(balance, numerator, denominator)?)
    }

    fn ensure_accessor(&self, caller: Address) -> Result<(), VaultError> {
        if caller == self.accessor && !caller.is_zero() {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                caller,
                role: "accessor",
            })
        }
    }

    fn ensure_creator(&self, caller: Address) -> Result<(), VaultError> {
        if caller == self.creator {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                caller,
                role: "creator",
            })
        }
    }

    fn record(&mut self, effect: VaultEffect, amount: U256) {
        if !amount.is_zero() {
            self.pending_effects.push(effect);
        }
    }
}
