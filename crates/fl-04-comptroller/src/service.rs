//! # Comptroller Service
//!
//! Entry points of a fund. Every mutating call runs as one staged
//! transaction on the fund's [`FundCell`]:
//!
//! ```text
//! enter cell ──→ stage copy + custody journal ──→ checks, hooks, mutations
//!      │                                                   │
//!      │                                     Ok ───────────┴─────────── Err
//!      │                                      │                          │
//!      │                     journal.commit; swap staged copy in;  drop staged copy;
//!      │                     append events to history              journal replays in reverse
//!      └──────────────────────────── guard dropped ─────────────────────────┘
//! ```
//!
//! Read-only queries go straight to the committed record.

use crate::domain::{ComptrollerRecord, ComptrollerStatus, FundCell, FundState};
use crate::errors::{ComptrollerError, IntegrationError};
use crate::events::{ComptrollerEvent, FundEvent, RecordedEvent};
use crate::extensions::{
    decode_args, ExtensionAddresses, FeeManagerAction, IntegrationCall, IntegrationManagerAction,
};
use crate::integration::{IntegrationContext, IntegrationManager};
use crate::ports::{ContractCaller, DeployerRegistry, ValueInterpreter};
use crate::valuation::{self, InterpreterGav};
use fl_01_vault::{AssetCustody, CustodyTx, SwapOrder, SwapRouter};
use fl_02_fee_engine::{
    FeeContext, FeeEnvironment, FeeError, FeeEvent, FeeHook, FeeManager, FeeState, FundFeeConfig,
    HookArgs, Settlement, StakingOracle,
};
use fl_03_policy_engine::{
    FundPolicyConfig, PolicyError, PolicyEvent, PolicyHook, PolicyManager, PolicyState, RuleArgs,
};
use parking_lot::RwLock;
use shared_types::{has_duplicates, math, Address, Clock, Selector, U256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// =============================================================================
// WIRING
// =============================================================================

/// Collaborators of a [`ComptrollerService`].
pub struct ComptrollerDependencies {
    /// Token custody.
    pub custody: Arc<dyn AssetCustody>,
    /// Swap router for swap-redemptions and fee swaps.
    pub router: Arc<dyn SwapRouter>,
    /// Asset valuation.
    pub interpreter: Arc<dyn ValueInterpreter>,
    /// Staked balances for tiered fee splits.
    pub staking: Arc<dyn StakingOracle>,
    /// Vault call passthrough.
    pub contracts: Arc<dyn ContractCaller>,
    /// Release status, vault-call registry and parameter ranges.
    pub deployers: Arc<dyn DeployerRegistry>,
    /// Fee registry.
    pub fee_manager: Arc<FeeManager>,
    /// Policy registry.
    pub policy_manager: Arc<PolicyManager>,
    /// Adapter registry.
    pub integration_manager: Arc<IntegrationManager>,
    /// Protocol-wide fee parameters.
    pub environment: Arc<RwLock<FeeEnvironment>>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Extension addresses.
    pub extensions: ExtensionAddresses,
}

/// A call in progress: the staged fund record and its custody journal.
pub struct Staged<'c> {
    /// Staged copy of the record.
    pub state: FundState,
    /// Journaled custody.
    pub custody: CustodyTx<'c>,
    /// Call timestamp.
    pub now: u64,
    events: Vec<FundEvent>,
}

impl Staged<'_> {
    /// Records `event`, after any vault effects still pending.
    pub fn emit(&mut self, event: impl Into<FundEvent>) {
        self.flush_vault_effects();
        self.events.push(event.into());
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[FundEvent] {
        &self.events
    }

    fn flush_vault_effects(&mut self) {
        let effects = self.state.vault.drain_effects();
        self.events.extend(effects.into_iter().map(FundEvent::from));
    }
}

struct Redemption {
    comptroller: Address,
    quantity: U256,
    supply: U256,
}

/// Fund entry points.
pub struct ComptrollerService {
    custody: Arc<dyn AssetCustody>,
    router: Arc<dyn SwapRouter>,
    interpreter: Arc<dyn ValueInterpreter>,
    staking: Arc<dyn StakingOracle>,
    contracts: Arc<dyn ContractCaller>,
    deployers: Arc<dyn DeployerRegistry>,
    fees: Arc<FeeManager>,
    policies: Arc<PolicyManager>,
    integrations: Arc<IntegrationManager>,
    environment: Arc<RwLock<FeeEnvironment>>,
    clock: Arc<dyn Clock>,
    extensions: ExtensionAddresses,
}

impl ComptrollerService {
    /// Wires the service.
    #[must_use]
    pub fn new(deps: ComptrollerDependencies) -> Self {
        Self {
            custody: deps.custody,
            router: deps.router,
            interpreter: deps.interpreter,
            staking: deps.staking,
            contracts: deps.contracts,
            deployers: deps.deployers,
            fees: deps.fee_manager,
            policies: deps.policy_manager,
            integrations: deps.integration_manager,
            environment: deps.environment,
            clock: deps.clock,
            extensions: deps.extensions,
        }
    }

    /// Fee registry.
    #[must_use]
    pub fn fee_manager(&self) -> &Arc<FeeManager> {
        &self.fees
    }

    /// Policy registry.
    #[must_use]
    pub fn policy_manager(&self) -> &Arc<PolicyManager> {
        &self.policies
    }

    /// Adapter registry.
    #[must_use]
    pub fn integration_manager(&self) -> &Arc<IntegrationManager> {
        &self.integrations
    }

    /// Extension addresses.
    #[must_use]
    pub fn extensions(&self) -> ExtensionAddresses {
        self.extensions
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // =========================================================================
    // STAGING
    // =========================================================================

    /// Runs `f` as one all-or-nothing call on `fund`.
    ///
    /// # Errors
    ///
    /// `Reentrance` when the calling thread is already inside a call on
    /// `fund`, otherwise whatever `f` returns. Nothing is kept on error.
    pub fn with_staged<R, E: From<ComptrollerError>>(
        &self,
        fund: &FundCell,
        f: impl FnOnce(&mut Staged<'_>) -> Result<R, E>,
    ) -> Result<R, E> {
        let guard = fund.enter()?;
        let mut staged = Staged {
            state: guard.stage(),
            custody: CustodyTx::new(self.custody.as_ref()),
            now: self.clock.now(),
            events: Vec::new(),
        };
        let output = f(&mut staged)?;
        staged.flush_vault_effects();

        let Staged {
            state,
            custody,
            now,
            events,
        } = staged;
        debug!(vault = ?fund.vault(), events = events.len(), "Committing fund call");
        custody.commit();
        guard.commit(
            state,
            events
                .into_iter()
                .map(|event| RecordedEvent { timestamp: now, event }),
        );
        Ok(output)
    }

    fn with_fee_context<R>(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        f: impl FnOnce(&mut FeeContext<'_, '_>, &mut FundFeeConfig) -> Result<R, FeeError>,
    ) -> Result<R, ComptrollerError> {
        staged.flush_vault_effects();
        let environment = self.environment.read().clone();
        let gav = InterpreterGav::new(self.interpreter.as_ref());
        let mut fee_events = Vec::new();
        let result = {
            let Staged {
                state, custody, now, ..
            } = staged;
            let FundState {
                vault,
                comptrollers,
                locked,
                referrals,
                ..
            } = state;
            let record = comptrollers
                .get_mut(&comptroller)
                .ok_or(ComptrollerError::UnknownComptroller(comptroller))?;
            let mut ctx = FeeContext {
                comptroller,
                vault,
                custody,
                router: self.router.as_ref(),
                staking: self.staking.as_ref(),
                gav: &gav,
                locked,
                referrals,
                env: &environment,
                now: *now,
                events: &mut fee_events,
            };
            f(&mut ctx, &mut record.fees)
        };
        for event in fee_events {
            staged.emit(event);
        }
        Ok(result?)
    }

    fn invoke_fee_hook(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        hook: FeeHook,
        args: &HookArgs,
    ) -> Result<Vec<(Address, Settlement)>, ComptrollerError> {
        self.with_fee_context(staged, comptroller, |ctx, config| {
            self.fees.invoke_hook(ctx, config, hook, args)
        })
    }

    fn with_integration_context<R>(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        f: impl FnOnce(&IntegrationManager, &mut IntegrationContext<'_, '_>) -> Result<R, IntegrationError>,
    ) -> Result<R, ComptrollerError> {
        let Staged { state, custody, .. } = staged;
        let mut ctx = IntegrationContext {
            comptroller,
            vault: &mut state.vault,
            custody,
            locked: &state.locked,
            interpreter: self.interpreter.as_ref(),
        };
        Ok(f(&self.integrations, &mut ctx)?)
    }

    fn ensure_not_paused(&self, record: &ComptrollerRecord) -> Result<(), ComptrollerError> {
        if record.is_paused(self.deployers.release_status(record.fund_deployer)) {
            return Err(ComptrollerError::FundPaused);
        }
        Ok(())
    }

    /// Checks `values` of `module` against the protocol's parameter ranges.
    ///
    /// # Errors
    ///
    /// `ParameterOutOfRange` for the first value outside its bounds.
    pub fn check_parameter_ranges(
        &self,
        module: Address,
        values: &[U256],
    ) -> Result<(), ComptrollerError> {
        let Some((min, max)) = self.deployers.parameter_ranges(module) else {
            return Ok(());
        };
        for (index, value) in values.iter().enumerate() {
            let (Some(low), Some(high)) = (min.get(index), max.get(index)) else {
                continue;
            };
            if value < low || value > high {
                return Err(ComptrollerError::ParameterOutOfRange {
                    module,
                    index,
                    value: *value,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // SHARES
    // =========================================================================

    /// Buys shares with `investment_amount` of the denomination asset and
    /// returns the shares the buyer kept after post-buy fees.
    ///
    /// # Errors
    ///
    /// `FundPaused`, `InvalidArgument` for a zero amount, `MigrationPending`,
    /// policy violations, fee failures, custody failures, `SlippageExceeded`.
    #[instrument(skip(self, fund), fields(vault = ?fund.vault()))]
    pub fn buy_shares(
        &self,
        fund: &FundCell,
        buyer: Address,
        investment_amount: U256,
        min_shares_quantity: U256,
        referrer: Option<Address>,
    ) -> Result<U256, ComptrollerError> {
        self.with_staged(fund, |staged| {
            let comptroller = {
                let record = staged.state.require_active()?;
                self.ensure_not_paused(record)?;
                if investment_amount.is_zero() {
                    return Err(ComptrollerError::InvalidArgument(
                        "investment amount must be greater than 0".into(),
                    ));
                }
                if staged.state.migration.is_some() {
                    return Err(ComptrollerError::MigrationPending);
                }
                self.policies.validate_rules(
                    &record.policies,
                    PolicyHook::PreBuyShares,
                    &RuleArgs::buy(buyer, investment_amount, staged.now),
                )?;
                record.address
            };

            if let Some(referrer) = referrer {
                if staged.state.referrals.record(buyer, referrer)? {
                    staged.emit(ComptrollerEvent::ReferralRecorded {
                        referee: buyer,
                        referrer,
                    });
                }
            }

            let mut args = HookArgs {
                actor: buyer,
                investment_amount,
                shares_quantity: U256::zero(),
            };
            self.invoke_fee_hook(staged, comptroller, FeeHook::PreBuyShares, &args)?;

            let price = valuation::calc_gross_share_value(
                self.interpreter.as_ref(),
                &staged.state.vault,
                &staged.custody,
            )?;
            let shares_issued = math::mul_div(investment_amount, math::SHARE_UNIT, price)?;
            if shares_issued.is_zero() {
                return Err(ComptrollerError::InvalidArgument(
                    "investment too small to issue shares".into(),
                ));
            }

            let vault = staged.state.vault.address();
            let denomination = staged.state.vault.denomination_asset();
            let balance_before = staged.state.vault.balance_of(buyer);
            staged
                .custody
                .transfer(denomination, buyer, vault, investment_amount)?;
            staged
                .state
                .vault
                .mint_shares(comptroller, buyer, shares_issued)?;

            args.shares_quantity = shares_issued;
            self.invoke_fee_hook(staged, comptroller, FeeHook::PostBuyShares, &args)?;

            let shares_received = staged
                .state
                .vault
                .balance_of(buyer)
                .saturating_sub(balance_before);
            if shares_received < min_shares_quantity {
                return Err(ComptrollerError::SlippageExceeded {
                    minimum: min_shares_quantity,
                    received: shares_received,
                });
            }

            staged
                .state
                .vault
                .prune_empty_assets(comptroller, &staged.custody)?;
            staged
                .state
                .comptroller_mut(comptroller)?
                .last_shares_action
                .insert(buyer, staged.now);
            staged.emit(ComptrollerEvent::SharesBought {
                buyer,
                investment_amount,
                shares_issued,
                shares_received,
            });
            info!(?buyer, %investment_amount, %shares_received, "Shares bought");
            Ok(shares_received)
        })
    }

    fn prepare_redemption(
        &self,
        staged: &mut Staged<'_>,
        redeemer: Address,
        requested: U256,
    ) -> Result<Redemption, ComptrollerError> {
        let (comptroller, quantity) = {
            let record = staged.state.require_active()?;
            if staged.state.migration.is_none() {
                let remaining = record.timelock_remaining(redeemer, staged.now);
                if remaining > 0 {
                    return Err(ComptrollerError::SharesActionTimelocked { remaining });
                }
            }
            let held = staged.state.vault.balance_of(redeemer);
            let quantity = if requested.is_zero() { held } else { requested };
            if quantity.is_zero() {
                return Err(ComptrollerError::InvalidArgument("no shares to redeem".into()));
            }
            if quantity > held {
                return Err(ComptrollerError::InsufficientShares {
                    requested: quantity,
                    held,
                });
            }
            self.policies.validate_rules(
                &record.policies,
                PolicyHook::PreRedeemShares,
                &RuleArgs::redeem(redeemer, quantity, staged.now),
            )?;
            (record.address, quantity)
        };

        let args = HookArgs {
            actor: redeemer,
            investment_amount: U256::zero(),
            shares_quantity: quantity,
        };
        self.invoke_fee_hook(staged, comptroller, FeeHook::PreRedeemShares, &args)?;

        // Fees may have moved the redeemer's shares.
        let held = staged.state.vault.balance_of(redeemer);
        let quantity = if requested.is_zero() { held } else { quantity };
        if quantity.is_zero() || quantity > held {
            return Err(ComptrollerError::InsufficientShares {
                requested: quantity,
                held,
            });
        }
        Ok(Redemption {
            comptroller,
            quantity,
            supply: staged.state.vault.total_supply(),
        })
    }

    /// Releases the redeemed slice of each locked token in `paid_out`.
    /// Locked tokens left in the vault stay locked.
    fn release_locked_and_prune(
        &self,
        staged: &mut Staged<'_>,
        redemption: &Redemption,
        paid_out: &[Address],
    ) -> Result<(), ComptrollerError> {
        let tokens: Vec<Address> = staged
            .state
            .locked
            .iter()
            .map(|(token, _)| token)
            .filter(|token| paid_out.contains(token))
            .collect();
        for token in tokens {
            let amount = staged.state.locked.release_proportional(
                token,
                redemption.quantity,
                redemption.supply,
            )?;
            if !amount.is_zero() {
                staged.emit(FeeEvent::LockedBalanceReleased { token, amount });
            }
        }
        staged
            .state
            .vault
            .prune_empty_assets(redemption.comptroller, &staged.custody)?;
        Ok(())
    }

    /// Redeems shares for a proportional slice of every tracked asset plus
    /// `additional_assets`, forfeiting `assets_to_skip`. A zero
    /// `shares_quantity` redeems the full balance. Returns the payouts.
    ///
    /// # Errors
    ///
    /// `SharesActionTimelocked`, `InsufficientShares`, `InvalidArgument` for
    /// duplicates, policy and fee failures, `NoPayoutAssets`.
    #[instrument(skip(self, fund, additional_assets, assets_to_skip), fields(vault = ?fund.vault()))]
    pub fn redeem_shares_detailed(
        &self,
        fund: &FundCell,
        redeemer: Address,
        shares_quantity: U256,
        additional_assets: &[Address],
        assets_to_skip: &[Address],
    ) -> Result<Vec<(Address, U256)>, ComptrollerError> {
        if has_duplicates(additional_assets) {
            return Err(ComptrollerError::InvalidArgument(
                "additional assets contain duplicates".into(),
            ));
        }
        if has_duplicates(assets_to_skip) {
            return Err(ComptrollerError::InvalidArgument(
                "assets to skip contain duplicates".into(),
            ));
        }
        self.with_staged(fund, |staged| {
            let redemption = self.prepare_redemption(staged, redeemer, shares_quantity)?;

            let mut assets = staged.state.vault.tracked_assets().to_vec();
            for asset in additional_assets {
                if !assets.contains(asset) {
                    assets.push(*asset);
                }
            }
            assets.retain(|asset| !assets_to_skip.contains(asset));

            let mut payouts = Vec::with_capacity(assets.len());
            for asset in assets {
                let amount = staged.state.vault.proportional_balance(
                    &staged.custody,
                    asset,
                    redemption.quantity,
                    redemption.supply,
                )?;
                if !amount.is_zero() {
                    payouts.push((asset, amount));
                }
            }
            if payouts.is_empty() {
                return Err(ComptrollerError::NoPayoutAssets);
            }

            staged
                .state
                .vault
                .burn_shares(redemption.comptroller, redeemer, redemption.quantity)?;
            for (asset, amount) in &payouts {
                staged.state.vault.withdraw_asset_to(
                    redemption.comptroller,
                    &mut staged.custody,
                    *asset,
                    redeemer,
                    *amount,
                )?;
            }
            let paid_out: Vec<Address> = payouts.iter().map(|(asset, _)| *asset).collect();
            self.release_locked_and_prune(staged, &redemption, &paid_out)?;

            staged.emit(ComptrollerEvent::SharesRedeemed {
                redeemer,
                shares_quantity: redemption.quantity,
                payouts: payouts.clone(),
            });
            info!(?redeemer, quantity = %redemption.quantity, assets = payouts.len(), "Shares redeemed");
            Ok(payouts)
        })
    }

    /// Redeems shares and swaps each payout on its way to the redeemer.
    /// `swap_paths[i]` and `min_amounts_out[i]` belong to the i-th tracked
    /// asset; an empty path (or one ending where it starts) pays the asset
    /// as is. Returns the delivered assets and amounts.
    ///
    /// # Errors
    ///
    /// As [`Self::redeem_shares_detailed`], plus `InvalidArgument` for a
    /// zero quantity, mismatched lengths or a path not starting at its
    /// payout asset, and router failures.
    #[instrument(skip(self, fund, swap_paths, min_amounts_out), fields(vault = ?fund.vault()))]
    pub fn redeem_shares_and_swap(
        &self,
        fund: &FundCell,
        redeemer: Address,
        shares_quantity: U256,
        swap_paths: &[Vec<Address>],
        min_amounts_out: &[U256],
        deadline: u64,
    ) -> Result<Vec<(Address, U256)>, ComptrollerError> {
        if shares_quantity.is_zero() {
            return Err(ComptrollerError::InvalidArgument(
                "shares quantity must be greater than 0".into(),
            ));
        }
        if swap_paths.len() != min_amounts_out.len() {
            return Err(ComptrollerError::InvalidArgument(
                "swap paths and minimum amounts differ in length".into(),
            ));
        }
        self.with_staged(fund, |staged| {
            let redemption = self.prepare_redemption(staged, redeemer, shares_quantity)?;

            let assets = staged.state.vault.tracked_assets().to_vec();
            if assets.len() != swap_paths.len() {
                return Err(ComptrollerError::InvalidArgument(format!(
                    "expected {} swap paths, got {}",
                    assets.len(),
                    swap_paths.len()
                )));
            }

            let mut payouts = Vec::with_capacity(assets.len());
            for ((asset, path), min_out) in assets.iter().zip(swap_paths).zip(min_amounts_out) {
                let amount = staged.state.vault.proportional_balance(
                    &staged.custody,
                    *asset,
                    redemption.quantity,
                    redemption.supply,
                )?;
                if amount.is_zero() {
                    continue;
                }
                if path.first().is_some_and(|source| source != asset) {
                    return Err(ComptrollerError::InvalidArgument(
                        "swap path must start with its payout asset".into(),
                    ));
                }
                payouts.push((*asset, path.as_slice(), *min_out, amount));
            }
            if payouts.is_empty() {
                return Err(ComptrollerError::NoPayoutAssets);
            }

            staged
                .state
                .vault
                .burn_shares(redemption.comptroller, redeemer, redemption.quantity)?;
            let mut delivered = Vec::with_capacity(payouts.len());
            for &(asset, path, min_amount_out, amount) in &payouts {
                match path.last() {
                    Some(destination) if *destination != asset => {
                        let received = staged.state.vault.swap_asset(
                            redemption.comptroller,
                            &mut staged.custody,
                            self.router.as_ref(),
                            &SwapOrder {
                                path,
                                amount,
                                min_amount_out,
                                deadline,
                                recipient: redeemer,
                            },
                        )?;
                        staged.emit(ComptrollerEvent::AssetSwappedAndTransferred {
                            source_asset: asset,
                            destination_asset: *destination,
                            target: redeemer,
                            source_amount: amount,
                            destination_amount: received,
                        });
                        delivered.push((*destination, received));
                    }
                    _ => {
                        staged.state.vault.withdraw_asset_to(
                            redemption.comptroller,
                            &mut staged.custody,
                            asset,
                            redeemer,
                            amount,
                        )?;
                        delivered.push((asset, amount));
                    }
                }
            }
            let paid_out: Vec<Address> = payouts.iter().map(|(asset, ..)| *asset).collect();
            self.release_locked_and_prune(staged, &redemption, &paid_out)?;

            staged.emit(ComptrollerEvent::SharesRedeemed {
                redeemer,
                shares_quantity: redemption.quantity,
                payouts: payouts
                    .iter()
                    .map(|(asset, _, _, amount)| (*asset, *amount))
                    .collect(),
            });
            info!(?redeemer, quantity = %redemption.quantity, "Shares redeemed and swapped");
            Ok(delivered)
        })
    }

    // =========================================================================
    // EXTENSIONS
    // =========================================================================

    /// Dispatches an extension action.
    ///
    /// # Errors
    ///
    /// `FundPaused`, `InvalidExtension`, `InvalidActionId`, `Unauthorized`,
    /// or the action's own failure.
    #[instrument(skip(self, fund, args), fields(vault = ?fund.vault()))]
    pub fn call_on_extension(
        &self,
        fund: &FundCell,
        caller: Address,
        extension: Address,
        action_id: u32,
        args: &[u8],
    ) -> Result<(), ComptrollerError> {
        self.with_staged(fund, |staged| {
            let comptroller = {
                let record = staged.state.require_active()?;
                self.ensure_not_paused(record)?;
                record.address
            };
            if extension == self.extensions.fee_manager {
                let action = FeeManagerAction::try_from(action_id)?;
                self.fee_manager_action(staged, comptroller, action, args)
            } else if extension == self.extensions.integration_manager {
                let action = IntegrationManagerAction::try_from(action_id)?;
                authorize_integration(&staged.state, comptroller, caller, action)?;
                self.integration_manager_action(staged, comptroller, action, args)
            } else {
                Err(ComptrollerError::InvalidExtension(extension))
            }
        })
    }

    fn fee_manager_action(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        action: FeeManagerAction,
        args: &[u8],
    ) -> Result<(), ComptrollerError> {
        match action {
            FeeManagerAction::InvokeContinuousHook => {
                self.invoke_fee_hook(
                    staged,
                    comptroller,
                    FeeHook::Continuous,
                    &HookArgs::continuous(),
                )?;
            }
            FeeManagerAction::PayoutSharesOutstanding => {
                let fees: Vec<Address> = decode_args(args)?;
                let paid = self.with_fee_context(staged, comptroller, |ctx, config| {
                    self.fees.payout_shares_outstanding(ctx, config, &fees)
                })?;
                debug!(paid = paid.len(), "Shares outstanding paid out");
            }
        }
        staged
            .state
            .vault
            .prune_empty_assets(comptroller, &staged.custody)?;
        Ok(())
    }

    fn integration_manager_action(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        action: IntegrationManagerAction,
        args: &[u8],
    ) -> Result<(), ComptrollerError> {
        match action {
            IntegrationManagerAction::CallOnIntegration => {
                let call: IntegrationCall = decode_args(args)?;
                let event = self.with_integration_context(staged, comptroller, |manager, ctx| {
                    manager.call_on_integration(ctx, call.adapter, call.selector, &call.args)
                })?;
                staged.emit(event);
            }
            IntegrationManagerAction::AddTrackedAssets => {
                let assets: Vec<Address> = decode_args(args)?;
                self.with_integration_context(staged, comptroller, |manager, ctx| {
                    manager.add_tracked_assets(ctx, &assets)
                })?;
            }
            IntegrationManagerAction::RemoveTrackedAssets => {
                let assets: Vec<Address> = decode_args(args)?;
                self.with_integration_context(staged, comptroller, |manager, ctx| {
                    manager.remove_tracked_assets(ctx, &assets)
                })?;
            }
            IntegrationManagerAction::AddAuthUsers => {
                let users: Vec<Address> = decode_args(args)?;
                ensure_user_list(&users)?;
                let owner = staged.state.vault.owner();
                let record = staged.state.comptroller_mut(comptroller)?;
                for user in &users {
                    if user.is_zero() || *user == owner {
                        return Err(ComptrollerError::InvalidArgument(format!(
                            "{user:?} cannot be an authorized user"
                        )));
                    }
                    if !record.authorized_users.insert(*user) {
                        return Err(ComptrollerError::InvalidArgument(format!(
                            "{user:?} is already an authorized user"
                        )));
                    }
                }
                for user in users {
                    staged.emit(ComptrollerEvent::AuthUserAdded { user });
                }
            }
            IntegrationManagerAction::RemoveAuthUsers => {
                let users: Vec<Address> = decode_args(args)?;
                ensure_user_list(&users)?;
                let record = staged.state.comptroller_mut(comptroller)?;
                for user in &users {
                    if !record.authorized_users.remove(user) {
                        return Err(ComptrollerError::InvalidArgument(format!(
                            "{user:?} is not an authorized user"
                        )));
                    }
                }
                for user in users {
                    staged.emit(ComptrollerEvent::AuthUserRemoved { user });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // OWNER ACTIONS
    // =========================================================================

    /// Calls a deployer-registered contract function as the vault.
    ///
    /// # Errors
    ///
    /// `FundPaused`, `Unauthorized` for non-owners, `UnregisteredCall`,
    /// `CallFailed`.
    #[instrument(skip(self, fund, args), fields(vault = ?fund.vault()))]
    pub fn vault_call_on_contract(
        &self,
        fund: &FundCell,
        caller: Address,
        target: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<Vec<u8>, ComptrollerError> {
        self.with_staged(fund, |staged| {
            let record = staged.state.require_active()?;
            self.ensure_not_paused(record)?;
            ensure_owner(&staged.state, caller)?;
            if !self
                .deployers
                .is_registered_vault_call(record.fund_deployer, target, selector)
            {
                return Err(ComptrollerError::UnregisteredCall { target, selector });
            }
            let vault = staged.state.vault.address();
            let output = self
                .contracts
                .call(vault, target, selector, args)
                .map_err(ComptrollerError::CallFailed)?;
            staged.emit(ComptrollerEvent::VaultCallExecuted { target, selector });
            Ok(output)
        })
    }

    /// Lets the fund keep running while its deployer is paused.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `NotActive`.
    pub fn set_override_pause(
        &self,
        fund: &FundCell,
        caller: Address,
        override_pause: bool,
    ) -> Result<(), ComptrollerError> {
        self.with_staged(fund, |staged| {
            ensure_owner(&staged.state, caller)?;
            let comptroller = staged.state.require_active()?.address;
            staged.state.comptroller_mut(comptroller)?.override_pause = override_pause;
            staged.emit(ComptrollerEvent::OverridePauseSet { override_pause });
            info!(vault = ?fund.vault(), override_pause, "Override pause set");
            Ok(())
        })
    }

    /// Sets or clears (zero) the vault's migrator.
    ///
    /// # Errors
    ///
    /// Vault errors: `Unauthorized` for non-owners, `Unchanged`.
    pub fn set_migrator(
        &self,
        fund: &FundCell,
        caller: Address,
        migrator: Address,
    ) -> Result<(), ComptrollerError> {
        self.with_staged(fund, |staged| {
            staged.state.vault.set_migrator(caller, migrator)?;
            Ok(())
        })
    }

    /// Enables `policy` on a live fund.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, policy errors, `ParameterOutOfRange`.
    pub fn enable_policy(
        &self,
        fund: &FundCell,
        caller: Address,
        policy: Address,
        settings: &[u8],
    ) -> Result<(), ComptrollerError> {
        self.with_policy_config(fund, caller, policy, |policies, config, now, events| {
            policies.enable_policy_for_fund(config, policy, settings, now, events)
        })
    }

    /// Updates the settings of an enabled, updatable policy.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, policy errors, `ParameterOutOfRange`.
    pub fn update_policy_settings(
        &self,
        fund: &FundCell,
        caller: Address,
        policy: Address,
        settings: &[u8],
    ) -> Result<(), ComptrollerError> {
        self.with_policy_config(fund, caller, policy, |policies, config, _, events| {
            policies.update_policy_settings_for_fund(config, policy, settings, events)
        })
    }

    /// Disables an enabled policy.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotEnabled`.
    pub fn disable_policy(
        &self,
        fund: &FundCell,
        caller: Address,
        policy: Address,
    ) -> Result<(), ComptrollerError> {
        self.with_policy_config(fund, caller, policy, |policies, config, _, events| {
            policies.disable_policy_for_fund(config, policy, events)
        })
    }

    fn with_policy_config(
        &self,
        fund: &FundCell,
        caller: Address,
        policy: Address,
        f: impl FnOnce(
            &PolicyManager,
            &mut FundPolicyConfig,
            u64,
            &mut Vec<PolicyEvent>,
        ) -> Result<(), PolicyError>,
    ) -> Result<(), ComptrollerError> {
        self.with_staged(fund, |staged| {
            ensure_owner(&staged.state, caller)?;
            let comptroller = staged.state.require_active()?.address;
            let now = staged.now;
            let mut events = Vec::new();
            let record = staged.state.comptroller_mut(comptroller)?;
            f(&self.policies, &mut record.policies, now, &mut events)?;
            if record.policies.is_enabled(policy) {
                let values = self.policies.parameter_values(&record.policies, policy)?;
                self.check_parameter_ranges(policy, &values)?;
            }
            for event in events {
                staged.emit(event);
            }
            Ok(())
        })
    }

    // =========================================================================
    // LIFECYCLE (driven by the fund deployer)
    // =========================================================================

    /// Activates `comptroller`, which must already be the vault's accessor.
    /// On migration, shares the vault itself holds go to the owner.
    ///
    /// # Errors
    ///
    /// `NotActive` unless the record is `Inactive`, `Unauthorized` when it
    /// is not the accessor, fee activation failures.
    pub fn activate(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        is_migration: bool,
    ) -> Result<(), ComptrollerError> {
        let status = staged.state.comptroller(comptroller)?.status;
        if status != ComptrollerStatus::Inactive {
            return Err(ComptrollerError::NotActive {
                comptroller,
                status,
            });
        }
        if staged.state.vault.accessor() != comptroller {
            return Err(ComptrollerError::Unauthorized("vault accessor"));
        }
        if is_migration {
            let vault = staged.state.vault.address();
            let owner = staged.state.vault.owner();
            let held = staged.state.vault.balance_of(vault);
            if !held.is_zero() {
                staged
                    .state
                    .vault
                    .transfer_shares(comptroller, vault, owner, held)?;
            }
        }
        self.with_fee_context(staged, comptroller, |ctx, config| {
            self.fees.activate_for_fund(ctx, config)
        })?;
        staged.state.comptroller_mut(comptroller)?.status = ComptrollerStatus::Active;
        staged.emit(ComptrollerEvent::StatusChanged {
            comptroller,
            status: ComptrollerStatus::Active,
        });
        info!(?comptroller, is_migration, "Comptroller activated");
        Ok(())
    }

    /// Final fee settlement of the outgoing accessor. With `bypass_failure`
    /// a failing settlement is undone and recorded instead of aborting.
    ///
    /// # Errors
    ///
    /// `NotActive`, or the settlement failure without `bypass_failure`.
    pub fn migrate_out(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
        bypass_failure: bool,
    ) -> Result<(), ComptrollerError> {
        let status = staged.state.comptroller(comptroller)?.status;
        if status != ComptrollerStatus::Active {
            return Err(ComptrollerError::NotActive {
                comptroller,
                status,
            });
        }
        staged.flush_vault_effects();
        let savepoint = staged.custody.savepoint();
        let snapshot = bypass_failure.then(|| (staged.state.clone(), staged.events.len()));

        let settled = self.with_fee_context(staged, comptroller, |ctx, config| {
            self.fees.settle_for_migration(ctx, config)
        });
        if let Err(err) = settled {
            let Some((state, events)) = snapshot else {
                return Err(err);
            };
            staged.custody.rollback_to(savepoint);
            staged.state = state;
            staged.events.truncate(events);
            warn!(?comptroller, %err, "Migration hook failed; bypassing");
            staged.emit(ComptrollerEvent::MigrationHookFailed {
                comptroller,
                reason: err.to_string(),
            });
        }
        staged
            .state
            .vault
            .prune_empty_assets(comptroller, &staged.custody)?;
        Ok(())
    }

    /// Marks a replaced comptroller `Destructed`.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn destruct(
        &self,
        staged: &mut Staged<'_>,
        comptroller: Address,
    ) -> Result<(), ComptrollerError> {
        staged.state.comptroller_mut(comptroller)?.status = ComptrollerStatus::Destructed;
        staged.emit(ComptrollerEvent::StatusChanged {
            comptroller,
            status: ComptrollerStatus::Destructed,
        });
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Gross asset value of the fund.
    ///
    /// # Errors
    ///
    /// Valuation failures.
    pub fn calc_gav(&self, fund: &FundCell) -> Result<U256, ComptrollerError> {
        fund.read(|state| -> Result<U256, ComptrollerError> {
            let custody = CustodyTx::new(self.custody.as_ref());
            Ok(valuation::calc_gav(
                self.interpreter.as_ref(),
                &state.vault,
                &custody,
            )?)
        })
    }

    /// Gross value of one share.
    ///
    /// # Errors
    ///
    /// Valuation failures.
    pub fn calc_gross_share_value(&self, fund: &FundCell) -> Result<U256, ComptrollerError> {
        fund.read(|state| -> Result<U256, ComptrollerError> {
            let custody = CustodyTx::new(self.custody.as_ref());
            Ok(valuation::calc_gross_share_value(
                self.interpreter.as_ref(),
                &state.vault,
                &custody,
            )?)
        })
    }

    /// State of `fee` under the active comptroller.
    #[must_use]
    pub fn fee_state(&self, fund: &FundCell, fee: Address) -> Option<FeeState> {
        fund.read(|state| state.active().ok()?.fees.state(fee).cloned())
    }

    /// State of `policy` under the active comptroller.
    #[must_use]
    pub fn policy_state(&self, fund: &FundCell, policy: Address) -> Option<PolicyState> {
        fund.read(|state| state.active().ok()?.policies.state(policy).cloned())
    }

    /// Whether `fee` could pay out shares outstanding now.
    #[must_use]
    pub fn payout_allowed(&self, fund: &FundCell, fee: Address) -> bool {
        let now = self.clock.now();
        fund.read(|state| {
            state
                .active()
                .is_ok_and(|record| self.fees.payout_allowed(&record.fees, fee, now))
        })
    }

    /// Investment tokens trading may not spend.
    #[must_use]
    pub fn locked_balance(&self, fund: &FundCell, token: Address) -> U256 {
        fund.read(|state| state.locked.locked(token))
    }

    /// Lifecycle status of `comptroller`.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn status(
        &self,
        fund: &FundCell,
        comptroller: Address,
    ) -> Result<ComptrollerStatus, ComptrollerError> {
        fund.read(|state| -> Result<_, ComptrollerError> {
            Ok(state.comptroller(comptroller)?.status)
        })
    }

    /// Whether the active comptroller is paused.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn is_paused(&self, fund: &FundCell) -> Result<bool, ComptrollerError> {
        fund.read(|state| -> Result<bool, ComptrollerError> {
            let record = state.active()?;
            Ok(record.is_paused(self.deployers.release_status(record.fund_deployer)))
        })
    }

    /// Seconds until `holder` may redeem.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn timelock_remaining(
        &self,
        fund: &FundCell,
        holder: Address,
    ) -> Result<u64, ComptrollerError> {
        let now = self.clock.now();
        fund.read(|state| -> Result<u64, ComptrollerError> {
            Ok(state.active()?.timelock_remaining(holder, now))
        })
    }

    /// Committed events, oldest first.
    #[must_use]
    pub fn history(&self, fund: &FundCell) -> Vec<RecordedEvent> {
        fund.history_since(0)
    }
}

fn ensure_owner(state: &FundState, caller: Address) -> Result<(), ComptrollerError> {
    if caller == state.vault.owner() {
        Ok(())
    } else {
        Err(ComptrollerError::Unauthorized("fund owner"))
    }
}

fn authorize_integration(
    state: &FundState,
    comptroller: Address,
    caller: Address,
    action: IntegrationManagerAction,
) -> Result<(), ComptrollerError> {
    if caller == state.vault.owner() {
        return Ok(());
    }
    if action.owner_only() {
        return Err(ComptrollerError::Unauthorized("fund owner"));
    }
    if state.comptroller(comptroller)?.authorized_users.contains(&caller) {
        Ok(())
    } else {
        Err(ComptrollerError::Unauthorized("fund owner or an authorized user"))
    }
}

fn ensure_user_list(users: &[Address]) -> Result<(), ComptrollerError> {
    if users.is_empty() {
        return Err(ComptrollerError::InvalidArgument("users cannot be empty".into()));
    }
    if has_duplicates(users) {
        return Err(ComptrollerError::InvalidArgument("users contain duplicates".into()));
    }
    Ok(())
}
