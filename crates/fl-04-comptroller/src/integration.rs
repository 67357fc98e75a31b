//! # Integration Manager
//!
//! Registry of trade adapters and the checked execution of
//! `callOnIntegration`.
//!
//! ```text
//! parse assets ─→ validate ─→ locked-balance rule ─→ approve + hand over
//!      ─→ adapter.take_order ─→ post-trade checks ─→ track incoming / prune spent
//! ```
//!
//! Authorisation (owner or authorised user) is checked by the comptroller
//! before anything here runs.

use crate::errors::IntegrationError;
use crate::events::ComptrollerEvent;
use crate::ports::{AssetsForMethod, IntegrationAdapter, ValueInterpreter};
use fl_01_vault::{CustodyTx, VaultState};
use fl_02_fee_engine::LockedBalances;
use parking_lot::RwLock;
use shared_types::{has_duplicates, Address, Selector, U256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Staged fund view an integration call works on.
pub struct IntegrationContext<'a, 'c> {
    /// Accessor comptroller.
    pub comptroller: Address,
    /// Staged vault.
    pub vault: &'a mut VaultState,
    /// Journaled custody.
    pub custody: &'a mut CustodyTx<'c>,
    /// Investment-fee locked balances.
    pub locked: &'a LockedBalances,
    /// Asset support checks.
    pub interpreter: &'a dyn ValueInterpreter,
}

impl IntegrationContext<'_, '_> {
    fn vault_balance(&self, asset: Address) -> U256 {
        self.custody.balance_of(asset, self.vault.address())
    }

    fn is_receivable(&self, asset: Address) -> bool {
        asset == self.vault.denomination_asset() || self.interpreter.is_supported_asset(asset)
    }
}

/// Adapter registry and trade execution.
#[derive(Default)]
pub struct IntegrationManager {
    adapters: RwLock<BTreeMap<Address, Arc<dyn IntegrationAdapter>>>,
}

impl IntegrationManager {
    /// Manager with no adapters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Registers adapters.
    ///
    /// # Errors
    ///
    /// `EmptyAdapterList`, `InvalidAssets` for duplicates in the list,
    /// `AdapterAlreadyRegistered`.
    pub fn register_adapters(
        &self,
        adapters: Vec<Arc<dyn IntegrationAdapter>>,
    ) -> Result<(), IntegrationError> {
        if adapters.is_empty() {
            return Err(IntegrationError::EmptyAdapterList);
        }
        let ids: Vec<Address> = adapters.iter().map(|adapter| adapter.address()).collect();
        if has_duplicates(&ids) {
            return Err(IntegrationError::InvalidAssets("duplicate adapters"));
        }
        let mut registry = self.adapters.write();
        if let Some(id) = ids.iter().find(|id| registry.contains_key(id)) {
            return Err(IntegrationError::AdapterAlreadyRegistered(*id));
        }
        for adapter in adapters {
            info!(adapter = ?adapter.address(), identifier = adapter.identifier(), "Adapter registered");
            registry.insert(adapter.address(), adapter);
        }
        Ok(())
    }

    /// Deregisters adapters.
    ///
    /// # Errors
    ///
    /// `EmptyAdapterList` or `AdapterNotRegistered`.
    pub fn deregister_adapters(&self, ids: &[Address]) -> Result<(), IntegrationError> {
        if ids.is_empty() {
            return Err(IntegrationError::EmptyAdapterList);
        }
        let mut registry = self.adapters.write();
        if let Some(id) = ids.iter().find(|id| !registry.contains_key(id)) {
            return Err(IntegrationError::AdapterNotRegistered(*id));
        }
        for id in ids {
            registry.remove(id);
            info!(adapter = ?id, "Adapter deregistered");
        }
        Ok(())
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: Address) -> bool {
        self.adapters.read().contains_key(&id)
    }

    /// Registered adapter ids.
    #[must_use]
    pub fn registered(&self) -> Vec<Address> {
        self.adapters.read().keys().copied().collect()
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Executes a trade through `adapter`.
    ///
    /// # Errors
    ///
    /// `AdapterNotRegistered`, asset-list violations, `LockedBalance`,
    /// adapter failures, `ReceivedLessThanExpected`, `SpentMoreThanExpected`.
    #[instrument(skip(self, ctx, args), fields(vault = ?ctx.vault.address()))]
    pub fn call_on_integration(
        &self,
        ctx: &mut IntegrationContext<'_, '_>,
        adapter: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<ComptrollerEvent, IntegrationError> {
        let module = self
            .adapters
            .read()
            .get(&adapter)
            .cloned()
            .ok_or(IntegrationError::AdapterNotRegistered(adapter))?;

        let assets = module.parse_assets_for_method(selector, args)?;
        validate_assets(ctx, &assets)?;

        for (asset, max_spend) in &assets.spend_assets {
            let spendable = ctx.locked.spendable(*asset, ctx.vault_balance(*asset));
            if *max_spend > spendable {
                return Err(IntegrationError::LockedBalance {
                    asset: *asset,
                    spend: *max_spend,
                    spendable,
                });
            }
        }

        let incoming_before: Vec<U256> = assets
            .incoming_assets
            .iter()
            .map(|(asset, _)| ctx.vault_balance(*asset))
            .collect();
        let spend_before: Vec<U256> = assets
            .spend_assets
            .iter()
            .map(|(asset, _)| ctx.vault_balance(*asset))
            .collect();

        for (asset, max_spend) in &assets.spend_assets {
            ctx.vault
                .approve_asset_spender(ctx.comptroller, *asset, adapter, *max_spend)?;
            ctx.vault
                .spend_allowance(ctx.custody, *asset, adapter, *max_spend)?;
        }

        let vault = ctx.vault.address();
        module.take_order(ctx.custody, vault, selector, args)?;

        let mut incoming = Vec::with_capacity(assets.incoming_assets.len());
        for ((asset, min_incoming), before) in assets.incoming_assets.iter().zip(incoming_before) {
            let received = ctx.vault_balance(*asset).saturating_sub(before);
            if received < *min_incoming {
                return Err(IntegrationError::ReceivedLessThanExpected {
                    asset: *asset,
                    expected: *min_incoming,
                    received,
                });
            }
            ctx.vault.add_tracked_asset(ctx.comptroller, *asset)?;
            incoming.push((*asset, received));
        }

        let mut spent = Vec::with_capacity(assets.spend_assets.len());
        for ((asset, max_spend), before) in assets.spend_assets.iter().zip(spend_before) {
            let after = ctx.vault_balance(*asset);
            let amount = before.saturating_sub(after);
            if amount > *max_spend {
                return Err(IntegrationError::SpentMoreThanExpected {
                    asset: *asset,
                    max: *max_spend,
                    spent: amount,
                });
            }
            if after.is_zero()
                && *asset != ctx.vault.denomination_asset()
                && ctx.vault.is_tracked_asset(*asset)
            {
                ctx.vault
                    .remove_tracked_asset(ctx.comptroller, ctx.custody, *asset)?;
            }
            spent.push((*asset, amount));
        }

        debug!(?adapter, incoming = incoming.len(), "Integration call settled");
        Ok(ComptrollerEvent::CallOnIntegrationExecuted {
            adapter,
            selector,
            incoming,
            spent,
        })
    }

    /// Starts tracking `assets`.
    ///
    /// # Errors
    ///
    /// `InvalidAssets` for an empty or duplicated list, `CannotTrack` for
    /// unsupported or zero-balance assets.
    pub fn add_tracked_assets(
        &self,
        ctx: &mut IntegrationContext<'_, '_>,
        assets: &[Address],
    ) -> Result<(), IntegrationError> {
        ensure_list(assets)?;
        for asset in assets {
            if !ctx.is_receivable(*asset) || ctx.vault_balance(*asset).is_zero() {
                return Err(IntegrationError::CannotTrack(*asset));
            }
            ctx.vault.add_tracked_asset(ctx.comptroller, *asset)?;
        }
        Ok(())
    }

    /// Stops tracking `assets`; the vault's own rules apply.
    ///
    /// # Errors
    ///
    /// `InvalidAssets` for an empty or duplicated list, or the vault error.
    pub fn remove_tracked_assets(
        &self,
        ctx: &mut IntegrationContext<'_, '_>,
        assets: &[Address],
    ) -> Result<(), IntegrationError> {
        ensure_list(assets)?;
        for asset in assets {
            ctx.vault
                .remove_tracked_asset(ctx.comptroller, ctx.custody, *asset)?;
        }
        Ok(())
    }
}

fn ensure_list(assets: &[Address]) -> Result<(), IntegrationError> {
    if assets.is_empty() {
        return Err(IntegrationError::InvalidAssets("assets cannot be empty"));
    }
    if has_duplicates(assets) {
        return Err(IntegrationError::InvalidAssets("duplicate assets"));
    }
    Ok(())
}

fn validate_assets(
    ctx: &IntegrationContext<'_, '_>,
    assets: &AssetsForMethod,
) -> Result<(), IntegrationError> {
    if assets.incoming_assets.is_empty() {
        return Err(IntegrationError::InvalidAssets("incoming assets cannot be empty"));
    }
    if assets.spend_assets.is_empty() {
        return Err(IntegrationError::InvalidAssets("spend assets cannot be empty"));
    }
    let incoming: Vec<Address> = assets.incoming_assets.iter().map(|(a, _)| *a).collect();
    let spend: Vec<Address> = assets.spend_assets.iter().map(|(a, _)| *a).collect();
    if has_duplicates(&incoming) || has_duplicates(&spend) {
        return Err(IntegrationError::InvalidAssets("duplicate assets"));
    }
    for (asset, min_incoming) in &assets.incoming_assets {
        if min_incoming.is_zero() {
            return Err(IntegrationError::InvalidAssets("min incoming amount must be > 0"));
        }
        if !ctx.is_receivable(*asset) {
            return Err(IntegrationError::UnsupportedIncomingAsset(*asset));
        }
    }
    if assets.spend_assets.iter().any(|(_, max)| max.is_zero()) {
        return Err(IntegrationError::InvalidAssets("max spend amount must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{PriceTableInterpreter, RouterAdapter, TakeOrderArgs, TAKE_ORDER};
    use fl_01_vault::{AssetCustody, FixedRateRouter, InMemoryCustody};
    use shared_types::math::ether;
    use shared_types::{ErrorKind, ManualClock};

    const VAULT: Address = Address::new([0x0A; 20]);
    const COMPTROLLER: Address = Address::new([0xC0; 20]);
    const DENOM: Address = Address::new([0xE0; 20]);
    const WETH: Address = Address::new([0xE1; 20]);
    const ADAPTER: Address = Address::new([0xAD; 20]);
    const ROUTER: Address = Address::new([0x88; 20]);

    struct Harness {
        custody: InMemoryCustody,
        interpreter: PriceTableInterpreter,
        manager: IntegrationManager,
        vault: VaultState,
        locked: LockedBalances,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(1_000));
            let router = Arc::new(FixedRateRouter::new(ROUTER, clock.clone()));
            // 1 DENOM buys 2 WETH.
            router.set_rate(DENOM, WETH, U256::from(2), U256::one());
            let custody = InMemoryCustody::new();
            custody.mint(DENOM, VAULT, ether(100));
            custody.mint(WETH, ROUTER, ether(1_000));

            let interpreter = PriceTableInterpreter::new(clock, 3_600);
            interpreter.set_price(DENOM, ether(1), 18);
            interpreter.set_price(WETH, ether(1), 18);

            let manager = IntegrationManager::new();
            manager
                .register_adapters(vec![Arc::new(RouterAdapter::new(ADAPTER, router))])
                .unwrap();
            let vault = VaultState::new(
                VAULT,
                Address::repeat_byte(0xD1),
                Address::repeat_byte(0x01),
                COMPTROLLER,
                DENOM,
                "Fund",
                "FND",
            );
            Self {
                custody,
                interpreter,
                manager,
                vault,
                locked: LockedBalances::new(),
            }
        }

        fn trade(&mut self, amount: U256, min_incoming: U256) -> Result<ComptrollerEvent, IntegrationError> {
            let args = TakeOrderArgs {
                path: vec![DENOM, WETH],
                outgoing_amount: amount,
                min_incoming_amount: min_incoming,
                deadline: u64::MAX,
            }
            .encode()
            .unwrap();
            let mut custody = CustodyTx::new(&self.custody);
            let mut ctx = IntegrationContext {
                comptroller: COMPTROLLER,
                vault: &mut self.vault,
                custody: &mut custody,
                locked: &self.locked,
                interpreter: &self.interpreter,
            };
            let event = self
                .manager
                .call_on_integration(&mut ctx, ADAPTER, TAKE_ORDER, &args)?;
            custody.commit();
            Ok(event)
        }
    }

    #[test]
    fn test_trade_tracks_incoming_asset() {
        let mut harness = Harness::new();
        let event = harness.trade(ether(10), ether(20)).unwrap();
        assert_eq!(
            event,
            ComptrollerEvent::CallOnIntegrationExecuted {
                adapter: ADAPTER,
                selector: TAKE_ORDER,
                incoming: vec![(WETH, ether(20))],
                spent: vec![(DENOM, ether(10))],
            }
        );
        assert!(harness.vault.is_tracked_asset(WETH));
        assert_eq!(harness.custody.balance_of(DENOM, VAULT), ether(90));
        assert_eq!(harness.custody.balance_of(WETH, VAULT), ether(20));
    }

    #[test]
    fn test_min_incoming_is_enforced() {
        let mut harness = Harness::new();
        let err = harness.trade(ether(10), ether(21)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);
        // Journal rolled back.
        assert_eq!(harness.custody.balance_of(DENOM, VAULT), ether(100));
    }

    #[test]
    fn test_locked_balance_boundary() {
        let mut harness = Harness::new();
        harness.locked.lock(DENOM, ether(40)).unwrap();
        assert!(matches!(
            harness.trade(ether(60) + U256::one(), U256::one()),
            Err(IntegrationError::LockedBalance { .. })
        ));
        assert!(harness.trade(ether(60), U256::one()).is_ok());
    }

    #[test]
    fn test_unregistered_adapter() {
        let harness = Harness::new();
        harness.manager.deregister_adapters(&[ADAPTER]).unwrap();
        assert_eq!(
            harness.manager.deregister_adapters(&[ADAPTER]),
            Err(IntegrationError::AdapterNotRegistered(ADAPTER))
        );
        assert!(harness.manager.registered().is_empty());
    }

    #[test]
    fn test_add_tracked_assets_requires_balance() {
        let mut harness = Harness::new();
        let mut custody = CustodyTx::new(&harness.custody);
        let mut ctx = IntegrationContext {
            comptroller: COMPTROLLER,
            vault: &mut harness.vault,
            custody: &mut custody,
            locked: &harness.locked,
            interpreter: &harness.interpreter,
        };
        assert_eq!(
            harness.manager.add_tracked_assets(&mut ctx, &[WETH]),
            Err(IntegrationError::CannotTrack(WETH))
        );
        assert_eq!(
            harness.manager.add_tracked_assets(&mut ctx, &[]),
            Err(IntegrationError::InvalidAssets("assets cannot be empty"))
        );
        assert!(matches!(
            harness.manager.remove_tracked_assets(&mut ctx, &[DENOM]),
            Err(IntegrationError::Vault(_))
        ));
    }
}
