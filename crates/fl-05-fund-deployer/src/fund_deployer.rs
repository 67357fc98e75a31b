//! # Fund Deployer
//!
//! One release generation. It builds comptroller configurations, deploys
//! new funds through the [`Dispatcher`] and is the entry point for moving
//! existing vaults onto its comptrollers.
//!
//! | Operation | Caller | Release |
//! |-----------|--------|---------|
//! | [`FundDeployer::create_new_fund`] | protocol controller | `Live` |
//! | [`FundDeployer::create_migrated_fund_config`] | anyone (becomes creator) | `Live` |
//! | [`FundDeployer::signal_migration`] | creator, who must be a vault migrator | `Live` |
//! | [`FundDeployer::execute_migration`] | vault migrator | `Live` |
//! | [`FundDeployer::cancel_migration`] | vault migrator | any |
//! | [`FundDeployer::set_release_status`], vault-call registry | dispatcher owner | any |

use crate::dispatcher::Dispatcher;
use crate::domain::{FundModules, ReleaseState};
use crate::errors::DeployerError;
use crate::events::{ProtocolEvent, ProtocolLog};
use fl_04_comptroller::{
    ComptrollerError, ComptrollerRecord, ComptrollerService, FundEvent, ReleaseStatus,
};
use parking_lot::RwLock;
use shared_types::{Address, Selector, U256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A configured comptroller waiting to be attached to a vault.
#[derive(Debug, Clone)]
struct PendingComptroller {
    creator: Address,
    record: ComptrollerRecord,
    events: Vec<FundEvent>,
}

/// A fund deployer generation.
pub struct FundDeployer {
    address: Address,
    controller: Address,
    release: Arc<ReleaseState>,
    dispatcher: Arc<Dispatcher>,
    comptroller: Arc<ComptrollerService>,
    pending: RwLock<BTreeMap<Address, PendingComptroller>>,
    comptroller_nonce: AtomicU64,
    log: Arc<ProtocolLog>,
}

impl FundDeployer {
    /// Generation at `address` in `PreLaunch`; only `controller` may create
    /// new funds through it.
    #[must_use]
    pub fn new(
        address: Address,
        controller: Address,
        dispatcher: Arc<Dispatcher>,
        comptroller: Arc<ComptrollerService>,
        log: Arc<ProtocolLog>,
    ) -> Self {
        Self {
            address,
            controller,
            release: Arc::new(ReleaseState::new()),
            dispatcher,
            comptroller,
            pending: RwLock::new(BTreeMap::new()),
            comptroller_nonce: AtomicU64::new(0),
            log,
        }
    }

    /// Generation id.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Release state shared with the comptrollers of this generation.
    #[must_use]
    pub fn release(&self) -> Arc<ReleaseState> {
        self.release.clone()
    }

    /// Owner, which is the dispatcher owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.dispatcher.owner()
    }

    fn record(&self, event: ProtocolEvent) {
        self.log.record(self.comptroller.now(), event);
    }

    fn ensure_live(&self) -> Result<(), DeployerError> {
        if self.release.status() == ReleaseStatus::Live {
            Ok(())
        } else {
            Err(DeployerError::ReleaseNotLive)
        }
    }

    fn ensure_migrator(&self, caller: Address, vault: Address) -> Result<(), DeployerError> {
        let fund = self.dispatcher.fund(vault)?;
        if fund.read(|state| state.vault.can_migrate(caller)) {
            Ok(())
        } else {
            Err(DeployerError::Forbidden(
                "Only a permissioned migrator can call this function",
            ))
        }
    }

    // =========================================================================
    // RELEASE STATUS
    // =========================================================================

    /// Current release status.
    #[must_use]
    pub fn release_status(&self) -> ReleaseStatus {
        self.release.status()
    }

    /// Moves the release `PreLaunch → Live` or between `Live` and `Paused`.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidArgument` for a return to `PreLaunch`,
    /// `Unchanged` for the current status.
    pub fn set_release_status(
        &self,
        caller: Address,
        next: ReleaseStatus,
    ) -> Result<(), DeployerError> {
        self.dispatcher.ensure_owner(caller)?;
        if next == ReleaseStatus::PreLaunch {
            return Err(DeployerError::InvalidArgument(
                "setReleaseStatus: Cannot return to PreLaunch status",
            ));
        }
        let prev = self.release.status();
        if prev == next {
            return Err(DeployerError::Unchanged(
                "setReleaseStatus: _nextStatus is the current status",
            ));
        }
        self.release.set_status(next);
        info!(fund_deployer = ?self.address, ?prev, ?next, "Release status set");
        self.record(ProtocolEvent::ReleaseStatusSet {
            fund_deployer: self.address,
            prev_status: prev,
            next_status: next,
        });
        Ok(())
    }

    // =========================================================================
    // VAULT CALLS
    // =========================================================================

    /// Whether vaults of this generation may call `target` with `selector`.
    #[must_use]
    pub fn is_registered_vault_call(&self, target: Address, selector: Selector) -> bool {
        self.release.is_registered(target, selector)
    }

    /// Allows `(contracts[i], selectors[i])`; either all of them or none.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `VaultCallRegistry` for empty or uneven input or a
    /// call already registered.
    pub fn register_vault_calls(
        &self,
        caller: Address,
        contracts: &[Address],
        selectors: &[Selector],
    ) -> Result<(), DeployerError> {
        self.dispatcher.ensure_owner(caller)?;
        if contracts.is_empty() {
            return Err(DeployerError::VaultCallRegistry(
                "registerVaultCalls: Empty _contracts",
            ));
        }
        if contracts.len() != selectors.len() {
            return Err(DeployerError::VaultCallRegistry(
                "__registerVaultCalls: Uneven input arrays",
            ));
        }
        {
            let mut calls = self.release.vault_calls();
            let mut next = calls.clone();
            for call in contracts.iter().copied().zip(selectors.iter().copied()) {
                if !next.insert(call) {
                    return Err(DeployerError::VaultCallRegistry(
                        "__registerVaultCalls: Call already registered",
                    ));
                }
            }
            *calls = next;
        }
        for (target, selector) in contracts.iter().zip(selectors) {
            self.record(ProtocolEvent::VaultCallRegistered {
                fund_deployer: self.address,
                target: *target,
                selector: *selector,
            });
        }
        Ok(())
    }

    /// Disallows `(contracts[i], selectors[i])`; either all of them or none.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `VaultCallRegistry` for empty or uneven input or a
    /// call that is not registered.
    pub fn deregister_vault_calls(
        &self,
        caller: Address,
        contracts: &[Address],
        selectors: &[Selector],
    ) -> Result<(), DeployerError> {
        self.dispatcher.ensure_owner(caller)?;
        if contracts.is_empty() {
            return Err(DeployerError::VaultCallRegistry(
                "deregisterVaultCalls: Empty _contracts",
            ));
        }
        if contracts.len() != selectors.len() {
            return Err(DeployerError::VaultCallRegistry(
                "deregisterVaultCalls: Uneven input arrays",
            ));
        }
        {
            let mut calls = self.release.vault_calls();
            let mut next: BTreeSet<(Address, Selector)> = calls.clone();
            for call in contracts.iter().copied().zip(selectors.iter().copied()) {
                if !next.remove(&call) {
                    return Err(DeployerError::VaultCallRegistry(
                        "deregisterVaultCalls: Call not registered",
                    ));
                }
            }
            *calls = next;
        }
        for (target, selector) in contracts.iter().zip(selectors) {
            self.record(ProtocolEvent::VaultCallDeregistered {
                fund_deployer: self.address,
                target: *target,
                selector: *selector,
            });
        }
        Ok(())
    }

    // =========================================================================
    // FUND CREATION
    // =========================================================================

    fn build_comptroller(
        &self,
        creator: Address,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: &FundModules,
    ) -> Result<(ComptrollerRecord, Vec<FundEvent>), DeployerError> {
        if denomination_asset.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "__deployComptrollerProxy: _denominationAsset cannot be empty",
            ));
        }
        let now = self.comptroller.now();
        let fee_manager = self.comptroller.fee_manager();
        let policy_manager = self.comptroller.policy_manager();

        let (fees, fee_events) =
            fee_manager.set_config_for_fund(&modules.fees, &modules.fee_settings)?;
        let (policies, policy_events) = policy_manager.set_config_for_fund(
            &modules.policies,
            &modules.policy_settings,
            now,
        )?;
        for fee in &modules.fees {
            self.check_ranges(*fee, &fee_manager.parameter_values(&fees, *fee)?)?;
        }
        for policy in &modules.policies {
            self.check_ranges(*policy, &policy_manager.parameter_values(&policies, *policy)?)?;
        }

        let nonce = self.comptroller_nonce.fetch_add(1, Ordering::Relaxed);
        let address = Address::derive("Comptroller", self.address, nonce);
        let record = ComptrollerRecord::new(
            address,
            self.address,
            creator,
            denomination_asset,
            shares_action_timelock,
            fees,
            policies,
            now,
        );
        let events = fee_events
            .into_iter()
            .map(FundEvent::from)
            .chain(policy_events.into_iter().map(FundEvent::from))
            .collect();
        Ok((record, events))
    }

    fn check_ranges(&self, module: Address, values: &[U256]) -> Result<(), DeployerError> {
        self.comptroller
            .check_parameter_ranges(module, values)
            .map_err(|err| match err {
                ComptrollerError::ParameterOutOfRange { module, .. } => {
                    DeployerError::ParameterOutOfRange { module }
                }
                other => other.into(),
            })
    }

    /// Deploys a vault owned by `owner` with a fresh comptroller. Returns
    /// `(vault, comptroller)`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the protocol controller,
    /// `ReleaseNotLive`, `InvalidArgument` for a zero owner or denomination,
    /// module configuration and range failures, `Unauthorized` from the
    /// dispatcher when this generation is not current.
    pub fn create_new_fund(
        &self,
        caller: Address,
        owner: Address,
        fund_name: &str,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: &FundModules,
    ) -> Result<(Address, Address), DeployerError> {
        if caller != self.controller {
            return Err(DeployerError::Unauthorized("protocol controller"));
        }
        self.ensure_live()?;
        if owner.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "__createNewFund: _owner cannot be empty",
            ));
        }
        let (record, events) =
            self.build_comptroller(owner, denomination_asset, shares_action_timelock, modules)?;
        let comptroller = record.address;
        let vault = self
            .dispatcher
            .deploy_vault(self.address, owner, fund_name, record, events)?;

        info!(?vault, ?comptroller, ?owner, "New fund created");
        self.record(ProtocolEvent::NewFundCreated {
            creator: owner,
            vault,
            comptroller,
            denomination_asset,
        });
        Ok((vault, comptroller))
    }

    // =========================================================================
    // MIGRATION
    // =========================================================================

    /// Configures a comptroller for a vault that will migrate onto this
    /// generation. `caller` becomes its creator.
    ///
    /// # Errors
    ///
    /// `ReleaseNotLive`, `InvalidArgument` for a zero denomination, module
    /// configuration and range failures.
    pub fn create_migrated_fund_config(
        &self,
        caller: Address,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: &FundModules,
    ) -> Result<Address, DeployerError> {
        self.ensure_live()?;
        let (record, events) =
            self.build_comptroller(caller, denomination_asset, shares_action_timelock, modules)?;
        let comptroller = record.address;
        self.pending.write().insert(
            comptroller,
            PendingComptroller {
                creator: caller,
                record,
                events,
            },
        );
        debug!(?comptroller, creator = ?caller, "Migrated fund config created");
        self.record(ProtocolEvent::ComptrollerConfigCreated {
            fund_deployer: self.address,
            comptroller,
            creator: caller,
        });
        Ok(comptroller)
    }

    /// Creator of a comptroller configured for migration and not yet
    /// signalled.
    #[must_use]
    pub fn pending_comptroller_creator(&self, comptroller: Address) -> Option<Address> {
        self.pending
            .read()
            .get(&comptroller)
            .map(|pending| pending.creator)
    }

    /// Requests that `vault` move onto `comptroller`. Returns the earliest
    /// execution time.
    ///
    /// # Errors
    ///
    /// `ReleaseNotLive`, `Unauthorized` unless `caller` created
    /// `comptroller`, `Forbidden` unless `caller` may migrate the vault,
    /// dispatcher rejections.
    pub fn signal_migration(
        &self,
        caller: Address,
        vault: Address,
        comptroller: Address,
    ) -> Result<u64, DeployerError> {
        self.ensure_live()?;
        if self.pending_comptroller_creator(comptroller) != Some(caller) {
            return Err(DeployerError::Unauthorized("ComptrollerProxy creator"));
        }
        self.ensure_migrator(caller, vault)?;

        let Some(pending) = self.pending.write().remove(&comptroller) else {
            return Err(DeployerError::Unauthorized("ComptrollerProxy creator"));
        };
        let signaled = self.dispatcher.signal_migration(
            self.address,
            vault,
            pending.record.clone(),
            pending.events.clone(),
        );
        if signaled.is_err() {
            self.pending.write().insert(comptroller, pending);
        }
        signaled
    }

    /// Executes the pending request of `vault`.
    ///
    /// # Errors
    ///
    /// `ReleaseNotLive`, `Forbidden` unless `caller` may migrate the vault,
    /// dispatcher rejections.
    pub fn execute_migration(
        &self,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        self.ensure_live()?;
        self.ensure_migrator(caller, vault)?;
        self.dispatcher
            .execute_migration(self.address, vault, bypass_failure)
    }

    /// Cancels the pending request of `vault`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `caller` may migrate the vault, dispatcher
    /// rejections.
    pub fn cancel_migration(
        &self,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        self.ensure_migrator(caller, vault)?;
        self.dispatcher
            .cancel_migration(self.address, vault, bypass_failure)
    }

    /// Owner-only cancellation with hook failures bypassed.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, dispatcher rejections.
    pub fn cancel_migration_emergency(
        &self,
        caller: Address,
        vault: Address,
    ) -> Result<(), DeployerError> {
        self.dispatcher.ensure_owner(caller)?;
        self.dispatcher.cancel_migration(self.address, vault, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use fl_02_fee_engine::ManagementFeeSettings;
    use shared_types::math::from_dec;

    const TARGET: Address = Address::new([0x7A; 20]);
    const SELECTOR: Selector = [0xAA, 0xBB, 0xCC, 0xDD];

    #[test]
    fn test_release_status_transitions() {
        let fx = Fixture::new(0);
        let deployer = fx.engine.deploy_fund_deployer(OWNER).unwrap();
        assert_eq!(deployer.release_status(), ReleaseStatus::PreLaunch);

        assert!(deployer.set_release_status(STRANGER, ReleaseStatus::Live).is_err());
        deployer.set_release_status(OWNER, ReleaseStatus::Live).unwrap();
        deployer.set_release_status(OWNER, ReleaseStatus::Paused).unwrap();
        assert!(matches!(
            deployer.set_release_status(OWNER, ReleaseStatus::Paused),
            Err(DeployerError::Unchanged(_))
        ));
        assert!(matches!(
            deployer.set_release_status(OWNER, ReleaseStatus::PreLaunch),
            Err(DeployerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_vault_call_registry_is_all_or_nothing() {
        let fx = Fixture::new(0);
        let deployer = &fx.deployer;

        assert_eq!(
            deployer.register_vault_calls(OWNER, &[], &[]),
            Err(DeployerError::VaultCallRegistry("registerVaultCalls: Empty _contracts"))
        );
        assert!(deployer
            .register_vault_calls(OWNER, &[TARGET], &[SELECTOR, SELECTOR])
            .is_err());

        deployer
            .register_vault_calls(OWNER, &[TARGET], &[SELECTOR])
            .unwrap();
        assert!(deployer.is_registered_vault_call(TARGET, SELECTOR));

        let other = [0x01, 0x02, 0x03, 0x04];
        assert!(deployer
            .register_vault_calls(OWNER, &[TARGET, TARGET], &[other, SELECTOR])
            .is_err());
        assert!(
            !deployer.is_registered_vault_call(TARGET, other),
            "a rejected batch registers nothing"
        );

        deployer
            .deregister_vault_calls(OWNER, &[TARGET], &[SELECTOR])
            .unwrap();
        assert!(!deployer.is_registered_vault_call(TARGET, SELECTOR));
        assert_eq!(
            deployer.deregister_vault_calls(OWNER, &[TARGET], &[SELECTOR]),
            Err(DeployerError::VaultCallRegistry(
                "deregisterVaultCalls: Call not registered"
            ))
        );
    }

    #[test]
    fn test_only_controller_creates_funds() {
        let fx = Fixture::new(0);
        let result = fx.deployer.create_new_fund(
            STRANGER,
            MANAGER,
            "Fund",
            DENOM,
            0,
            &FundModules::default(),
        );
        assert_eq!(result, Err(DeployerError::Unauthorized("protocol controller")));
    }

    #[test]
    fn test_migrated_config_checks_parameter_ranges() {
        let fx = Fixture::new(0);
        let settings = serde_json::to_vec(&ManagementFeeSettings {
            scaled_per_second_rate: from_dec("1000000002000000000000000000").unwrap(),
        })
        .unwrap();
        let modules = FundModules::default().with_fee(MANAGEMENT, settings);

        assert_eq!(
            fx.deployer
                .create_migrated_fund_config(MANAGER, DENOM, 0, &modules),
            Err(DeployerError::ParameterOutOfRange { module: MANAGEMENT })
        );
    }

    #[test]
    fn test_signal_requires_creator_and_migrator() {
        let fx = Fixture::new(0);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);

        let by_stranger = next_generation
            .create_migrated_fund_config(STRANGER, DENOM, 0, &FundModules::default())
            .unwrap();
        assert_eq!(
            next_generation.signal_migration(STRANGER, vault, by_stranger),
            Err(DeployerError::Forbidden(
                "Only a permissioned migrator can call this function"
            ))
        );

        let by_manager = next_generation
            .create_migrated_fund_config(MANAGER, DENOM, 0, &FundModules::default())
            .unwrap();
        assert_eq!(
            next_generation.signal_migration(STRANGER, vault, by_manager),
            Err(DeployerError::Unauthorized("ComptrollerProxy creator"))
        );
    }

    #[test]
    fn test_permissioned_migrator_can_signal() {
        let fx = Fixture::new(0);
        let (vault, _) = fx.create_fund(&FundModules::default());
        fx.engine
            .comptroller()
            .set_migrator(&fx.fund(vault), MANAGER, STRANGER)
            .unwrap();
        let next_generation = Fixture::launch_generation(&fx.engine);

        let comptroller = next_generation
            .create_migrated_fund_config(STRANGER, DENOM, 0, &FundModules::default())
            .unwrap();
        next_generation
            .signal_migration(STRANGER, vault, comptroller)
            .unwrap();
        next_generation.execute_migration(STRANGER, vault, false).unwrap();
        assert_eq!(fx.fund(vault).read(|state| state.vault.accessor()), comptroller);
    }

    #[test]
    fn test_paused_release_blocks_migration_but_not_cancel() {
        let fx = Fixture::new(100);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        fx.signal(&next_generation, vault);
        next_generation
            .set_release_status(OWNER, ReleaseStatus::Paused)
            .unwrap();

        assert_eq!(
            next_generation.execute_migration(MANAGER, vault, false),
            Err(DeployerError::ReleaseNotLive)
        );
        assert!(next_generation
            .cancel_migration_emergency(STRANGER, vault)
            .is_err());
        next_generation.cancel_migration_emergency(OWNER, vault).unwrap();
        assert!(!fx.engine.dispatcher().has_migration_request(vault).unwrap());
    }
}
