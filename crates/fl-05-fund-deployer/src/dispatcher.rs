//! # Dispatcher
//!
//! Owner of every vault and of the migration state machine. Vaults are
//! created through the current fund deployer and keep their address for
//! life; migration moves a vault's accessor from one deployer generation's
//! comptroller to the next.
//!
//! ```text
//!            signal (current deployer)
//!   none ─────────────────────────────→ pending ──execute──→ none
//!     ↑                                    │      (target deployer, still current,
//!     └──────────── cancel ────────────────┘       timelock elapsed)
//!         (target deployer or vault migrator)
//! ```
//!
//! Execution runs the outgoing comptroller's migrate-out hook, swaps the
//! accessor, destructs the outgoing comptroller and activates the incoming
//! one. Locked balances, the referral book and the share supply carry over
//! untouched.

use crate::directory::ReleaseDirectory;
use crate::domain::Ownership;
use crate::errors::DeployerError;
use crate::events::{ProtocolEvent, ProtocolLog};
use fl_01_vault::VaultState;
use fl_04_comptroller::{
    ComptrollerRecord, ComptrollerService, FundCell, FundEvent, FundState, MigrationRequest, Staged,
};
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Vault registry and migration coordinator.
pub struct Dispatcher {
    address: Address,
    ownership: RwLock<Ownership>,
    current_fund_deployer: RwLock<Address>,
    migration_timelock: RwLock<u64>,
    shares_token_symbol: RwLock<String>,
    vaults: RwLock<BTreeMap<Address, Arc<FundCell>>>,
    vault_nonce: AtomicU64,
    comptroller: Arc<ComptrollerService>,
    directory: Arc<ReleaseDirectory>,
    log: Arc<ProtocolLog>,
}

impl Dispatcher {
    /// Dispatcher owned by `owner` with no current fund deployer.
    #[must_use]
    pub fn new(
        owner: Address,
        migration_timelock: u64,
        shares_token_symbol: impl Into<String>,
        comptroller: Arc<ComptrollerService>,
        directory: Arc<ReleaseDirectory>,
        log: Arc<ProtocolLog>,
    ) -> Self {
        Self {
            address: Address::derive("Dispatcher", owner, 0),
            ownership: RwLock::new(Ownership::new(owner)),
            current_fund_deployer: RwLock::new(Address::ZERO),
            migration_timelock: RwLock::new(migration_timelock),
            shares_token_symbol: RwLock::new(shares_token_symbol.into()),
            vaults: RwLock::new(BTreeMap::new()),
            vault_nonce: AtomicU64::new(0),
            comptroller,
            directory,
            log,
        }
    }

    /// Creator of every vault.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    fn record(&self, event: ProtocolEvent) {
        self.log.record(self.comptroller.now(), event);
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.ownership.read().owner()
    }

    /// Pending nominee, if any.
    #[must_use]
    pub fn nominated_owner(&self) -> Option<Address> {
        self.ownership.read().nominated()
    }

    /// Fails unless `caller` owns the dispatcher.
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), DeployerError> {
        self.ownership.read().ensure_owner(caller)
    }

    /// Nominates `next` as the new owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized`; `InvalidArgument` for zero, the owner or the nominee.
    pub fn set_nominated_owner(&self, caller: Address, next: Address) -> Result<(), DeployerError> {
        self.ownership.write().nominate(caller, next)?;
        self.record(ProtocolEvent::NominatedOwnerSet { nominee: next });
        Ok(())
    }

    /// Withdraws the pending nomination.
    ///
    /// # Errors
    ///
    /// `Unauthorized`; `InvalidArgument` with nobody nominated.
    pub fn remove_nominated_owner(&self, caller: Address) -> Result<(), DeployerError> {
        let nominee = self.ownership.write().remove_nomination(caller)?;
        self.record(ProtocolEvent::NominatedOwnerRemoved { nominee });
        Ok(())
    }

    /// Nominee takes ownership.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the nominee.
    pub fn claim_ownership(&self, caller: Address) -> Result<(), DeployerError> {
        let prev_owner = self.ownership.write().claim(caller)?;
        info!(?prev_owner, next_owner = ?caller, "Dispatcher ownership transferred");
        self.record(ProtocolEvent::OwnershipTransferred {
            prev_owner,
            next_owner: caller,
        });
        Ok(())
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Generation that deploys new funds and accepts migrations.
    #[must_use]
    pub fn current_fund_deployer(&self) -> Address {
        *self.current_fund_deployer.read()
    }

    /// Switches the current generation.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidArgument` for zero, `UnknownFundDeployer`,
    /// `Unchanged` for the current generation.
    pub fn set_current_fund_deployer(
        &self,
        caller: Address,
        next: Address,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        if next.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "_nextFundDeployer cannot be empty",
            ));
        }
        if !self.directory.contains(next) {
            return Err(DeployerError::UnknownFundDeployer(next));
        }
        let prev = {
            let mut current = self.current_fund_deployer.write();
            if *current == next {
                return Err(DeployerError::Unchanged(
                    "setCurrentFundDeployer: _nextFundDeployer is already currentFundDeployer",
                ));
            }
            std::mem::replace(&mut *current, next)
        };
        info!(prev = ?prev, next = ?next, "Current fund deployer set");
        self.record(ProtocolEvent::CurrentFundDeployerSet {
            prev_fund_deployer: prev,
            next_fund_deployer: next,
        });
        Ok(())
    }

    /// Seconds between signalling and executing a migration.
    #[must_use]
    pub fn migration_timelock(&self) -> u64 {
        *self.migration_timelock.read()
    }

    /// Changes the migration timelock. Applies to pending requests too.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Unchanged` for the current value.
    pub fn set_migration_timelock(&self, caller: Address, next: u64) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        let prev = {
            let mut timelock = self.migration_timelock.write();
            if *timelock == next {
                return Err(DeployerError::Unchanged(
                    "setMigrationTimelock: _nextTimelock is the current timelock",
                ));
            }
            std::mem::replace(&mut *timelock, next)
        };
        self.record(ProtocolEvent::MigrationTimelockSet {
            prev_timelock: prev,
            next_timelock: next,
        });
        Ok(())
    }

    /// Symbol given to newly deployed shares.
    #[must_use]
    pub fn shares_token_symbol(&self) -> String {
        self.shares_token_symbol.read().clone()
    }

    /// Changes the shares symbol for future vaults.
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub fn set_shares_token_symbol(
        &self,
        caller: Address,
        symbol: impl Into<String>,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        let symbol = symbol.into();
        *self.shares_token_symbol.write() = symbol.clone();
        self.record(ProtocolEvent::SharesTokenSymbolSet { symbol });
        Ok(())
    }

    fn ensure_current_fund_deployer(&self, caller: Address) -> Result<(), DeployerError> {
        if caller == self.current_fund_deployer() {
            Ok(())
        } else {
            Err(DeployerError::Unauthorized("current FundDeployer"))
        }
    }

    // =========================================================================
    // VAULT REGISTRY
    // =========================================================================

    /// Deploys a vault accessed by `comptroller` and activates it.
    /// `setup_events` (fee and policy configuration) open the fund history.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the current fund deployer,
    /// activation failures.
    pub fn deploy_vault(
        &self,
        caller: Address,
        owner: Address,
        fund_name: &str,
        comptroller: ComptrollerRecord,
        setup_events: Vec<FundEvent>,
    ) -> Result<Address, DeployerError> {
        self.ensure_current_fund_deployer(caller)?;
        let nonce = self.vault_nonce.fetch_add(1, Ordering::Relaxed);
        let vault_address = Address::derive("Vault", self.address, nonce);
        let comptroller_address = comptroller.address;
        let vault = VaultState::new(
            vault_address,
            self.address,
            owner,
            comptroller_address,
            comptroller.denomination_asset,
            fund_name,
            self.shares_token_symbol(),
        );
        let cell = Arc::new(FundCell::new(FundState::new(vault, comptroller)));
        self.comptroller.with_staged(&cell, |staged| {
            for event in setup_events {
                staged.emit(event);
            }
            self.comptroller.activate(staged, comptroller_address, false)
        })?;
        self.vaults.write().insert(vault_address, cell);

        info!(vault = ?vault_address, comptroller = ?comptroller_address, "Vault deployed");
        self.record(ProtocolEvent::VaultProxyDeployed {
            fund_deployer: caller,
            vault: vault_address,
            owner,
            comptroller: comptroller_address,
            fund_name: fund_name.to_string(),
        });
        Ok(vault_address)
    }

    /// Fund record of `vault`.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn fund(&self, vault: Address) -> Result<Arc<FundCell>, DeployerError> {
        self.vaults
            .read()
            .get(&vault)
            .cloned()
            .ok_or(DeployerError::UnknownVault(vault))
    }

    /// Every deployed vault.
    #[must_use]
    pub fn vaults(&self) -> Vec<Address> {
        self.vaults.read().keys().copied().collect()
    }

    /// Generation of the vault's active comptroller.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn get_fund_deployer_for_vault(&self, vault: Address) -> Result<Address, DeployerError> {
        let cell = self.fund(vault)?;
        cell.read(|state| -> Result<Address, DeployerError> {
            Ok(state.active()?.fund_deployer)
        })
    }

    // =========================================================================
    // MIGRATION
    // =========================================================================

    /// Outstanding request for `vault`.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn migration_request(&self, vault: Address) -> Result<Option<MigrationRequest>, DeployerError> {
        Ok(self.fund(vault)?.read(|state| state.migration.clone()))
    }

    /// Whether `vault` has an outstanding request.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn has_migration_request(&self, vault: Address) -> Result<bool, DeployerError> {
        Ok(self.migration_request(vault)?.is_some())
    }

    /// Whether the outstanding request's timelock has elapsed.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn has_executable_migration_request(&self, vault: Address) -> Result<bool, DeployerError> {
        let timelock = self.migration_timelock();
        let now = self.comptroller.now();
        Ok(self
            .migration_request(vault)?
            .is_some_and(|request| request.is_executable(timelock, now)))
    }

    /// Seconds until the outstanding request is executable; zero without a
    /// request.
    ///
    /// # Errors
    ///
    /// `UnknownVault`.
    pub fn get_timelock_remaining_for_migration_request(
        &self,
        vault: Address,
    ) -> Result<u64, DeployerError> {
        let timelock = self.migration_timelock();
        let now = self.comptroller.now();
        Ok(self
            .migration_request(vault)?
            .map_or(0, |request| request.timelock_remaining(timelock, now)))
    }

    /// Stores a request to move `vault` to `next`, a comptroller of the
    /// calling generation. Returns the earliest execution time.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the current fund deployer,
    /// `Migration` when a request exists or the vault already belongs to
    /// `caller`.
    #[instrument(skip(self, next, setup_events), fields(next_comptroller = ?next.address))]
    pub fn signal_migration(
        &self,
        caller: Address,
        vault: Address,
        next: ComptrollerRecord,
        setup_events: Vec<FundEvent>,
    ) -> Result<u64, DeployerError> {
        self.ensure_current_fund_deployer(caller)?;
        let cell = self.fund(vault)?;
        let timelock = self.migration_timelock();
        let next_comptroller = next.address;

        let (request, executable_at) =
            self.comptroller
                .with_staged(&cell, |staged| -> Result<_, DeployerError> {
                    if staged.state.migration.is_some() {
                        return Err(DeployerError::Migration(
                            "signalMigration: Fund is already migrating",
                        ));
                    }
                    let prev = staged.state.require_active()?;
                    if prev.fund_deployer == caller {
                        return Err(DeployerError::Migration(
                            "signalMigration: Can only migrate to a new FundDeployer",
                        ));
                    }
                    let request = MigrationRequest {
                        vault,
                        prev_comptroller: prev.address,
                        next_comptroller,
                        prev_fund_deployer: prev.fund_deployer,
                        next_fund_deployer: caller,
                        signaled_at: staged.now,
                    };
                    for event in setup_events {
                        staged.emit(event);
                    }
                    staged.state.comptrollers.insert(next_comptroller, next);
                    staged.state.migration = Some(request.clone());
                    Ok((request, staged.now.saturating_add(timelock)))
                })?;

        info!(?vault, executable_at, "Migration signaled");
        self.record(ProtocolEvent::MigrationSignaled {
            vault,
            prev_fund_deployer: request.prev_fund_deployer,
            next_fund_deployer: request.next_fund_deployer,
            next_comptroller,
            executable_at,
        });
        Ok(executable_at)
    }

    /// Executes the outstanding request on behalf of its target generation.
    ///
    /// # Errors
    ///
    /// `Migration` without a request or when the target is no longer
    /// current, `Forbidden` unless `caller` is the target generation,
    /// `TimelockNotElapsed`, hook failures unless `bypass_failure`.
    #[instrument(skip(self))]
    pub fn execute_migration(
        &self,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        let timelock = self.migration_timelock();
        let current = self.current_fund_deployer();
        self.run_migration(vault, false, |request, now| {
            if caller != request.next_fund_deployer {
                return Err(DeployerError::Forbidden(
                    "executeMigration: Only the target FundDeployer can call this function",
                ));
            }
            if request.next_fund_deployer != current {
                return Err(DeployerError::Migration(
                    "executeMigration: The target FundDeployer is no longer the current FundDeployer",
                ));
            }
            if !request.is_executable(timelock, now) {
                return Err(DeployerError::TimelockNotElapsed {
                    remaining: request.timelock_remaining(timelock, now),
                });
            }
            Ok(bypass_failure)
        })
    }

    /// Owner-only execution that skips the timelock and caller checks and
    /// bypasses hook failures.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Migration` without a request.
    #[instrument(skip(self))]
    pub fn execute_migration_emergency(
        &self,
        caller: Address,
        vault: Address,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        warn!(?vault, "Emergency migration");
        self.run_migration(vault, true, |_, _| Ok(true))
    }

    fn run_migration(
        &self,
        vault: Address,
        emergency: bool,
        authorize: impl FnOnce(&MigrationRequest, u64) -> Result<bool, DeployerError>,
    ) -> Result<(), DeployerError> {
        let cell = self.fund(vault)?;
        let request = self
            .comptroller
            .with_staged(&cell, |staged| -> Result<_, DeployerError> {
                let request = staged.state.migration.clone().ok_or(DeployerError::Migration(
                    "executeMigration: No migration request exists for _vaultProxy",
                ))?;
                let bypass_failure = authorize(&request, staged.now)?;
                self.swap_accessor(staged, &request, bypass_failure)?;
                Ok(request)
            })?;

        info!(?vault, next_comptroller = ?request.next_comptroller, emergency, "Migration executed");
        self.record(ProtocolEvent::MigrationExecuted {
            vault,
            prev_fund_deployer: request.prev_fund_deployer,
            next_fund_deployer: request.next_fund_deployer,
            next_comptroller: request.next_comptroller,
            emergency,
        });
        Ok(())
    }

    fn swap_accessor(
        &self,
        staged: &mut Staged<'_>,
        request: &MigrationRequest,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        self.comptroller
            .migrate_out(staged, request.prev_comptroller, bypass_failure)?;
        staged
            .state
            .vault
            .set_accessor(self.address, request.next_comptroller)?;
        self.comptroller.destruct(staged, request.prev_comptroller)?;
        self.comptroller
            .activate(staged, request.next_comptroller, true)?;
        staged.state.migration = None;
        Ok(())
    }

    /// Withdraws the outstanding request and destructs the incoming
    /// comptroller.
    ///
    /// # Errors
    ///
    /// `Migration` without a request, `Forbidden` unless `caller` is the
    /// target generation or may migrate the vault, hook failures unless
    /// `bypass_failure`.
    #[instrument(skip(self))]
    pub fn cancel_migration(
        &self,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        let cell = self.fund(vault)?;
        let request = self
            .comptroller
            .with_staged(&cell, |staged| -> Result<_, DeployerError> {
                let request = staged.state.migration.take().ok_or(DeployerError::Migration(
                    "cancelMigration: No migration request exists",
                ))?;
                if caller != request.next_fund_deployer && !staged.state.vault.can_migrate(caller) {
                    return Err(DeployerError::Forbidden(
                        "cancelMigration: Not an allowed caller",
                    ));
                }
                if let Err(err) = self.comptroller.destruct(staged, request.next_comptroller) {
                    if !bypass_failure {
                        return Err(err.into());
                    }
                    warn!(?vault, %err, "Cancel hook failed; bypassing");
                }
                Ok(request)
            })?;

        info!(?vault, "Migration cancelled");
        self.record(ProtocolEvent::MigrationCancelled {
            vault,
            next_fund_deployer: request.next_fund_deployer,
            next_comptroller: request.next_comptroller,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FundModules;
    use crate::test_support::*;
    use fl_01_vault::AssetCustody;
    use fl_04_comptroller::ComptrollerStatus;
    use shared_types::math::ether;

    #[test]
    fn test_two_step_ownership_transfer() {
        let fx = Fixture::new(0);
        let dispatcher = fx.engine.dispatcher();

        dispatcher.set_nominated_owner(OWNER, MANAGER).unwrap();
        assert_eq!(dispatcher.nominated_owner(), Some(MANAGER));
        assert!(matches!(
            dispatcher.claim_ownership(STRANGER),
            Err(DeployerError::Unauthorized(_))
        ));

        dispatcher.claim_ownership(MANAGER).unwrap();
        assert_eq!(dispatcher.owner(), MANAGER);
        assert_eq!(dispatcher.nominated_owner(), None);
        assert!(dispatcher.ensure_owner(OWNER).is_err());
    }

    #[test]
    fn test_current_fund_deployer_must_be_known_and_new() {
        let fx = Fixture::new(0);
        let dispatcher = fx.engine.dispatcher();

        assert_eq!(
            dispatcher.set_current_fund_deployer(OWNER, STRANGER),
            Err(DeployerError::UnknownFundDeployer(STRANGER))
        );
        assert!(matches!(
            dispatcher.set_current_fund_deployer(OWNER, fx.deployer.address()),
            Err(DeployerError::Unchanged(_))
        ));
        assert!(matches!(
            dispatcher.set_current_fund_deployer(OWNER, Address::ZERO),
            Err(DeployerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_settings_are_owner_only() {
        let fx = Fixture::new(0);
        let dispatcher = fx.engine.dispatcher();

        assert!(dispatcher.set_migration_timelock(STRANGER, 10).is_err());
        dispatcher.set_migration_timelock(OWNER, 10).unwrap();
        assert_eq!(dispatcher.migration_timelock(), 10);
        assert!(matches!(
            dispatcher.set_migration_timelock(OWNER, 10),
            Err(DeployerError::Unchanged(_))
        ));

        dispatcher.set_shares_token_symbol(OWNER, "NEW").unwrap();
        let (vault, _) = fx.create_fund(&FundModules::default());
        assert_eq!(fx.fund(vault).read(|state| state.vault.symbol().to_string()), "NEW");
    }

    #[test]
    fn test_only_current_generation_deploys_vaults() {
        let fx = Fixture::new(0);
        let (vault, comptroller) = fx.create_fund(&FundModules::default());

        let record = fx.fund(vault).read(|state| state.comptroller(comptroller).cloned()).unwrap();
        let result = fx
            .engine
            .dispatcher()
            .deploy_vault(STRANGER, MANAGER, "Rogue", record, Vec::new());
        assert_eq!(result, Err(DeployerError::Unauthorized("current FundDeployer")));
    }

    #[test]
    fn test_migration_waits_for_timelock() {
        let fx = Fixture::new(100);
        let (vault, prev) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        let next = fx.signal(&next_generation, vault);
        let dispatcher = fx.engine.dispatcher();

        assert!(dispatcher.has_migration_request(vault).unwrap());
        assert!(!dispatcher.has_executable_migration_request(vault).unwrap());
        assert_eq!(
            next_generation.execute_migration(MANAGER, vault, false),
            Err(DeployerError::TimelockNotElapsed { remaining: 100 })
        );

        fx.clock.advance(60);
        assert_eq!(
            dispatcher
                .get_timelock_remaining_for_migration_request(vault)
                .unwrap(),
            40
        );
        fx.clock.advance(40);
        assert!(dispatcher.has_executable_migration_request(vault).unwrap());
        next_generation.execute_migration(MANAGER, vault, false).unwrap();

        let fund = fx.fund(vault);
        let service = fx.engine.comptroller();
        assert_eq!(service.status(&fund, prev).unwrap(), ComptrollerStatus::Destructed);
        assert_eq!(service.status(&fund, next).unwrap(), ComptrollerStatus::Active);
        assert_eq!(fund.read(|state| state.vault.accessor()), next);
        assert_eq!(
            dispatcher.get_fund_deployer_for_vault(vault).unwrap(),
            next_generation.address()
        );
        assert!(!dispatcher.has_migration_request(vault).unwrap());
    }

    #[test]
    fn test_only_target_generation_executes() {
        let fx = Fixture::new(0);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        fx.signal(&next_generation, vault);

        assert!(matches!(
            fx.engine
                .dispatcher()
                .execute_migration(fx.deployer.address(), vault, false),
            Err(DeployerError::Forbidden(_))
        ));
    }

    #[test]
    fn test_target_must_still_be_current() {
        let fx = Fixture::new(0);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        fx.signal(&next_generation, vault);
        fx.engine
            .dispatcher()
            .set_current_fund_deployer(OWNER, fx.deployer.address())
            .unwrap();

        assert!(matches!(
            next_generation.execute_migration(MANAGER, vault, false),
            Err(DeployerError::Migration(_))
        ));
    }

    #[test]
    fn test_emergency_execution_skips_timelock() {
        let fx = Fixture::new(1_000);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        let next = fx.signal(&next_generation, vault);
        let dispatcher = fx.engine.dispatcher();

        assert!(dispatcher.execute_migration_emergency(STRANGER, vault).is_err());
        dispatcher.execute_migration_emergency(OWNER, vault).unwrap();
        assert_eq!(fx.fund(vault).read(|state| state.vault.accessor()), next);
    }

    #[test]
    fn test_cancel_checks_caller_and_destructs_incoming() {
        let fx = Fixture::new(100);
        let (vault, prev) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        let next = fx.signal(&next_generation, vault);
        let dispatcher = fx.engine.dispatcher();

        assert_eq!(
            dispatcher.cancel_migration(STRANGER, vault, false),
            Err(DeployerError::Forbidden("cancelMigration: Not an allowed caller"))
        );
        dispatcher.cancel_migration(MANAGER, vault, false).unwrap();

        let fund = fx.fund(vault);
        let service = fx.engine.comptroller();
        assert_eq!(service.status(&fund, next).unwrap(), ComptrollerStatus::Destructed);
        assert_eq!(service.status(&fund, prev).unwrap(), ComptrollerStatus::Active);
        assert!(!dispatcher.has_migration_request(vault).unwrap());
        assert!(matches!(
            dispatcher.cancel_migration(MANAGER, vault, false),
            Err(DeployerError::Migration(_))
        ));
    }

    #[test]
    fn test_migration_keeps_balances() {
        let fx = Fixture::new(0);
        let (vault, _) = fx.create_fund(&FundModules::default());
        fx.buy(vault, INVESTOR, ether(10));
        let fund = fx.fund(vault);
        let before = fund.snapshot();

        let next_generation = Fixture::launch_generation(&fx.engine);
        fx.signal(&next_generation, vault);
        next_generation.execute_migration(MANAGER, vault, false).unwrap();

        let after = fund.snapshot();
        assert_eq!(after.vault.total_supply(), before.vault.total_supply());
        assert_eq!(
            after.vault.balance_of(INVESTOR),
            before.vault.balance_of(INVESTOR)
        );
        assert_eq!(after.locked, before.locked);
        assert_eq!(after.referrals, before.referrals);
        assert_eq!(
            fx.custody.balance_of(DENOM, vault),
            ether(10),
            "assets stay with the vault"
        );
    }

    #[test]
    fn test_second_signal_is_rejected() {
        let fx = Fixture::new(100);
        let (vault, _) = fx.create_fund(&FundModules::default());
        let next_generation = Fixture::launch_generation(&fx.engine);
        fx.signal(&next_generation, vault);

        let another = next_generation
            .create_migrated_fund_config(MANAGER, DENOM, 0, &FundModules::default())
            .unwrap();
        assert_eq!(
            next_generation.signal_migration(MANAGER, vault, another),
            Err(DeployerError::Migration("signalMigration: Fund is already migrating"))
        );
        assert_eq!(
            next_generation.pending_comptroller_creator(another),
            Some(MANAGER),
            "a rejected signal keeps the configuration"
        );
    }
}
