//! # Engine Wiring
//!
//! Builds the comptroller service, the dispatcher and the protocol
//! controller over one set of ports, all sharing the protocol configuration,
//! the fee environment and the release directory.
//!
//! ```text
//!   ProtocolConfig ──────┐                    FeeEnvironment
//!        │               ↓                          │
//!        │        ReleaseDirectory ──→ ComptrollerService ←─┘
//!        │               ↑                    ↑
//!        ↓               │                    │
//!  ProtocolController ──→ FundDeployer(s) ──→ Dispatcher ──→ FundCell per vault
//! ```

use crate::config::EngineConfig;
use crate::directory::ReleaseDirectory;
use crate::dispatcher::Dispatcher;
use crate::domain::ProtocolConfig;
use crate::errors::DeployerError;
use crate::events::ProtocolLog;
use crate::fund_deployer::FundDeployer;
use crate::protocol_controller::ProtocolController;
use fl_01_vault::{AssetCustody, SwapRouter};
use fl_02_fee_engine::{FeeEnvironment, FeeManager, StakingOracle, TieredSplit};
use fl_03_policy_engine::PolicyManager;
use fl_04_comptroller::{
    ComptrollerDependencies, ComptrollerService, ContractCaller, ExtensionAddresses,
    IntegrationManager, ValueInterpreter,
};
use parking_lot::RwLock;
use shared_types::{Address, Clock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// External collaborators the engine runs against.
pub struct EnginePorts {
    /// Token balances and transfers.
    pub custody: Arc<dyn AssetCustody>,
    /// Swaps for swap-redemptions and inline fee conversions.
    pub router: Arc<dyn SwapRouter>,
    /// Asset valuation.
    pub interpreter: Arc<dyn ValueInterpreter>,
    /// Staked balances for the performance fee split.
    pub staking: Arc<dyn StakingOracle>,
    /// Registered vault calls.
    pub contracts: Arc<dyn ContractCaller>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// A fully wired engine.
pub struct FundEngine {
    config: EngineConfig,
    comptroller: Arc<ComptrollerService>,
    dispatcher: Arc<Dispatcher>,
    controller: Arc<ProtocolController>,
    directory: Arc<ReleaseDirectory>,
    log: Arc<ProtocolLog>,
    generations: AtomicU64,
}

impl FundEngine {
    /// Wires the engine. No fees, policies, adapters or deployer
    /// generations are registered yet.
    ///
    /// # Errors
    ///
    /// `Fee` when the configured management split does not add up.
    pub fn new(config: EngineConfig, ports: EnginePorts) -> Result<Self, DeployerError> {
        let protocol = Arc::new(RwLock::new(ProtocolConfig::new()));
        let directory = Arc::new(ReleaseDirectory::new(protocol.clone()));
        let environment = Arc::new(RwLock::new(FeeEnvironment {
            management_split: fl_02_fee_engine::ManagementSplit::new(
                config.management_owner_split,
                config.management_staking_split,
            )?,
            performance_split: TieredSplit::default(),
            staking_pool: config.staking_pool,
            dao: config.dao,
            investment_token: config.investment_token,
        }));
        let log = Arc::new(ProtocolLog::new());

        let comptroller = Arc::new(ComptrollerService::new(ComptrollerDependencies {
            custody: ports.custody,
            router: ports.router,
            interpreter: ports.interpreter,
            staking: ports.staking,
            contracts: ports.contracts,
            deployers: directory.clone(),
            fee_manager: Arc::new(FeeManager::new()),
            policy_manager: Arc::new(PolicyManager::new()),
            integration_manager: Arc::new(IntegrationManager::default()),
            environment: environment.clone(),
            clock: ports.clock,
            extensions: ExtensionAddresses::default(),
        }));
        let dispatcher = Arc::new(Dispatcher::new(
            config.protocol_owner,
            config.migration_timelock,
            config.shares_token_symbol.clone(),
            comptroller.clone(),
            directory.clone(),
            log.clone(),
        ));
        let controller = Arc::new(ProtocolController::new(
            Address::derive("ProtocolController", config.protocol_owner, 0),
            config.protocol_owner,
            protocol,
            environment,
            dispatcher.clone(),
            comptroller.clone(),
            log.clone(),
        ));

        info!(owner = ?config.protocol_owner, dispatcher = ?dispatcher.address(), "Fund engine wired");
        Ok(Self {
            config,
            comptroller,
            dispatcher,
            controller,
            directory,
            log,
            generations: AtomicU64::new(0),
        })
    }

    /// Deploys a new deployer generation in `PreLaunch`. It still has to be
    /// made current on the dispatcher and set `Live`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` owns the dispatcher.
    pub fn deploy_fund_deployer(&self, caller: Address) -> Result<Arc<FundDeployer>, DeployerError> {
        self.dispatcher.ensure_owner(caller)?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let address = Address::derive("FundDeployer", self.dispatcher.address(), generation);
        let deployer = Arc::new(FundDeployer::new(
            address,
            self.controller.address(),
            self.dispatcher.clone(),
            self.comptroller.clone(),
            self.log.clone(),
        ));
        self.directory.register(address, deployer.release());
        self.controller.add_fund_deployer(deployer.clone());
        info!(fund_deployer = ?address, generation, "Fund deployer deployed");
        Ok(deployer)
    }

    /// Deployer generation at `address`.
    ///
    /// # Errors
    ///
    /// `UnknownFundDeployer`.
    pub fn fund_deployer(&self, address: Address) -> Result<Arc<FundDeployer>, DeployerError> {
        self.controller
            .fund_deployer(address)
            .ok_or(DeployerError::UnknownFundDeployer(address))
    }

    /// Start-up configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Comptroller service shared by every fund.
    #[must_use]
    pub fn comptroller(&self) -> &Arc<ComptrollerService> {
        &self.comptroller
    }

    /// Vault registry and migration coordinator.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Global configuration and fund factory.
    #[must_use]
    pub fn controller(&self) -> &Arc<ProtocolController> {
        &self.controller
    }

    /// Fee module registry.
    #[must_use]
    pub fn fee_manager(&self) -> &Arc<FeeManager> {
        self.comptroller.fee_manager()
    }

    /// Policy module registry.
    #[must_use]
    pub fn policy_manager(&self) -> &Arc<PolicyManager> {
        self.comptroller.policy_manager()
    }

    /// Trade adapter registry.
    #[must_use]
    pub fn integration_manager(&self) -> &Arc<IntegrationManager> {
        self.comptroller.integration_manager()
    }

    /// Protocol event log.
    #[must_use]
    pub fn log(&self) -> &Arc<ProtocolLog> {
        &self.log
    }
}
