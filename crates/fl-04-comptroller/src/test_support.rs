//! Shared fixtures for the comptroller's unit tests.

use crate::adapters::{
    PriceTableInterpreter, RecordingContractCaller, RouterAdapter, StaticDeployerRegistry,
};
use crate::domain::{ComptrollerRecord, FundCell, FundState, ReleaseStatus};
use crate::errors::ComptrollerError;
use crate::extensions::ExtensionAddresses;
use crate::integration::IntegrationManager;
use crate::service::{ComptrollerDependencies, ComptrollerService};
use fl_01_vault::{FixedRateRouter, InMemoryCustody, VaultState};
use fl_02_fee_engine::{
    FeeEnvironment, FeeManager, InMemoryStakingOracle, ManagementSplit, PerformanceFee,
    PerformanceFeeSettings, TieredSplit,
};
use fl_03_policy_engine::{FundPolicyConfig, InvestorWhitelist, MinMaxInvestment, PolicyManager};
use parking_lot::RwLock;
use shared_types::math::ether;
use shared_types::{Address, Clock, ManualClock, U256};
use std::sync::Arc;

pub const VAULT: Address = Address::new([0x0A; 20]);
pub const DISPATCHER: Address = Address::new([0xD1; 20]);
pub const OWNER: Address = Address::new([0x01; 20]);
pub const INVESTOR: Address = Address::new([0x11; 20]);
pub const TRADER: Address = Address::new([0x12; 20]);
pub const STRANGER: Address = Address::new([0x13; 20]);
pub const COMPTROLLER: Address = Address::new([0xC0; 20]);
pub const DEPLOYER: Address = Address::new([0xFD; 20]);
pub const DENOM: Address = Address::new([0xE0; 20]);
pub const WETH: Address = Address::new([0xE1; 20]);
pub const ROUTER: Address = Address::new([0x4E; 20]);
pub const ADAPTER: Address = Address::new([0xAD; 20]);
pub const WHITELIST: Address = Address::new([0x9A; 20]);
pub const MIN_MAX: Address = Address::new([0x9B; 20]);
pub const PERFORMANCE: Address = Address::new([0xF2; 20]);

pub struct Harness {
    pub service: Arc<ComptrollerService>,
    pub fund: Arc<FundCell>,
    pub custody: Arc<InMemoryCustody>,
    pub interpreter: Arc<PriceTableInterpreter>,
    pub registry: Arc<StaticDeployerRegistry>,
    pub contracts: Arc<RecordingContractCaller>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Active fund denominated in DENOM, no fees, a DENOM/WETH 1:2 router.
    pub fn new(timelock: u64) -> Self {
        Self::build(timelock, &[], &[])
    }

    /// As [`Harness::new`] with a 10% yearly performance fee.
    pub fn with_performance_fee(timelock: u64) -> Self {
        let settings = serde_json::to_vec(&PerformanceFeeSettings {
            rate: ether(1) / 10,
            period: 365 * 24 * 3_600,
        })
        .unwrap();
        Self::build(timelock, &[PERFORMANCE], &[settings])
    }

    fn build(timelock: u64, fees: &[Address], fee_settings: &[Vec<u8>]) -> Self {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let custody = Arc::new(InMemoryCustody::new());
        custody.mint(WETH, ROUTER, ether(1_000));
        custody.mint(DENOM, ROUTER, ether(1_000));

        let router = Arc::new(FixedRateRouter::new(ROUTER, clock.clone()));
        router.set_rate(DENOM, WETH, U256::from(2), U256::one());
        router.set_rate(WETH, DENOM, U256::one(), U256::from(2));

        let interpreter = Arc::new(PriceTableInterpreter::new(clock.clone(), u64::MAX));
        interpreter.set_price(DENOM, ether(1), 18);
        interpreter.set_price(WETH, ether(1), 18);

        let registry = Arc::new(StaticDeployerRegistry::default());
        registry.set_release_status(DEPLOYER, ReleaseStatus::Live);
        let contracts = Arc::new(RecordingContractCaller::new());

        let fee_manager = Arc::new(FeeManager::new());
        fee_manager
            .register_fees(vec![Arc::new(PerformanceFee::new(PERFORMANCE))])
            .unwrap();
        let policy_manager = Arc::new(PolicyManager::new());
        policy_manager
            .register_policies(vec![
                Arc::new(InvestorWhitelist::new(WHITELIST)),
                Arc::new(MinMaxInvestment::new(MIN_MAX)),
            ])
            .unwrap();
        let integration_manager = Arc::new(IntegrationManager::default());
        integration_manager
            .register_adapters(vec![Arc::new(RouterAdapter::new(ADAPTER, router.clone()))])
            .unwrap();

        let environment = FeeEnvironment {
            management_split: ManagementSplit::default(),
            performance_split: TieredSplit::default(),
            staking_pool: Address::repeat_byte(0x5A),
            dao: Address::repeat_byte(0xDA),
            investment_token: Address::repeat_byte(0x17),
        };

        let service = Arc::new(ComptrollerService::new(ComptrollerDependencies {
            custody: custody.clone(),
            router,
            interpreter: interpreter.clone(),
            staking: Arc::new(InMemoryStakingOracle::new()),
            contracts: contracts.clone(),
            deployers: registry.clone(),
            fee_manager: fee_manager.clone(),
            policy_manager,
            integration_manager,
            environment: Arc::new(RwLock::new(environment)),
            clock: clock.clone(),
            extensions: ExtensionAddresses::default(),
        }));

        let (fee_config, _) = fee_manager.set_config_for_fund(fees, fee_settings).unwrap();
        let vault = VaultState::new(VAULT, DISPATCHER, OWNER, COMPTROLLER, DENOM, "Fund", "FND");
        let record = ComptrollerRecord::new(
            COMPTROLLER,
            DEPLOYER,
            OWNER,
            DENOM,
            timelock,
            fee_config,
            FundPolicyConfig::new(),
            clock.now(),
        );
        let fund = Arc::new(FundCell::new(FundState::new(vault, record)));
        service
            .with_staged(&fund, |staged| service.activate(staged, COMPTROLLER, false))
            .unwrap();

        Self {
            service,
            fund,
            custody,
            interpreter,
            registry,
            contracts,
            clock,
        }
    }

    pub fn fund_investor(&self, amount: U256) {
        self.custody.mint(DENOM, INVESTOR, amount);
    }

    pub fn buy(&self, amount: U256) -> Result<U256, ComptrollerError> {
        self.service
            .buy_shares(&self.fund, INVESTOR, amount, U256::zero(), None)
    }

    /// Tracks assets already held by the vault, as the owner would.
    pub fn track(&self, assets: &[Address]) -> Result<(), ComptrollerError> {
        let args = crate::extensions::encode_args(&assets.to_vec())?;
        let integration = self.service.extensions().integration_manager;
        self.service
            .call_on_extension(&self.fund, OWNER, integration, 1, &args)
    }
}
