//! Shared fixtures for the fund deployer's unit tests.

use crate::config::EngineConfig;
use crate::domain::FundModules;
use crate::engine::{EnginePorts, FundEngine};
use crate::fund_deployer::FundDeployer;
use fl_01_vault::{FixedRateRouter, InMemoryCustody};
use fl_02_fee_engine::{
    InMemoryStakingOracle, ManagementFee, ManagementFeeSettings, PerformanceFee,
};
use fl_03_policy_engine::{InvestorWhitelist, MinMaxInvestment};
use fl_04_comptroller::{
    FundCell, PriceTableInterpreter, RecordingContractCaller, ReleaseStatus,
};
use shared_types::math::{ether, from_dec};
use shared_types::{Address, ManualClock, U256};
use std::sync::Arc;

pub const OWNER: Address = Address::new([0x01; 20]);
pub const MANAGER: Address = Address::new([0x02; 20]);
pub const INVESTOR: Address = Address::new([0x11; 20]);
pub const STRANGER: Address = Address::new([0x13; 20]);
pub const DENOM: Address = Address::new([0xE0; 20]);
pub const WETH: Address = Address::new([0xE1; 20]);
pub const ROUTER: Address = Address::new([0x4E; 20]);
pub const MANAGEMENT: Address = Address::new([0xF1; 20]);
pub const PERFORMANCE: Address = Address::new([0xF2; 20]);
pub const WHITELIST: Address = Address::new([0x9A; 20]);
pub const MIN_MAX: Address = Address::new([0x9B; 20]);

pub fn one_percent_management() -> Vec<u8> {
    serde_json::to_vec(&ManagementFeeSettings {
        scaled_per_second_rate: from_dec("1000000000318694059332284760").unwrap(),
    })
    .unwrap()
}

pub struct Fixture {
    pub engine: Arc<FundEngine>,
    pub deployer: Arc<FundDeployer>,
    pub custody: Arc<InMemoryCustody>,
    pub interpreter: Arc<PriceTableInterpreter>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    /// Engine owned by OWNER with one Live, current generation, DENOM
    /// approved and the management fee bounded.
    pub fn new(migration_timelock: u64) -> Self {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let custody = Arc::new(InMemoryCustody::new());
        custody.mint(DENOM, ROUTER, ether(1_000));
        custody.mint(WETH, ROUTER, ether(1_000));

        let router = Arc::new(FixedRateRouter::new(ROUTER, clock.clone()));
        router.set_rate(DENOM, WETH, U256::from(2), U256::one());
        router.set_rate(WETH, DENOM, U256::one(), U256::from(2));

        let interpreter = Arc::new(PriceTableInterpreter::new(clock.clone(), u64::MAX));
        interpreter.set_price(DENOM, ether(1), 18);
        interpreter.set_price(WETH, ether(1), 18);

        let config = EngineConfig {
            protocol_owner: OWNER,
            migration_timelock,
            ..EngineConfig::default()
        };
        let engine = Arc::new(
            FundEngine::new(
                config,
                EnginePorts {
                    custody: custody.clone(),
                    router,
                    interpreter: interpreter.clone(),
                    staking: Arc::new(InMemoryStakingOracle::new()),
                    contracts: Arc::new(RecordingContractCaller::new()),
                    clock: clock.clone(),
                },
            )
            .unwrap(),
        );

        engine
            .fee_manager()
            .register_fees(vec![
                Arc::new(ManagementFee::new(MANAGEMENT)),
                Arc::new(PerformanceFee::new(PERFORMANCE)),
            ])
            .unwrap();
        engine
            .policy_manager()
            .register_policies(vec![
                Arc::new(InvestorWhitelist::new(WHITELIST)),
                Arc::new(MinMaxInvestment::new(MIN_MAX)),
            ])
            .unwrap();

        let controller = engine.controller();
        controller.add_denomination_assets(OWNER, &[DENOM]).unwrap();
        controller
            .set_fee_configuration(
                OWNER,
                MANAGEMENT,
                vec![U256::zero()],
                vec![from_dec("1000000001000000000000000000").unwrap()],
            )
            .unwrap();

        let deployer = Self::launch_generation(&engine);
        Self {
            engine,
            deployer,
            custody,
            interpreter,
            clock,
        }
    }

    /// Deploys a generation, makes it current and sets it Live.
    pub fn launch_generation(engine: &FundEngine) -> Arc<FundDeployer> {
        let deployer = engine.deploy_fund_deployer(OWNER).unwrap();
        engine
            .dispatcher()
            .set_current_fund_deployer(OWNER, deployer.address())
            .unwrap();
        deployer
            .set_release_status(OWNER, ReleaseStatus::Live)
            .unwrap();
        deployer
    }

    /// Fund owned by MANAGER with the given modules.
    pub fn create_fund(&self, modules: &FundModules) -> (Address, Address) {
        self.engine
            .controller()
            .create_new_fund(MANAGER, "Fund", DENOM, 0, modules)
            .unwrap()
    }

    pub fn fund(&self, vault: Address) -> Arc<FundCell> {
        self.engine.dispatcher().fund(vault).unwrap()
    }

    pub fn buy(&self, vault: Address, buyer: Address, amount: U256) -> U256 {
        self.custody.mint(DENOM, buyer, amount);
        self.engine
            .comptroller()
            .buy_shares(&self.fund(vault), buyer, amount, U256::zero(), None)
            .unwrap()
    }

    /// Configures a comptroller on `next` for MANAGER and signals the
    /// migration of `vault`.
    pub fn signal(&self, next: &FundDeployer, vault: Address) -> Address {
        let comptroller = next
            .create_migrated_fund_config(MANAGER, DENOM, 0, &FundModules::default())
            .unwrap();
        next.signal_migration(MANAGER, vault, comptroller).unwrap();
        comptroller
    }
}
