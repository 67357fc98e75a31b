//! # Test Protocol
//!
//! A fully wired engine over in-memory ports, with the fee and policy
//! modules registered, a Live current generation and funded liquidity on
//! the router. Scenarios drive it either directly through the comptroller
//! or through [`FundService`].

use fl_01_vault::{FixedRateRouter, InMemoryCustody};
use fl_02_fee_engine::{
    InMemoryStakingOracle, InvestmentFee, InvestmentFeeSettings, ManagementFee,
    ManagementFeeSettings,
};
use fl_03_policy_engine::{
    InvestorWhitelist, MinMaxInvestment, SharesActionTimeFrame, TimeFrameSettings,
    WhitelistSettings,
};
use fl_04_comptroller::{
    ComptrollerError, FundCell, PriceTableInterpreter, RecordingContractCaller, ReleaseStatus,
};
use fl_05_fund_deployer::{
    EngineConfig, EnginePorts, FundDeployer, FundEngine, FundModules, FundService,
};
use shared_types::math::{ether, from_dec, RATE_DIVISOR};
use shared_types::{Address, ManualClock, U256};
use std::sync::Arc;

// =============================================================================
// ACTORS AND MODULE IDS
// =============================================================================

/// Protocol owner.
pub const OWNER: Address = Address::new([0x01; 20]);
/// Fund owner.
pub const MANAGER: Address = Address::new([0x02; 20]);
/// First investor.
pub const ALICE: Address = Address::new([0x11; 20]);
/// Second investor.
pub const BOB: Address = Address::new([0x12; 20]);
/// Unrelated account.
pub const STRANGER: Address = Address::new([0x13; 20]);
/// Denomination asset.
pub const DENOM: Address = Address::new([0xE0; 20]);
/// Investment fee token.
pub const INV: Address = Address::new([0xE2; 20]);
/// Router liquidity account.
pub const ROUTER: Address = Address::new([0x4E; 20]);
/// Management fee module.
pub const MANAGEMENT: Address = Address::new([0xF1; 20]);
/// Investment fee module.
pub const INVESTMENT: Address = Address::new([0xF4; 20]);
/// Whitelist policy module.
pub const WHITELIST: Address = Address::new([0x9A; 20]);
/// Min/max investment policy module.
pub const MIN_MAX: Address = Address::new([0x9B; 20]);
/// Shares action time-frame policy module.
pub const TIME_FRAME: Address = Address::new([0x9C; 20]);

/// Start time of every protocol clock.
pub const GENESIS: u64 = 1_600_000_000;

/// Management fee settings for 1% a year.
pub fn one_percent_management() -> Vec<u8> {
    serde_json::to_vec(&ManagementFeeSettings {
        scaled_per_second_rate: from_dec("1000000000318694059332284760")
            .expect("valid decimal"),
    })
    .expect("serializable settings")
}

/// Investment fee settings for 1% of each purchase.
pub fn one_percent_investment() -> Vec<u8> {
    serde_json::to_vec(&InvestmentFeeSettings {
        rate: RATE_DIVISOR / 100,
    })
    .expect("serializable settings")
}

/// Whitelist settings adding and removing members.
pub fn whitelist(add: &[Address], remove: &[Address]) -> Vec<u8> {
    serde_json::to_vec(&WhitelistSettings {
        add: add.to_vec(),
        remove: remove.to_vec(),
    })
    .expect("serializable settings")
}

/// Time-frame settings with the given windows in seconds.
pub fn time_frame(shares_action_period: u64, shorting_period: u64, block_buys: bool) -> Vec<u8> {
    serde_json::to_vec(&TimeFrameSettings {
        shares_action_period,
        shorting_period,
        block_buys,
    })
    .expect("serializable settings")
}

// =============================================================================
// PROTOCOL
// =============================================================================

/// Engine plus handles on its in-memory ports.
pub struct TestProtocol {
    /// The wired engine.
    pub engine: Arc<FundEngine>,
    /// Async facade over `engine`.
    pub service: FundService,
    /// Current deployer generation.
    pub deployer: Arc<FundDeployer>,
    /// Token balances.
    pub custody: Arc<InMemoryCustody>,
    /// Swap rates.
    pub router: Arc<FixedRateRouter>,
    /// Asset prices.
    pub interpreter: Arc<PriceTableInterpreter>,
    /// Protocol time.
    pub clock: Arc<ManualClock>,
}

impl TestProtocol {
    /// Protocol with no migration timelock.
    pub fn new() -> Self {
        Self::with_timelock(0)
    }

    /// Protocol whose dispatcher enforces `migration_timelock` seconds.
    pub fn with_timelock(migration_timelock: u64) -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let custody = Arc::new(InMemoryCustody::new());
        custody.mint(INV, ROUTER, ether(1_000_000));
        custody.mint(DENOM, ROUTER, ether(1_000_000));

        let router = Arc::new(FixedRateRouter::new(ROUTER, clock.clone()));
        router.set_rate(DENOM, INV, U256::one(), U256::one());
        router.set_rate(INV, DENOM, U256::one(), U256::one());

        let interpreter = Arc::new(PriceTableInterpreter::new(clock.clone(), u64::MAX));
        interpreter.set_price(DENOM, ether(1), 18);
        interpreter.set_price(INV, ether(1), 18);

        let config = EngineConfig {
            protocol_owner: OWNER,
            migration_timelock,
            investment_token: INV,
            ..EngineConfig::default()
        };
        let engine = Arc::new(
            FundEngine::new(
                config,
                EnginePorts {
                    custody: custody.clone(),
                    router: router.clone(),
                    interpreter: interpreter.clone(),
                    staking: Arc::new(InMemoryStakingOracle::new()),
                    contracts: Arc::new(RecordingContractCaller::new()),
                    clock: clock.clone(),
                },
            )
            .expect("engine wiring"),
        );

        engine
            .fee_manager()
            .register_fees(vec![
                Arc::new(ManagementFee::new(MANAGEMENT)),
                Arc::new(InvestmentFee::new(INVESTMENT)),
            ])
            .expect("fee registration");
        engine
            .policy_manager()
            .register_policies(vec![
                Arc::new(InvestorWhitelist::new(WHITELIST)),
                Arc::new(MinMaxInvestment::new(MIN_MAX)),
                Arc::new(SharesActionTimeFrame::new(TIME_FRAME)),
            ])
            .expect("policy registration");

        let controller = engine.controller();
        controller
            .add_denomination_assets(OWNER, &[DENOM])
            .expect("approve denomination");
        controller
            .set_fee_configuration(
                OWNER,
                MANAGEMENT,
                vec![U256::zero()],
                vec![from_dec("1000000001000000000000000000").expect("valid decimal")],
            )
            .expect("management range");
        controller
            .set_fee_configuration(OWNER, INVESTMENT, vec![U256::zero()], vec![RATE_DIVISOR])
            .expect("investment range");

        let deployer = Self::launch_generation(&engine);
        let service = FundService::new(engine.clone());
        Self {
            engine,
            service,
            deployer,
            custody,
            router,
            interpreter,
            clock,
        }
    }

    /// Deploys a generation, makes it current and sets it Live.
    pub fn launch_generation(engine: &FundEngine) -> Arc<FundDeployer> {
        let deployer = engine
            .deploy_fund_deployer(OWNER)
            .expect("deploy generation");
        engine
            .dispatcher()
            .set_current_fund_deployer(OWNER, deployer.address())
            .expect("set current generation");
        deployer
            .set_release_status(OWNER, ReleaseStatus::Live)
            .expect("go live");
        deployer
    }

    /// Fund owned by [`MANAGER`] in [`DENOM`]. Returns `(vault, comptroller)`.
    pub fn create_fund(&self, modules: &FundModules) -> (Address, Address) {
        self.engine
            .controller()
            .create_new_fund(MANAGER, "Fund", DENOM, 0, modules)
            .expect("create fund")
    }

    /// Fund cell of `vault`.
    pub fn fund(&self, vault: Address) -> Arc<FundCell> {
        self.engine.dispatcher().fund(vault).expect("known vault")
    }

    /// Mints `amount` of the denomination asset to `buyer` and buys with it.
    pub fn buy(&self, vault: Address, buyer: Address, amount: U256) -> Result<U256, ComptrollerError> {
        self.custody.mint(DENOM, buyer, amount);
        self.engine
            .comptroller()
            .buy_shares(&self.fund(vault), buyer, amount, U256::zero(), None)
    }

    /// Redeems `quantity` shares in kind; zero redeems everything.
    pub fn redeem(
        &self,
        vault: Address,
        redeemer: Address,
        quantity: U256,
    ) -> Result<Vec<(Address, U256)>, ComptrollerError> {
        self.engine
            .comptroller()
            .redeem_shares_detailed(&self.fund(vault), redeemer, quantity, &[], &[])
    }
}

impl Default for TestProtocol {
    fn default() -> Self {
        Self::new()
    }
}
