//! Shared fixture for fee tests: one vault, in-memory custody, a router
//! quoting two investment tokens per denomination unit, and a GAV source
//! valuing every tracked asset one-to-one.

use crate::adapters::InMemoryStakingOracle;
use crate::domain::{FeeContext, FeeEnvironment, LockedBalances, ReferralBook};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use crate::ports::GavSource;
use crate::{ManagementSplit, TieredSplit};
use fl_01_vault::{AssetCustody, CustodyTx, FixedRateRouter, InMemoryCustody, SwapRouter, VaultState};
use shared_types::{math, Address, ManualClock, U256};
use std::sync::Arc;

pub const VAULT: Address = Address::new([0x0A; 20]);
pub const DISPATCHER: Address = Address::new([0xD1; 20]);
pub const OWNER: Address = Address::new([0x01; 20]);
pub const COMPTROLLER: Address = Address::new([0xC0; 20]);
pub const DENOM: Address = Address::new([0xE0; 20]);
pub const INVESTOR: Address = Address::new([0x11; 20]);
const SINK: Address = Address::new([0x5E; 20]);

/// Values every tracked asset one-to-one.
pub struct UnitGav;

impl GavSource for UnitGav {
    fn calc_gav(&self, vault: &VaultState, custody: &CustodyTx<'_>) -> Result<U256, FeeError> {
        vault
            .tracked_balances(custody)
            .into_iter()
            .try_fold(U256::zero(), |acc, (_, balance)| Ok(math::add(acc, balance)?))
    }
}

pub struct Fixture {
    pub vault: VaultState,
    pub custody: InMemoryCustody,
    pub router: FixedRateRouter,
    pub staking: InMemoryStakingOracle,
    pub locked: LockedBalances,
    pub referrals: ReferralBook,
    pub env: FeeEnvironment,
    pub now: u64,
    pub events: Vec<FeeEvent>,
}

impl Fixture {
    pub fn new() -> Self {
        let now = 1_700_000_000;
        let env = FeeEnvironment {
            management_split: ManagementSplit::default(),
            performance_split: TieredSplit::default(),
            staking_pool: Address::repeat_byte(0x5A),
            dao: Address::repeat_byte(0xDA),
            investment_token: Address::repeat_byte(0xF0),
        };
        let router = FixedRateRouter::new(
            Address::repeat_byte(0x88),
            Arc::new(ManualClock::new(now)),
        );
        router.set_rate(DENOM, env.investment_token, U256::from(2), U256::one());
        let custody = InMemoryCustody::new();
        custody.mint(env.investment_token, router.address(), math::ether(1_000_000));

        Self {
            vault: VaultState::new(VAULT, DISPATCHER, OWNER, COMPTROLLER, DENOM, "Fund", "FND"),
            custody,
            router,
            staking: InMemoryStakingOracle::new(),
            locked: LockedBalances::new(),
            referrals: ReferralBook::new(),
            env,
            now,
            events: Vec::new(),
        }
    }

    /// Puts `assets` of the denomination asset in custody and mints
    /// `shares` to the investor.
    pub fn seed_fund(&mut self, assets: U256, shares: U256) {
        self.custody.mint(DENOM, VAULT, assets);
        self.vault.mint_shares(COMPTROLLER, INVESTOR, shares).unwrap();
        let _ = self.vault.drain_effects();
    }

    pub fn add_denomination(&self, amount: U256) {
        self.custody.mint(DENOM, VAULT, amount);
    }

    pub fn remove_denomination(&self, amount: U256) {
        self.custody.transfer(DENOM, VAULT, SINK, amount).unwrap();
    }

    pub fn custody_balance(&self, holder: Address) -> U256 {
        self.custody.balance_of(DENOM, holder)
    }

    /// Runs `f` against a fresh context and commits custody on success.
    pub fn with_ctx<T>(
        &mut self,
        f: impl FnOnce(&mut FeeContext<'_, '_>) -> Result<T, FeeError>,
    ) -> Result<T, FeeError> {
        let mut tx = CustodyTx::new(&self.custody);
        let result = {
            let mut ctx = FeeContext {
                comptroller: COMPTROLLER,
                vault: &mut self.vault,
                custody: &mut tx,
                router: &self.router,
                staking: &self.staking,
                gav: &UnitGav,
                locked: &mut self.locked,
                referrals: &self.referrals,
                env: &self.env,
                now: self.now,
                events: &mut self.events,
            };
            f(&mut ctx)
        };
        if result.is_ok() {
            let _ = tx.commit();
        }
        result
    }
}
