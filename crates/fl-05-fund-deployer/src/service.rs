//! # Fund Service
//!
//! Async facade over a [`FundEngine`]. Every call runs on the blocking pool
//! inside its own span carrying a request id, is timed, and feeds the
//! Prometheus counters of `fund-telemetry`.

use crate::domain::FundModules;
use crate::engine::FundEngine;
use crate::errors::DeployerError;
use async_trait::async_trait;
use fl_02_fee_engine::{FeeEvent, FeeHook};
use fl_04_comptroller::{FundEvent, RecordedEvent};
use fund_telemetry::{
    metric_inc, CallTimer, CALL_ERRORS, FEE_SETTLEMENTS, FUNDS_CREATED, MIGRATIONS,
    POLICY_VIOLATIONS, SHARES_BOUGHT, SHARES_REDEEMED,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{Address, ErrorKind, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

/// Parameters of a new fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFund {
    /// Vault owner.
    pub owner: Address,
    /// Display name.
    pub name: String,
    /// Asset shares are bought with and priced in.
    pub denomination_asset: Address,
    /// Seconds a holder must wait after buying before redeeming.
    pub shares_action_timelock: u64,
    /// Fees and policies with their settings.
    pub modules: FundModules,
}

/// Async entry points for fund operations.
#[async_trait]
pub trait FundApi: Send + Sync {
    /// Creates a fund through the current deployer. Returns
    /// `(vault, comptroller)`.
    async fn create_new_fund(&self, request: NewFund) -> Result<(Address, Address), DeployerError>;

    /// Buys shares of `vault`; returns the shares received.
    async fn buy_shares(
        &self,
        vault: Address,
        buyer: Address,
        investment_amount: U256,
        min_shares_quantity: U256,
        referrer: Option<Address>,
    ) -> Result<U256, DeployerError>;

    /// Redeems shares in kind. Zero redeems the full balance.
    async fn redeem_shares(
        &self,
        vault: Address,
        redeemer: Address,
        shares_quantity: U256,
    ) -> Result<Vec<(Address, U256)>, DeployerError>;

    /// Redeems shares and swaps each payout along its path.
    async fn redeem_shares_and_swap(
        &self,
        vault: Address,
        redeemer: Address,
        shares_quantity: U256,
        swap_paths: Vec<Vec<Address>>,
        min_amounts_out: Vec<U256>,
        deadline: u64,
    ) -> Result<Vec<(Address, U256)>, DeployerError>;

    /// Dispatches an extension action on `vault`.
    async fn call_on_extension(
        &self,
        vault: Address,
        caller: Address,
        extension: Address,
        action_id: u32,
        args: Vec<u8>,
    ) -> Result<(), DeployerError>;

    /// Creates a comptroller configuration on `fund_deployer` for a later
    /// migration.
    async fn create_migrated_fund_config(
        &self,
        fund_deployer: Address,
        caller: Address,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: FundModules,
    ) -> Result<Address, DeployerError>;

    /// Signals a migration of `vault` to `comptroller`. Returns the time the
    /// request becomes executable.
    async fn signal_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        comptroller: Address,
    ) -> Result<u64, DeployerError>;

    /// Executes the pending migration of `vault`.
    async fn execute_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError>;

    /// Withdraws the pending migration of `vault`.
    async fn cancel_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError>;

    /// Gross asset value of `vault` in its denomination asset.
    async fn calc_gav(&self, vault: Address) -> Result<U256, DeployerError>;

    /// Value of one share of `vault`.
    async fn calc_gross_share_value(&self, vault: Address) -> Result<U256, DeployerError>;

    /// Event history of `vault`.
    async fn history(&self, vault: Address) -> Result<Vec<RecordedEvent>, DeployerError>;
}

/// [`FundApi`] over a shared engine.
#[derive(Clone)]
pub struct FundService {
    engine: Arc<FundEngine>,
    // Per vault: history entries already counted into FEE_SETTLEMENTS.
    settlement_cursors: Arc<Mutex<HashMap<Address, usize>>>,
}

impl FundService {
    /// Service over `engine`.
    #[must_use]
    pub fn new(engine: Arc<FundEngine>) -> Self {
        Self {
            engine,
            settlement_cursors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<FundEngine> {
        &self.engine
    }

    async fn run<R, F>(&self, operation: &'static str, f: F) -> Result<R, DeployerError>
    where
        R: Send + 'static,
        F: FnOnce(&FundEngine) -> Result<R, DeployerError> + Send + 'static,
    {
        let engine = self.engine.clone();
        let request_id = Uuid::new_v4();
        let span = info_span!("fund_call", operation, %request_id);
        let result = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let _timer = CallTimer::new(operation);
            f(&engine)
        })
        .await
        .map_err(|e| DeployerError::TaskFailed(e.to_string()))?;

        match &result {
            Ok(_) => debug!(operation, %request_id, "Fund call succeeded"),
            Err(err) => {
                let kind = err.kind();
                metric_inc!(CALL_ERRORS, &[operation, &kind.to_string()]);
                if kind == ErrorKind::PolicyViolation {
                    metric_inc!(POLICY_VIOLATIONS);
                }
                warn!(operation, %request_id, error = %err, "Fund call failed");
            }
        }
        result
    }

    /// Counts fee settlements recorded on `vault` since the last call.
    fn count_settlements(&self, vault: Address) {
        let Ok(fund) = self.engine.dispatcher().fund(vault) else {
            return;
        };
        let mut cursors = self.settlement_cursors.lock();
        let seen = cursors.entry(vault).or_insert(0);
        let fresh = fund.history_since(*seen);
        for recorded in &fresh {
            if let FundEvent::Fee(FeeEvent::Settled { hook, .. }) = &recorded.event {
                metric_inc!(FEE_SETTLEMENTS, &[hook_label(*hook)]);
            }
        }
        *seen += fresh.len();
    }
}

fn hook_label(hook: FeeHook) -> &'static str {
    match hook {
        FeeHook::Continuous => "Continuous",
        FeeHook::PreBuyShares => "PreBuyShares",
        FeeHook::PostBuyShares => "PostBuyShares",
        FeeHook::PreRedeemShares => "PreRedeemShares",
    }
}

#[async_trait]
impl FundApi for FundService {
    async fn create_new_fund(&self, request: NewFund) -> Result<(Address, Address), DeployerError> {
        let created = self
            .run("create_new_fund", move |engine| {
                engine.controller().create_new_fund(
                    request.owner,
                    &request.name,
                    request.denomination_asset,
                    request.shares_action_timelock,
                    &request.modules,
                )
            })
            .await?;
        metric_inc!(FUNDS_CREATED);
        Ok(created)
    }

    async fn buy_shares(
        &self,
        vault: Address,
        buyer: Address,
        investment_amount: U256,
        min_shares_quantity: U256,
        referrer: Option<Address>,
    ) -> Result<U256, DeployerError> {
        let result = self
            .run("buy_shares", move |engine| {
                let fund = engine.dispatcher().fund(vault)?;
                Ok(engine.comptroller().buy_shares(
                    &fund,
                    buyer,
                    investment_amount,
                    min_shares_quantity,
                    referrer,
                )?)
            })
            .await;
        if result.is_ok() {
            metric_inc!(SHARES_BOUGHT);
        }
        self.count_settlements(vault);
        result
    }

    async fn redeem_shares(
        &self,
        vault: Address,
        redeemer: Address,
        shares_quantity: U256,
    ) -> Result<Vec<(Address, U256)>, DeployerError> {
        let result = self
            .run("redeem_shares", move |engine| {
                let fund = engine.dispatcher().fund(vault)?;
                Ok(engine
                    .comptroller()
                    .redeem_shares_detailed(&fund, redeemer, shares_quantity, &[], &[])?)
            })
            .await;
        if result.is_ok() {
            metric_inc!(SHARES_REDEEMED, &["in_kind"]);
        }
        self.count_settlements(vault);
        result
    }

    async fn redeem_shares_and_swap(
        &self,
        vault: Address,
        redeemer: Address,
        shares_quantity: U256,
        swap_paths: Vec<Vec<Address>>,
        min_amounts_out: Vec<U256>,
        deadline: u64,
    ) -> Result<Vec<(Address, U256)>, DeployerError> {
        let result = self
            .run("redeem_shares_and_swap", move |engine| {
                let fund = engine.dispatcher().fund(vault)?;
                Ok(engine.comptroller().redeem_shares_and_swap(
                    &fund,
                    redeemer,
                    shares_quantity,
                    &swap_paths,
                    &min_amounts_out,
                    deadline,
                )?)
            })
            .await;
        if result.is_ok() {
            metric_inc!(SHARES_REDEEMED, &["swap"]);
        }
        self.count_settlements(vault);
        result
    }

    async fn call_on_extension(
        &self,
        vault: Address,
        caller: Address,
        extension: Address,
        action_id: u32,
        args: Vec<u8>,
    ) -> Result<(), DeployerError> {
        let result = self
            .run("call_on_extension", move |engine| {
                let fund = engine.dispatcher().fund(vault)?;
                Ok(engine
                    .comptroller()
                    .call_on_extension(&fund, caller, extension, action_id, &args)?)
            })
            .await;
        self.count_settlements(vault);
        result
    }

    async fn create_migrated_fund_config(
        &self,
        fund_deployer: Address,
        caller: Address,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: FundModules,
    ) -> Result<Address, DeployerError> {
        self.run("create_migrated_fund_config", move |engine| {
            engine.fund_deployer(fund_deployer)?.create_migrated_fund_config(
                caller,
                denomination_asset,
                shares_action_timelock,
                &modules,
            )
        })
        .await
    }

    async fn signal_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        comptroller: Address,
    ) -> Result<u64, DeployerError> {
        let executable_at = self
            .run("signal_migration", move |engine| {
                engine
                    .fund_deployer(fund_deployer)?
                    .signal_migration(caller, vault, comptroller)
            })
            .await?;
        metric_inc!(MIGRATIONS, &["signaled"]);
        Ok(executable_at)
    }

    async fn execute_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        let result = self
            .run("execute_migration", move |engine| {
                engine
                    .fund_deployer(fund_deployer)?
                    .execute_migration(caller, vault, bypass_failure)
            })
            .await;
        if result.is_ok() {
            metric_inc!(MIGRATIONS, &["executed"]);
        }
        self.count_settlements(vault);
        result
    }

    async fn cancel_migration(
        &self,
        fund_deployer: Address,
        caller: Address,
        vault: Address,
        bypass_failure: bool,
    ) -> Result<(), DeployerError> {
        self.run("cancel_migration", move |engine| {
            engine
                .fund_deployer(fund_deployer)?
                .cancel_migration(caller, vault, bypass_failure)
        })
        .await?;
        metric_inc!(MIGRATIONS, &["cancelled"]);
        Ok(())
    }

    async fn calc_gav(&self, vault: Address) -> Result<U256, DeployerError> {
        self.run("calc_gav", move |engine| {
            let fund = engine.dispatcher().fund(vault)?;
            Ok(engine.comptroller().calc_gav(&fund)?)
        })
        .await
    }

    async fn calc_gross_share_value(&self, vault: Address) -> Result<U256, DeployerError> {
        self.run("calc_gross_share_value", move |engine| {
            let fund = engine.dispatcher().fund(vault)?;
            Ok(engine.comptroller().calc_gross_share_value(&fund)?)
        })
        .await
    }

    async fn history(&self, vault: Address) -> Result<Vec<RecordedEvent>, DeployerError> {
        self.run("history", move |engine| {
            let fund = engine.dispatcher().fund(vault)?;
            Ok(engine.comptroller().history(&fund))
        })
        .await
    }
}
