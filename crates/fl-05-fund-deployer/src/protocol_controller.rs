//! # Protocol Controller
//!
//! Owner-settable global configuration and the public entry point for new
//! funds.
//!
//! | Setting | Consumed by |
//! |---------|-------------|
//! | approved denomination assets | [`ProtocolController::create_new_fund`] |
//! | fee and policy parameter ranges | fund creation, policy updates ([`ReleaseDirectory`](crate::ReleaseDirectory)) |
//! | management and performance splits | fee settlement (shared [`FeeEnvironment`]) |
//! | staking pool, DAO, investment token | fee settlement (shared [`FeeEnvironment`]) |

use crate::dispatcher::Dispatcher;
use crate::domain::{FundModules, ParameterRange, ProtocolConfig};
use crate::errors::DeployerError;
use crate::events::{ProtocolEvent, ProtocolLog};
use crate::fund_deployer::FundDeployer;
use fl_02_fee_engine::{FeeEnvironment, ManagementSplit, TieredSplit};
use fl_04_comptroller::{ComptrollerService, ReleaseStatus};
use parking_lot::RwLock;
use shared_types::{Address, U256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Global configuration owner and fund factory.
pub struct ProtocolController {
    address: Address,
    owner: RwLock<Address>,
    config: Arc<RwLock<ProtocolConfig>>,
    environment: Arc<RwLock<FeeEnvironment>>,
    deployers: RwLock<BTreeMap<Address, Arc<FundDeployer>>>,
    dispatcher: Arc<Dispatcher>,
    comptroller: Arc<ComptrollerService>,
    log: Arc<ProtocolLog>,
}

impl ProtocolController {
    /// Controller at `address` owned by `owner`, writing into the shared
    /// `config` and `environment`.
    #[must_use]
    pub fn new(
        address: Address,
        owner: Address,
        config: Arc<RwLock<ProtocolConfig>>,
        environment: Arc<RwLock<FeeEnvironment>>,
        dispatcher: Arc<Dispatcher>,
        comptroller: Arc<ComptrollerService>,
        log: Arc<ProtocolLog>,
    ) -> Self {
        Self {
            address,
            owner: RwLock::new(owner),
            config,
            environment,
            deployers: RwLock::new(BTreeMap::new()),
            dispatcher,
            comptroller,
            log,
        }
    }

    /// Controller id; the only caller fund deployers accept new funds from.
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
        *self.owner.read()
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), DeployerError> {
        if caller == self.owner() {
            Ok(())
        } else {
            Err(DeployerError::Forbidden("Ownable: caller is not the owner"))
        }
    }

    /// Hands the controller to `next`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `caller` is the owner, `InvalidArgument` for zero.
    pub fn transfer_ownership(&self, caller: Address, next: Address) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        if next.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "Ownable: new owner is the zero address",
            ));
        }
        let prev_owner = std::mem::replace(&mut *self.owner.write(), next);
        self.record(ProtocolEvent::ControllerOwnershipTransferred {
            prev_owner,
            next_owner: next,
        });
        Ok(())
    }

    // =========================================================================
    // DENOMINATION ASSETS
    // =========================================================================

    /// Whether new funds may use `asset` as denomination.
    #[must_use]
    pub fn is_denomination_asset_approved(&self, asset: Address) -> bool {
        self.config.read().is_denomination_approved(asset)
    }

    /// Approved denomination assets.
    #[must_use]
    pub fn denomination_assets(&self) -> Vec<Address> {
        self.config.read().denominations().collect()
    }

    /// Approves `assets`.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for zero or already approved assets.
    pub fn add_denomination_assets(
        &self,
        caller: Address,
        assets: &[Address],
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        self.config.write().add_denominations(assets)?;
        for asset in assets {
            self.record(ProtocolEvent::DenominationAssetAdded { asset: *asset });
        }
        Ok(())
    }

    /// Withdraws approval of `assets`. Existing funds are unaffected.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for assets that are not approved.
    pub fn remove_denomination_assets(
        &self,
        caller: Address,
        assets: &[Address],
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        self.config.write().remove_denominations(assets)?;
        for asset in assets {
            self.record(ProtocolEvent::DenominationAssetRemoved { asset: *asset });
        }
        Ok(())
    }

    // =========================================================================
    // PARAMETER RANGES
    // =========================================================================

    /// Parameter bounds of a fee or policy.
    #[must_use]
    pub fn fee_configuration(&self, module: Address) -> Option<ParameterRange> {
        self.config.read().parameter_range(module).cloned()
    }

    /// Bounds the parameters of `module`. Fees need a configuration before
    /// funds can use them.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for mismatched or inverted bounds.
    pub fn set_fee_configuration(
        &self,
        caller: Address,
        module: Address,
        min: Vec<U256>,
        max: Vec<U256>,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        self.config
            .write()
            .set_parameter_range(module, min.clone(), max.clone())?;
        self.record(ProtocolEvent::ParameterRangeSet { module, min, max });
        Ok(())
    }

    /// Removes the bounds of `module`.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` when none are set.
    pub fn remove_fee_configuration(
        &self,
        caller: Address,
        module: Address,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        self.config.write().remove_parameter_range(module)?;
        self.record(ProtocolEvent::ParameterRangeRemoved { module });
        Ok(())
    }

    // =========================================================================
    // FEE ENVIRONMENT
    // =========================================================================

    /// Snapshot of the settings fee settlement reads.
    #[must_use]
    pub fn fee_environment(&self) -> FeeEnvironment {
        self.environment.read().clone()
    }

    /// Sets the management fee split; `vault_owner + 2 × staking_and_dao`
    /// must equal one.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `Fee` when the portions do not add up.
    pub fn update_management_fee_split(
        &self,
        caller: Address,
        vault_owner: U256,
        staking_and_dao: U256,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        let split = ManagementSplit::new(vault_owner, staking_and_dao)?;
        self.environment.write().management_split = split;
        self.record(ProtocolEvent::ManagementFeeSplitUpdated {
            vault_owner,
            staking_and_dao,
        });
        Ok(())
    }

    /// Sets the tiered performance fee owner split.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `Fee` for rates above one or a zero tier size.
    pub fn update_performance_fee_split(
        &self,
        caller: Address,
        base: U256,
        increase_per_tier: U256,
        tier_size: U256,
        max: U256,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        let split = TieredSplit::new(base, increase_per_tier, tier_size, max)?;
        self.environment.write().performance_split = split;
        self.record(ProtocolEvent::PerformanceFeeSplitUpdated { base, max });
        Ok(())
    }

    /// Sets the staking pool fee recipient.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for zero.
    pub fn update_staking_pool(&self, caller: Address, pool: Address) -> Result<(), DeployerError> {
        self.update_environment_address(caller, "staking_pool", pool, |env| &mut env.staking_pool)
    }

    /// Sets the DAO fee recipient.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for zero.
    pub fn update_dao(&self, caller: Address, dao: Address) -> Result<(), DeployerError> {
        self.update_environment_address(caller, "dao", dao, |env| &mut env.dao)
    }

    /// Sets the token the investment fee is charged in.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `InvalidArgument` for zero.
    pub fn update_investment_token(
        &self,
        caller: Address,
        token: Address,
    ) -> Result<(), DeployerError> {
        self.update_environment_address(caller, "investment_token", token, |env| {
            &mut env.investment_token
        })
    }

    fn update_environment_address(
        &self,
        caller: Address,
        field: &str,
        address: Address,
        slot: impl FnOnce(&mut FeeEnvironment) -> &mut Address,
    ) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        if address.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "Address should not be zero address",
            ));
        }
        *slot(&mut *self.environment.write()) = address;
        self.record(ProtocolEvent::FeeEnvironmentAddressUpdated {
            field: field.to_string(),
            address,
        });
        Ok(())
    }

    // =========================================================================
    // FUND CREATION
    // =========================================================================

    pub(crate) fn add_fund_deployer(&self, deployer: Arc<FundDeployer>) {
        self.deployers.write().insert(deployer.address(), deployer);
    }

    /// Deployer generation at `address`.
    #[must_use]
    pub fn fund_deployer(&self, address: Address) -> Option<Arc<FundDeployer>> {
        self.deployers.read().get(&address).cloned()
    }

    /// Creates a fund through the current fund deployer. Returns
    /// `(vault, comptroller)`.
    ///
    /// # Errors
    ///
    /// `FundDeployerNotSet`, `InvalidArgument` for a zero owner or
    /// denomination, `ReleaseNotLive`, `DenominationNotApproved`,
    /// `UnknownFee` for fees without a parameter configuration,
    /// `ParameterOutOfRange`, module configuration failures.
    pub fn create_new_fund(
        &self,
        owner: Address,
        fund_name: &str,
        denomination_asset: Address,
        shares_action_timelock: u64,
        modules: &FundModules,
    ) -> Result<(Address, Address), DeployerError> {
        let current = self.dispatcher.current_fund_deployer();
        let deployer = self
            .fund_deployer(current)
            .ok_or(DeployerError::FundDeployerNotSet)?;
        if owner.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "__createNewFund: _owner cannot be empty",
            ));
        }
        if denomination_asset.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "__deployComptrollerProxy: _denominationAsset cannot be empty",
            ));
        }
        if deployer.release_status() != ReleaseStatus::Live {
            return Err(DeployerError::ReleaseNotLive);
        }
        {
            let config = self.config.read();
            if !config.is_denomination_approved(denomination_asset) {
                return Err(DeployerError::DenominationNotApproved(denomination_asset));
            }
            if let Some(fee) = modules
                .fees
                .iter()
                .find(|fee| config.parameter_range(**fee).is_none())
            {
                return Err(DeployerError::UnknownFee(*fee));
            }
        }

        let created = deployer.create_new_fund(
            self.address,
            owner,
            fund_name,
            denomination_asset,
            shares_action_timelock,
            modules,
        )?;
        info!(vault = ?created.0, fund_deployer = ?current, "Fund created through controller");
        Ok(created)
    }
}
