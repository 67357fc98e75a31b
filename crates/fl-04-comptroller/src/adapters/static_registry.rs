//! Fixed [`DeployerRegistry`] for wiring a comptroller without a fund
//! deployer.

use crate::domain::ReleaseStatus;
use crate::ports::DeployerRegistry;
use parking_lot::RwLock;
use shared_types::{Address, Selector, U256};
use std::collections::{HashMap, HashSet};

/// In-memory release statuses and vault-call allow list.
#[derive(Default)]
pub struct StaticDeployerRegistry {
    statuses: RwLock<HashMap<Address, ReleaseStatus>>,
    vault_calls: RwLock<HashSet<(Address, Address, Selector)>>,
    ranges: RwLock<HashMap<Address, (Vec<U256>, Vec<U256>)>>,
}

impl StaticDeployerRegistry {
    /// Empty registry; every deployer reads as paused.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the release status of `fund_deployer`.
    pub fn set_release_status(&self, fund_deployer: Address, status: ReleaseStatus) {
        self.statuses.write().insert(fund_deployer, status);
    }

    /// Allows vaults of `fund_deployer` to call `(target, selector)`.
    pub fn allow_vault_call(&self, fund_deployer: Address, target: Address, selector: Selector) {
        self.vault_calls
            .write()
            .insert((fund_deployer, target, selector));
    }

    /// Bounds parameters of `module`.
    pub fn set_parameter_ranges(&self, module: Address, min: Vec<U256>, max: Vec<U256>) {
        self.ranges.write().insert(module, (min, max));
    }
}

impl DeployerRegistry for StaticDeployerRegistry {
    fn release_status(&self, fund_deployer: Address) -> ReleaseStatus {
        self.statuses
            .read()
            .get(&fund_deployer)
            .copied()
            .unwrap_or(ReleaseStatus::Paused)
    }

    fn is_registered_vault_call(
        &self,
        fund_deployer: Address,
        target: Address,
        selector: Selector,
    ) -> bool {
        self.vault_calls
            .read()
            .contains(&(fund_deployer, target, selector))
    }

    fn parameter_ranges(&self, module: Address) -> Option<(Vec<U256>, Vec<U256>)> {
        self.ranges.read().get(&module).cloned()
    }
}
