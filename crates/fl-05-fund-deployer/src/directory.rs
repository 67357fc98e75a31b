//! # Release Directory
//!
//! The [`DeployerRegistry`] every comptroller consults: release status and
//! vault-call allow list per deployer generation, parameter ranges from the
//! protocol configuration.

use crate::domain::{ProtocolConfig, ReleaseState};
use fl_04_comptroller::{DeployerRegistry, ReleaseStatus};
use parking_lot::RwLock;
use shared_types::{Address, Selector, U256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Deployer generations known to the protocol.
pub struct ReleaseDirectory {
    releases: RwLock<BTreeMap<Address, Arc<ReleaseState>>>,
    protocol: Arc<RwLock<ProtocolConfig>>,
}

impl ReleaseDirectory {
    /// Empty directory reading ranges from `protocol`.
    #[must_use]
    pub fn new(protocol: Arc<RwLock<ProtocolConfig>>) -> Self {
        Self {
            releases: RwLock::new(BTreeMap::new()),
            protocol,
        }
    }

    /// Adds a generation. Returns false if `fund_deployer` was already known.
    pub fn register(&self, fund_deployer: Address, release: Arc<ReleaseState>) -> bool {
        let mut releases = self.releases.write();
        if releases.contains_key(&fund_deployer) {
            return false;
        }
        releases.insert(fund_deployer, release);
        true
    }

    /// Whether `fund_deployer` is a known generation.
    #[must_use]
    pub fn contains(&self, fund_deployer: Address) -> bool {
        self.releases.read().contains_key(&fund_deployer)
    }

    fn release(&self, fund_deployer: Address) -> Option<Arc<ReleaseState>> {
        self.releases.read().get(&fund_deployer).cloned()
    }
}

impl DeployerRegistry for ReleaseDirectory {
    fn release_status(&self, fund_deployer: Address) -> ReleaseStatus {
        self.release(fund_deployer)
            .map_or(ReleaseStatus::Paused, |release| release.status())
    }

    fn is_registered_vault_call(
        &self,
        fund_deployer: Address,
        target: Address,
        selector: Selector,
    ) -> bool {
        self.release(fund_deployer)
            .is_some_and(|release| release.is_registered(target, selector))
    }

    fn parameter_ranges(&self, module: Address) -> Option<(Vec<U256>, Vec<U256>)> {
        self.protocol
            .read()
            .parameter_range(module)
            .map(|range| (range.min.clone(), range.max.clone()))
    }
}
