//! Release state of one fund deployer generation.

use fl_04_comptroller::ReleaseStatus;
use parking_lot::{RwLock, RwLockWriteGuard};
use shared_types::{Address, Selector};
use std::collections::BTreeSet;

/// Release status and vault-call allow list, shared between a
/// [`FundDeployer`](crate::FundDeployer) and the
/// [`ReleaseDirectory`](crate::ReleaseDirectory) its comptrollers consult.
#[derive(Debug)]
pub struct ReleaseState {
    status: RwLock<ReleaseStatus>,
    vault_calls: RwLock<BTreeSet<(Address, Selector)>>,
}

impl Default for ReleaseState {
    fn default() -> Self {
        Self {
            status: RwLock::new(ReleaseStatus::PreLaunch),
            vault_calls: RwLock::new(BTreeSet::new()),
        }
    }
}

impl ReleaseState {
    /// New generation in `PreLaunch`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ReleaseStatus {
        *self.status.read()
    }

    pub(crate) fn set_status(&self, status: ReleaseStatus) {
        *self.status.write() = status;
    }

    /// Whether vaults may call `target` with `selector`.
    #[must_use]
    pub fn is_registered(&self, target: Address, selector: Selector) -> bool {
        self.vault_calls.read().contains(&(target, selector))
    }

    pub(crate) fn vault_calls(&self) -> RwLockWriteGuard<'_, BTreeSet<(Address, Selector)>> {
        self.vault_calls.write()
    }
}
