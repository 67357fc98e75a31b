//! Migration request data. The state machine lives with the dispatcher;
//! the request is stored on the fund so the comptroller can see it.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Outstanding request to move a vault to a newer deployer generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Vault to migrate.
    pub vault: Address,
    /// Current accessor.
    pub prev_comptroller: Address,
    /// Accessor after execution.
    pub next_comptroller: Address,
    /// Deployer generation of the current accessor.
    pub prev_fund_deployer: Address,
    /// Deployer generation of the next accessor.
    pub next_fund_deployer: Address,
    /// When the request was signalled.
    pub signaled_at: u64,
}

impl MigrationRequest {
    /// Whether `timelock` seconds have passed since signalling.
    #[must_use]
    pub fn is_executable(&self, timelock: u64, now: u64) -> bool {
        now >= self.signaled_at.saturating_add(timelock)
    }

    /// Seconds until executable.
    #[must_use]
    pub fn timelock_remaining(&self, timelock: u64, now: u64) -> u64 {
        self.signaled_at.saturating_add(timelock).saturating_sub(now)
    }
}
