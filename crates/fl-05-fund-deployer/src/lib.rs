//! # Fund Deployer Subsystem
//!
//! **Component ID:** 5
//! **Architecture:** Registry + state machine over the comptroller service
//!
//! ## Purpose
//!
//! Creates funds and moves them between release generations. The
//! [`Dispatcher`] is the single registry of vaults and the creator of every
//! vault, so it is the only party that can swap a vault's accessor. Each
//! [`FundDeployer`] is one release generation with its own status and
//! vault-call allow list. The [`ProtocolController`] owns the global
//! configuration and is the public entry point for new funds.
//!
//! ## Migration State Machine
//!
//! ```text
//!                 signal (creator + migrator, target Live and current)
//!   [no request] ─────────────────────────────────────────→ [pending]
//!        ↑                                                     │
//!        │  cancel (target generation or migrator)             │
//!        ├─────────────────────────────────────────────────────┤
//!        │                                                     │
//!        │  execute (target, timelock elapsed, still current)  │
//!        └──────────── prev: migrate_out → Destructed ←────────┘
//!                      next: Active (shares held by the vault go to the owner)
//! ```
//!
//! `execute_migration_emergency` (dispatcher owner) skips the timelock and
//! caller checks and bypasses hook failures.
//!
//! ## Release Status
//!
//! | Status | New funds | Migrations in | Fund actions |
//! |--------|-----------|---------------|--------------|
//! | `PreLaunch` | no | no | n/a |
//! | `Live` | yes | yes | all |
//! | `Paused` | no | no | redemptions only, unless the fund overrides the pause |

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fund_deployer;
pub mod protocol_controller;
pub mod service;

#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, DEVNET_OWNER};
pub use directory::ReleaseDirectory;
pub use dispatcher::Dispatcher;
pub use domain::{FundModules, Ownership, ParameterRange, ProtocolConfig, ReleaseState};
pub use engine::{EnginePorts, FundEngine};
pub use errors::{ConfigError, DeployerError};
pub use events::{ProtocolEvent, ProtocolLog, RecordedProtocolEvent};
pub use fund_deployer::FundDeployer;
pub use protocol_controller::ProtocolController;
pub use service::{FundApi, FundService, NewFund};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::domain::FundModules;
    pub use crate::engine::{EnginePorts, FundEngine};
    pub use crate::errors::DeployerError;
    pub use crate::service::{FundApi, FundService, NewFund};
}
