//! # Comptroller Subsystem
//!
//! **Component ID:** 4
//! **Architecture:** Hexagonal (Domain + Ports + Adapters), one lock per fund
//!
//! ## Purpose
//!
//! The comptroller is the only writer of a vault. It prices shares, runs
//! policy rules and fee hooks around purchases and redemptions, dispatches
//! extension actions (fee payouts, adapter trades, tracked assets,
//! authorized users) and takes part in the migration lifecycle driven by
//! the fund deployer.
//!
//! | Entry point | Guards | Effect |
//! |-------------|--------|--------|
//! | [`ComptrollerService::buy_shares`] | active, not paused, no migration, policies | denomination in, shares out |
//! | [`ComptrollerService::redeem_shares_detailed`] | timelock, policies | shares burned, assets out |
//! | [`ComptrollerService::redeem_shares_and_swap`] | as above | assets swapped on the way out |
//! | [`ComptrollerService::call_on_extension`] | active, not paused, per-action auth | fee or integration action |
//! | [`ComptrollerService::vault_call_on_contract`] | owner, registered selector | passthrough call |
//!
//! ## Call Flow
//!
//! ```text
//! caller ──→ FundCell::enter ──→ staged FundState + CustodyTx
//!                                     │
//!                 ┌───────────────────┼───────────────────┐
//!                 ↓                   ↓                   ↓
//!          PolicyManager         FeeManager        IntegrationManager
//!          (rules)               (hooks)           (adapter trades)
//!                 └───────────────────┼───────────────────┘
//!                                     ↓
//!                    Ok: history + commit │ Err: roll back
//! ```
//!
//! Reentrant calls on the same fund from a token callback fail with
//! [`ComptrollerError::Reentrance`]; calls on different funds run in
//! parallel.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod extensions;
pub mod integration;
pub mod ports;
pub mod service;
pub mod valuation;

#[cfg(test)]
mod test_support;

pub use adapters::{
    PriceTableInterpreter, RecordedCall, RecordingContractCaller, RouterAdapter,
    StaticDeployerRegistry, TakeOrderArgs, TAKE_ORDER,
};
pub use domain::{
    ComptrollerRecord, ComptrollerStatus, EntryGuard, FundCell, FundState, MigrationRequest,
    ReleaseStatus, FUND_STATE_SCHEMA_VERSION,
};
pub use errors::{ComptrollerError, IntegrationError, ValuationError};
pub use events::{ComptrollerEvent, FundEvent, RecordedEvent};
pub use extensions::{
    decode_args, encode_args, ExtensionAddresses, FeeManagerAction, IntegrationCall,
    IntegrationManagerAction,
};
pub use integration::{IntegrationContext, IntegrationManager};
pub use ports::{AssetsForMethod, ContractCaller, DeployerRegistry, IntegrationAdapter, ValueInterpreter};
pub use service::{ComptrollerDependencies, ComptrollerService, Staged};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::domain::{ComptrollerStatus, FundCell, FundState, ReleaseStatus};
    pub use crate::errors::ComptrollerError;
    pub use crate::events::{ComptrollerEvent, FundEvent};
    pub use crate::ports::{ContractCaller, DeployerRegistry, IntegrationAdapter, ValueInterpreter};
    pub use crate::service::{ComptrollerDependencies, ComptrollerService};
}
