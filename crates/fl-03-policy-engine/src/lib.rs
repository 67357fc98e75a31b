//! # Policy Engine Subsystem
//!
//! **Component ID:** 3
//! **Architecture:** Hexagonal (Domain + Ports), plug-in policies
//!
//! ## Purpose
//!
//! Gates share purchases and redemptions. Each fund enables a set of
//! policies with its own settings; before a buy or redeem the comptroller
//! asks the [`PolicyManager`] to evaluate every enabled policy implementing
//! the hook. Rules are pure predicates over the stored settings and the
//! action; the first rejection aborts the action with
//! `Rule evaluated to false: <IDENTIFIER>`.
//!
//! | Policy | Identifier | Rule |
//! |--------|------------|------|
//! | [`InvestorWhitelist`] | `INVESTOR_WHITELIST` | buyer is listed |
//! | [`MinMaxInvestment`] | `MIN_MAX_INVESTMENT` | `min <= amount <= max` (`max == 0`: no max) |
//! | [`SharesActionTimeFrame`] | `SHARES_ACTION_TIME_FRAME` | redemptions outside shorting windows |
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  service.rs - PolicyManager (registry, lifecycle, rules)    │
//! └─────────────────────────────────────────────────────────────┘
//!                          ↓ dispatches to ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  policies/ - InvestorWhitelist, MinMaxInvestment,           │
//! │              SharesActionTimeFrame                          │
//! │  ports/    - Policy                                         │
//! │  domain/   - PolicyHook, RuleArgs, PolicyState              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod domain;
pub mod errors;
pub mod events;
pub mod policies;
pub mod ports;
pub mod service;

pub use domain::{
    FundPolicyConfig, MinMaxState, PolicyHook, PolicyState, RuleArgs, TimeFrameState,
    TimeFrameWindow, WhitelistState,
};
pub use errors::PolicyError;
pub use events::PolicyEvent;
pub use policies::{
    InvestorWhitelist, MinMaxInvestment, MinMaxSettings, SharesActionTimeFrame,
    TimeFrameSettings, WhitelistSettings,
};
pub use ports::Policy;
pub use service::PolicyManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::domain::{FundPolicyConfig, PolicyHook, RuleArgs};
    pub use crate::errors::PolicyError;
    pub use crate::events::PolicyEvent;
    pub use crate::ports::Policy;
    pub use crate::service::PolicyManager;
}
