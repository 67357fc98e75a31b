//! # Fee Engine Subsystem
//!
//! **Component ID:** 2
//! **Architecture:** Hexagonal (Domain + Ports/Adapters), plug-in fees
//!
//! ## Purpose
//!
//! Registers fee modules, keeps each fund's fee configuration and runs the
//! fees at the points of a fund's life where they settle:
//!
//! | Hook | Raised by | Fees |
//! |------|-----------|------|
//! | `Continuous` | any caller, and before migration | Management, Performance |
//! | `PreBuyShares` | buy, before minting | Management, Performance |
//! | `PostBuyShares` | buy, after minting | Entrance referral, Investment |
//! | `PreRedeemShares` | redeem, before burning | Management, Performance |
//!
//! ## Fee Distribution
//!
//! ```text
//!   fee shares due
//!        │
//!        ├── owner split ───────────→ minted to the vault owner
//!        ├── staking split ─────────→ virtual redemption ─┐
//!        └── DAO split ─────────────→ virtual redemption ─┤
//!                                                          │ transfer fails
//!                                                          ↓
//!                                              shares minted to recipient
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  service.rs - FeeManager (registry + hook dispatch)         │
//! └─────────────────────────────────────────────────────────────┘
//!                          ↓ dispatches to ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  fees/ - Management, Performance, EntranceReferral,         │
//! │          Investment                                         │
//! └─────────────────────────────────────────────────────────────┘
//!                          ↓ uses ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  domain/ - FeeContext, FeeState, splits, distribution,      │
//! │            LockedBalances, ReferralBook                     │
//! │  ports/  - Fee, StakingOracle, GavSource                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod fees;
pub mod ports;
pub mod service;

pub use adapters::InMemoryStakingOracle;
pub use domain::{
    distribute, redeem_virtual_shares, EntranceReferralFeeState, FeeContext, FeeEnvironment,
    FeeHook, FeeState, FundFeeConfig, HookArgs, InvestmentFeeState, LockedBalances,
    ManagementFeeState, ManagementSplit, PerformanceFeeState, ReferralBook, Settlement,
    SettlementType, SplitShares, TieredSplit,
};
pub use errors::FeeError;
pub use events::FeeEvent;
pub use fees::{
    EntranceReferralFee, EntranceReferralFeeSettings, InvestmentFee, InvestmentFeeSettings,
    ManagementFee, ManagementFeeSettings, PerformanceFee, PerformanceFeeSettings,
};
pub use ports::{Fee, GavSource, StakingOracle};
pub use service::FeeManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::domain::{
        FeeContext, FeeEnvironment, FeeHook, FundFeeConfig, HookArgs, LockedBalances,
        ReferralBook,
    };
    pub use crate::errors::FeeError;
    pub use crate::events::FeeEvent;
    pub use crate::ports::{Fee, GavSource, StakingOracle};
    pub use crate::service::FeeManager;
}
