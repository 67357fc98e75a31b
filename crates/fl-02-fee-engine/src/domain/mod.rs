//! # Domain Module
//!
//! Hook vocabulary, per-fund fee state, protocol fee parameters and the
//! registries investment and referral fees keep per vault.

pub mod context;
pub mod distribution;
pub mod environment;
pub mod hooks;
pub mod locked_balances;
pub mod referrals;
pub mod state;

pub use context::FeeContext;
pub use distribution::{distribute, redeem_virtual_shares};
pub use environment::{FeeEnvironment, ManagementSplit, SplitShares, TieredSplit};
pub use hooks::{FeeHook, HookArgs, Settlement, SettlementType};
pub use locked_balances::LockedBalances;
pub use referrals::ReferralBook;
pub use state::{
    EntranceReferralFeeState, FeeState, FundFeeConfig, InvestmentFeeState, ManagementFeeState,
    PerformanceFeeState,
};
