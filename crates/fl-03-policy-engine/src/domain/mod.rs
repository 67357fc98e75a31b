//! # Domain Module
//!
//! Hook vocabulary and per-fund policy state.

pub mod hooks;
pub mod state;

pub use hooks::{PolicyHook, RuleArgs};
pub use state::{
    FundPolicyConfig, MinMaxState, PolicyState, TimeFrameState, TimeFrameWindow, WhitelistState,
};
