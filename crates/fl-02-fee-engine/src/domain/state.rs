//! # Per-Fund Fee State
//!
//! Each enabled fee keeps one [`FeeState`] per fund. Built-in fees use their
//! own variant; out-of-tree fees store arbitrary JSON in `Custom`.

use crate::errors::FeeError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};
use std::collections::BTreeMap;

/// Management fee state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementFeeState {
    /// Per-second compounding factor, 27 decimals.
    pub scaled_per_second_rate: U256,
    /// Timestamp of the last settlement. Zero until the first one.
    pub last_settled: u64,
}

/// Performance fee state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceFeeState {
    /// Fee rate, 18 decimals.
    pub rate: U256,
    /// Crystallisation period in seconds.
    pub period: u64,
    /// Activation timestamp.
    pub activated: u64,
    /// Timestamp of the last payout.
    pub last_paid: u64,
    /// Highest crystallised share price.
    pub high_water_mark: U256,
    /// Share price at the last update.
    pub last_share_price: U256,
    /// Value owed to the fee since the last payout.
    pub aggregate_value_due: U256,
}

/// Entrance referral fee state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceReferralFeeState {
    /// Fee rate, 18 decimals.
    pub rate: U256,
    /// Receiver when the buyer has no referrer.
    pub beneficiary: Option<Address>,
}

/// Investment fee state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentFeeState {
    /// Fee rate, 18 decimals.
    pub rate: U256,
}

/// Per-fund state of one fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum FeeState {
    /// Management fee.
    Management(ManagementFeeState),
    /// Performance fee.
    Performance(PerformanceFeeState),
    /// Entrance referral fee.
    EntranceReferral(EntranceReferralFeeState),
    /// Investment fee.
    Investment(InvestmentFeeState),
    /// State owned by a fee outside this crate.
    Custom(serde_json::Value),
}

macro_rules! state_accessors {
    ($($variant:ident => $ty:ty, $get:ident, $get_mut:ident);* $(;)?) => {
        impl FeeState {
            $(
                /// Borrows the inner state, failing when the variant differs.
                ///
                /// # Errors
                ///
                /// `StateMismatch` tagged with `identifier`.
                pub fn $get(&self, identifier: &'static str) -> Result<&$ty, FeeError> {
                    match self {
                        Self::$variant(state) => Ok(state),
                        _ => Err(FeeError::StateMismatch(identifier)),
                    }
                }

                /// Mutably borrows the inner state, failing when the variant differs.
                ///
                /// # Errors
                ///
                /// `StateMismatch` tagged with `identifier`.
                pub fn $get_mut(&mut self, identifier: &'static str) -> Result<&mut $ty, FeeError> {
                    match self {
                        Self::$variant(state) => Ok(state),
                        _ => Err(FeeError::StateMismatch(identifier)),
                    }
                }
            )*
        }
    };
}

state_accessors! {
    Management => ManagementFeeState, as_management, as_management_mut;
    Performance => PerformanceFeeState, as_performance, as_performance_mut;
    EntranceReferral => EntranceReferralFeeState, as_entrance_referral, as_entrance_referral_mut;
    Investment => InvestmentFeeState, as_investment, as_investment_mut;
}

/// Fees enabled for one fund, in settlement order, with their state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundFeeConfig {
    enabled: Vec<Address>,
    states: BTreeMap<Address, FeeState>,
}

impl FundFeeConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enabled fee ids in settlement order.
    #[must_use]
    pub fn enabled(&self) -> &[Address] {
        &self.enabled
    }

    /// Whether `fee` is enabled.
    #[must_use]
    pub fn is_enabled(&self, fee: Address) -> bool {
        self.states.contains_key(&fee)
    }

    /// State of `fee`.
    #[must_use]
    pub fn state(&self, fee: Address) -> Option<&FeeState> {
        self.states.get(&fee)
    }

    /// Mutable state of `fee`.
    pub fn state_mut(&mut self, fee: Address) -> Option<&mut FeeState> {
        self.states.get_mut(&fee)
    }

    pub(crate) fn insert(&mut self, fee: Address, state: FeeState) {
        if self.states.insert(fee, state).is_none() {
            self.enabled.push(fee);
        }
    }

    /// Takes the state of `fee` out for the duration of a settlement.
    pub(crate) fn take(&mut self, fee: Address) -> Result<FeeState, FeeError> {
        self.states.remove(&fee).ok_or(FeeError::NotEnabled(fee))
    }

    /// Puts a state taken with [`Self::take`] back.
    pub(crate) fn restore(&mut self, fee: Address, state: FeeState) {
        self.states.insert(fee, state);
    }
}
