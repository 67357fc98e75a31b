//! # Per-Fund Policy State
//!
//! Each enabled policy keeps one [`PolicyState`] per fund. Built-in policies
//! use their own variant; out-of-tree policies store JSON in `Custom`.

use crate::errors::PolicyError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};
use std::collections::{BTreeMap, BTreeSet};

/// Investor whitelist state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistState {
    /// Addresses allowed to buy.
    pub members: BTreeSet<Address>,
}

impl WhitelistState {
    /// Applies removals, then additions. Nothing changes on error.
    ///
    /// # Errors
    ///
    /// `NotInList` when removing a non-member, `AlreadyInList` when adding a
    /// member (including one added earlier in the same call).
    pub fn apply(&mut self, add: &[Address], remove: &[Address]) -> Result<(), PolicyError> {
        let mut members = self.members.clone();
        for address in remove {
            if !members.remove(address) {
                return Err(PolicyError::NotInList(*address));
            }
        }
        for address in add {
            if !members.insert(*address) {
                return Err(PolicyError::AlreadyInList(*address));
            }
        }
        self.members = members;
        Ok(())
    }
}

/// Min/max investment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxState {
    /// Smallest accepted investment.
    pub min_investment_amount: U256,
    /// Largest accepted investment; zero means unbounded.
    pub max_investment_amount: U256,
}

impl MinMaxState {
    /// Whether `amount` is within bounds.
    #[must_use]
    pub fn accepts(&self, amount: U256) -> bool {
        amount >= self.min_investment_amount
            && (self.max_investment_amount.is_zero() || amount <= self.max_investment_amount)
    }
}

/// Which window of a time-frame cycle a moment falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameWindow {
    /// Holders may act.
    SharesAction,
    /// Holders are locked.
    Shorting,
}

/// Time-frame restriction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrameState {
    /// Length of the window in which holders may act.
    pub shares_action_period: u64,
    /// Length of the locked window that follows.
    pub shorting_period: u64,
    /// Start of the first cycle (fund creation).
    pub first_shares_action_timestamp: u64,
    /// Reject purchases during shorting as well as redemptions.
    #[serde(default)]
    pub block_buys: bool,
}

impl TimeFrameState {
    /// Window containing `now`. Times before the first cycle count as the
    /// shares-action window.
    #[must_use]
    pub fn window(&self, now: u64) -> TimeFrameWindow {
        let cycle = self.shares_action_period.saturating_add(self.shorting_period);
        if cycle == 0 || now < self.first_shares_action_timestamp {
            return TimeFrameWindow::SharesAction;
        }
        let offset = (now - self.first_shares_action_timestamp) % cycle;
        if offset < self.shares_action_period {
            TimeFrameWindow::SharesAction
        } else {
            TimeFrameWindow::Shorting
        }
    }
}

/// Per-fund state of one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum PolicyState {
    /// Investor whitelist.
    Whitelist(WhitelistState),
    /// Min/max investment.
    MinMax(MinMaxState),
    /// Time-frame restriction.
    TimeFrame(TimeFrameState),
    /// State owned by a policy outside this crate.
    Custom(serde_json::Value),
}

macro_rules! state_accessors {
    ($($variant:ident => $ty:ty, $get:ident, $get_mut:ident);* $(;)?) => {
        impl PolicyState {
            $(
                /// Borrows the inner state, failing when the variant differs.
                ///
                /// # Errors
                ///
                /// `StateMismatch` tagged with `identifier`.
                pub fn $get(&self, identifier: &'static str) -> Result<&$ty, PolicyError> {
                    match self {
                        Self::$variant(state) => Ok(state),
                        _ => Err(PolicyError::StateMismatch(identifier)),
                    }
                }

                /// Mutably borrows the inner state, failing when the variant differs.
                ///
                /// # Errors
                ///
                /// `StateMismatch` tagged with `identifier`.
                pub fn $get_mut(&mut self, identifier: &'static str) -> Result<&mut $ty, PolicyError> {
                    match self {
                        Self::$variant(state) => Ok(state),
                        _ => Err(PolicyError::StateMismatch(identifier)),
                    }
                }
            )*
        }
    };
}

state_accessors! {
    Whitelist => WhitelistState, as_whitelist, as_whitelist_mut;
    MinMax => MinMaxState, as_min_max, as_min_max_mut;
    TimeFrame => TimeFrameState, as_time_frame, as_time_frame_mut;
}

/// Policies enabled for one fund, in evaluation order, with their state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundPolicyConfig {
    enabled: Vec<Address>,
    states: BTreeMap<Address, PolicyState>,
}

impl FundPolicyConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enabled policy ids in evaluation order.
    #[must_use]
    pub fn enabled(&self) -> &[Address] {
        &self.enabled
    }

    /// Whether `policy` is enabled.
    #[must_use]
    pub fn is_enabled(&self, policy: Address) -> bool {
        self.states.contains_key(&policy)
    }

    /// State of `policy`.
    #[must_use]
    pub fn state(&self, policy: Address) -> Option<&PolicyState> {
        self.states.get(&policy)
    }

    pub(crate) fn state_mut(&mut self, policy: Address) -> Result<&mut PolicyState, PolicyError> {
        self.states
            .get_mut(&policy)
            .ok_or(PolicyError::NotEnabled(policy))
    }

    pub(crate) fn enable(&mut self, policy: Address, state: PolicyState) -> Result<(), PolicyError> {
        if self.states.contains_key(&policy) {
            return Err(PolicyError::AlreadyEnabled(policy));
        }
        self.states.insert(policy, state);
        self.enabled.push(policy);
        Ok(())
    }

    pub(crate) fn disable(&mut self, policy: Address) -> Result<PolicyState, PolicyError> {
        let state = self
            .states
            .remove(&policy)
            .ok_or(PolicyError::NotEnabled(policy))?;
        self.enabled.retain(|id| *id != policy);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    #[test]
    fn test_whitelist_removes_before_adding() {
        let a = Address::repeat_byte(1);
        let mut list = WhitelistState::default();
        list.apply(&[a], &[]).unwrap();
        // Remove then re-add in one call succeeds.
        list.apply(&[a], &[a]).unwrap();
        assert!(list.members.contains(&a));
    }

    #[test]
    fn test_whitelist_failure_leaves_list_untouched() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let mut list = WhitelistState::default();
        list.apply(&[a], &[]).unwrap();
        assert_eq!(list.apply(&[b, a], &[]), Err(PolicyError::AlreadyInList(a)));
        assert!(!list.members.contains(&b));
        assert_eq!(list.apply(&[], &[b]), Err(PolicyError::NotInList(b)));
    }

    #[test]
    fn test_min_max_bounds() {
        let bounded = MinMaxState {
            min_investment_amount: U256::from(1),
            max_investment_amount: U256::from(2),
        };
        assert!(!bounded.accepts(U256::zero()));
        assert!(bounded.accepts(U256::from(2)));
        assert!(!bounded.accepts(U256::from(3)));

        let unbounded = MinMaxState {
            min_investment_amount: U256::from(1),
            max_investment_amount: U256::zero(),
        };
        assert!(unbounded.accepts(U256::MAX));
    }

    #[test]
    fn test_time_frame_windows() {
        let state = TimeFrameState {
            shares_action_period: 5 * DAY,
            shorting_period: 20 * DAY,
            first_shares_action_timestamp: 1_000,
            block_buys: false,
        };
        assert_eq!(state.window(1_000), TimeFrameWindow::SharesAction);
        assert_eq!(state.window(1_000 + 5 * DAY - 1), TimeFrameWindow::SharesAction);
        assert_eq!(state.window(1_000 + 5 * DAY), TimeFrameWindow::Shorting);
        assert_eq!(state.window(1_000 + 25 * DAY), TimeFrameWindow::SharesAction);
        assert_eq!(state.window(1_000 + 45 * DAY), TimeFrameWindow::Shorting);
        assert_eq!(state.window(0), TimeFrameWindow::SharesAction);
    }

    #[test]
    fn test_enable_disable_order() {
        let mut config = FundPolicyConfig::new();
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        config.enable(b, PolicyState::Custom(serde_json::Value::Null)).unwrap();
        config.enable(a, PolicyState::Custom(serde_json::Value::Null)).unwrap();
        assert_eq!(
            config.enable(a, PolicyState::Custom(serde_json::Value::Null)),
            Err(PolicyError::AlreadyEnabled(a))
        );
        assert_eq!(config.enabled(), &[b, a]);
        config.disable(b).unwrap();
        assert_eq!(config.enabled(), &[a]);
        assert_eq!(config.disable(b), Err(PolicyError::NotEnabled(b)));
    }
}
