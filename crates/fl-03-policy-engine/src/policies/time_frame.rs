//! # Shares Action Time Frame
//!
//! Time after fund creation is cut into repeating cycles of
//! `shares_action_period + shorting_period`. Holders may act in the first
//! part of each cycle; during the shorting part redemptions fail. Purchases
//! pass in every window unless the fund opts into `block_buys`.
//!
//! ```text
//! created
//!   │◄─ action ─►│◄──── shorting ────►│◄─ action ─►│◄──── shorting ...
//! ```

use super::decode_settings;
use crate::domain::{PolicyHook, PolicyState, RuleArgs, TimeFrameState, TimeFrameWindow};
use crate::errors::PolicyError;
use crate::events::PolicyEvent;
use crate::ports::Policy;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Identifier of the time-frame policy.
pub const IDENTIFIER: &str = "SHARES_ACTION_TIME_FRAME";

/// Settings payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrameSettings {
    /// Window in which holders may act, in seconds. Must be non-zero.
    pub shares_action_period: u64,
    /// Locked window, in seconds. Must be non-zero.
    pub shorting_period: u64,
    /// Also reject purchases during shorting.
    #[serde(default)]
    pub block_buys: bool,
}

/// Time-frame restriction policy.
#[derive(Debug, Clone)]
pub struct SharesActionTimeFrame {
    id: Address,
}

impl SharesActionTimeFrame {
    /// Policy registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }

    /// Window a fund using `state` is in at `now`.
    ///
    /// # Errors
    ///
    /// `StateMismatch` if `state` is not a time-frame state.
    pub fn current_window(state: &PolicyState, now: u64) -> Result<TimeFrameWindow, PolicyError> {
        Ok(state.as_time_frame(IDENTIFIER)?.window(now))
    }
}

impl Policy for SharesActionTimeFrame {
    fn id(&self) -> Address {
        self.id
    }

    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn implemented_hooks(&self) -> &'static [PolicyHook] {
        &[PolicyHook::PreBuyShares, PolicyHook::PreRedeemShares]
    }

    fn add_fund_settings(
        &self,
        settings: &[u8],
        now: u64,
        _events: &mut Vec<PolicyEvent>,
    ) -> Result<PolicyState, PolicyError> {
        let settings: TimeFrameSettings = decode_settings(IDENTIFIER, settings)?;
        if settings.shares_action_period == 0 || settings.shorting_period == 0 {
            return Err(PolicyError::InvalidSettings {
                policy: IDENTIFIER,
                reason: "sharesActionPeriod and shortingPeriod must be non-zero".into(),
            });
        }
        Ok(PolicyState::TimeFrame(TimeFrameState {
            shares_action_period: settings.shares_action_period,
            shorting_period: settings.shorting_period,
            first_shares_action_timestamp: now,
            block_buys: settings.block_buys,
        }))
    }

    fn passes_rule(&self, state: &PolicyState, hook: PolicyHook, args: &RuleArgs) -> bool {
        let Ok(frame) = state.as_time_frame(IDENTIFIER) else {
            return false;
        };
        match frame.window(args.now) {
            TimeFrameWindow::SharesAction => true,
            TimeFrameWindow::Shorting => hook == PolicyHook::PreBuyShares && !frame.block_buys,
        }
    }

    fn parameter_values(&self, state: &PolicyState) -> Vec<U256> {
        state
            .as_time_frame(IDENTIFIER)
            .map(|s| {
                vec![
                    U256::from(s.shares_action_period),
                    U256::from(s.shorting_period),
                ]
            })
            .unwrap_or_default()
    }
}
