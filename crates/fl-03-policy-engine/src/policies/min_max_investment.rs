//! # Min/Max Investment
//!
//! Bounds the denomination amount of a single purchase. A maximum of zero
//! means there is no upper bound.

use super::decode_settings;
use crate::domain::{MinMaxState, PolicyHook, PolicyState, RuleArgs};
use crate::errors::PolicyError;
use crate::events::PolicyEvent;
use crate::ports::Policy;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Identifier of the min/max policy.
pub const IDENTIFIER: &str = "MIN_MAX_INVESTMENT";

/// Settings and update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxSettings {
    /// Smallest accepted investment.
    pub min_investment_amount: U256,
    /// Largest accepted investment; zero for none.
    pub max_investment_amount: U256,
}

impl MinMaxSettings {
    fn into_state(self) -> Result<MinMaxState, PolicyError> {
        if !self.max_investment_amount.is_zero()
            && self.min_investment_amount >= self.max_investment_amount
        {
            return Err(PolicyError::InvalidSettings {
                policy: IDENTIFIER,
                reason: "minInvestmentAmount must be less than maxInvestmentAmount".into(),
            });
        }
        Ok(MinMaxState {
            min_investment_amount: self.min_investment_amount,
            max_investment_amount: self.max_investment_amount,
        })
    }
}

/// Min/max investment policy.
#[derive(Debug, Clone)]
pub struct MinMaxInvestment {
    id: Address,
}

impl MinMaxInvestment {
    /// Policy registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }
}

impl Policy for MinMaxInvestment {
    fn id(&self) -> Address {
        self.id
    }

    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn implemented_hooks(&self) -> &'static [PolicyHook] {
        &[PolicyHook::PreBuyShares]
    }

    fn updatable(&self) -> bool {
        true
    }

    fn add_fund_settings(
        &self,
        settings: &[u8],
        _now: u64,
        _events: &mut Vec<PolicyEvent>,
    ) -> Result<PolicyState, PolicyError> {
        let settings: MinMaxSettings = decode_settings(IDENTIFIER, settings)?;
        Ok(PolicyState::MinMax(settings.into_state()?))
    }

    fn update_fund_settings(
        &self,
        state: &mut PolicyState,
        settings: &[u8],
        _events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        let settings: MinMaxSettings = decode_settings(IDENTIFIER, settings)?;
        *state.as_min_max_mut(IDENTIFIER)? = settings.into_state()?;
        Ok(())
    }

    fn passes_rule(&self, state: &PolicyState, _hook: PolicyHook, args: &RuleArgs) -> bool {
        state
            .as_min_max(IDENTIFIER)
            .map(|bounds| bounds.accepts(args.investment_amount))
            .unwrap_or(false)
    }

    fn parameter_values(&self, state: &PolicyState) -> Vec<U256> {
        state
            .as_min_max(IDENTIFIER)
            .map(|s| vec![s.min_investment_amount, s.max_investment_amount])
            .unwrap_or_default()
    }
}
