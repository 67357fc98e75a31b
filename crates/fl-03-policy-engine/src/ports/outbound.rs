//! # Driven Ports (SPI - Outbound)
//!
//! [`Policy`] is the plug-in seam the policy manager dispatches to.

use crate::domain::{PolicyHook, PolicyState, RuleArgs};
use crate::errors::PolicyError;
use crate::events::PolicyEvent;
use shared_types::{Address, U256};

/// A pluggable gating rule.
///
/// Implementations are stateless; per-fund data lives in the
/// [`PolicyState`] the manager owns.
pub trait Policy: Send + Sync {
    /// Registry id.
    fn id(&self) -> Address;

    /// Stable human readable identifier, e.g. `INVESTOR_WHITELIST`.
    fn identifier(&self) -> &'static str;

    /// Hooks on which [`Policy::passes_rule`] runs.
    fn implemented_hooks(&self) -> &'static [PolicyHook];

    /// Whether settings may change after enabling.
    fn updatable(&self) -> bool {
        false
    }

    /// Parses a fund's settings payload into its initial state. `now` is
    /// the enabling time.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` or a policy specific validation error.
    fn add_fund_settings(
        &self,
        settings: &[u8],
        now: u64,
        events: &mut Vec<PolicyEvent>,
    ) -> Result<PolicyState, PolicyError>;

    /// Applies a settings update to an enabled policy.
    ///
    /// # Errors
    ///
    /// `NotUpdatable` unless overridden.
    fn update_fund_settings(
        &self,
        _state: &mut PolicyState,
        _settings: &[u8],
        _events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        Err(PolicyError::NotUpdatable(self.identifier()))
    }

    /// Pure predicate over the fund's state and the action.
    fn passes_rule(&self, state: &PolicyState, hook: PolicyHook, args: &RuleArgs) -> bool;

    /// Parameter values in a fixed order, checked against protocol bounds.
    fn parameter_values(&self, _state: &PolicyState) -> Vec<U256> {
        Vec::new()
    }
}
