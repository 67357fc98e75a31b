//! # Policy Manager
//!
//! Registry of policy modules and the per-fund enable / update / disable
//! lifecycle. Rule evaluation walks the fund's enabled policies in order and
//! stops at the first one that rejects.

use crate::domain::{FundPolicyConfig, PolicyHook, RuleArgs};
use crate::errors::PolicyError;
use crate::events::PolicyEvent;
use crate::ports::Policy;
use parking_lot::RwLock;
use shared_types::{has_duplicates, Address, U256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared registry and evaluator of policy modules.
#[derive(Default)]
pub struct PolicyManager {
    policies: RwLock<BTreeMap<Address, Arc<dyn Policy>>>,
}

impl PolicyManager {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Registers policy modules.
    ///
    /// # Errors
    ///
    /// `EmptyPolicyList`, `DuplicatePolicies` or `AlreadyRegistered`.
    pub fn register_policies(&self, policies: Vec<Arc<dyn Policy>>) -> Result<(), PolicyError> {
        if policies.is_empty() {
            return Err(PolicyError::EmptyPolicyList);
        }
        let ids: Vec<Address> = policies.iter().map(|policy| policy.id()).collect();
        if has_duplicates(&ids) {
            return Err(PolicyError::DuplicatePolicies);
        }
        let mut registry = self.policies.write();
        if let Some(id) = ids.iter().find(|id| registry.contains_key(id)) {
            return Err(PolicyError::AlreadyRegistered(*id));
        }
        for policy in policies {
            info!(policy = ?policy.id(), identifier = policy.identifier(), "Policy registered");
            registry.insert(policy.id(), policy);
        }
        Ok(())
    }

    /// Removes policy modules.
    ///
    /// # Errors
    ///
    /// `EmptyPolicyList` or `NotRegistered`.
    pub fn deregister_policies(&self, ids: &[Address]) -> Result<(), PolicyError> {
        if ids.is_empty() {
            return Err(PolicyError::EmptyPolicyList);
        }
        let mut registry = self.policies.write();
        if let Some(id) = ids.iter().find(|id| !registry.contains_key(id)) {
            return Err(PolicyError::NotRegistered(*id));
        }
        for id in ids {
            registry.remove(id);
            info!(policy = ?id, "Policy deregistered");
        }
        Ok(())
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: Address) -> bool {
        self.policies.read().contains_key(&id)
    }

    /// Registered policy ids.
    #[must_use]
    pub fn registered(&self) -> Vec<Address> {
        self.policies.read().keys().copied().collect()
    }

    /// Module registered under `id`.
    #[must_use]
    pub fn policy(&self, id: Address) -> Option<Arc<dyn Policy>> {
        self.policies.read().get(&id).cloned()
    }

    fn require(&self, id: Address) -> Result<Arc<dyn Policy>, PolicyError> {
        self.policy(id).ok_or(PolicyError::NotRegistered(id))
    }

    // =========================================================================
    // PER-FUND LIFECYCLE
    // =========================================================================

    /// Builds the configuration of a new fund.
    ///
    /// # Errors
    ///
    /// `LengthMismatch`, `DuplicatePolicies`, `NotRegistered` or a settings
    /// error of one of the policies.
    pub fn set_config_for_fund(
        &self,
        policies: &[Address],
        settings: &[Vec<u8>],
        now: u64,
    ) -> Result<(FundPolicyConfig, Vec<PolicyEvent>), PolicyError> {
        if policies.len() != settings.len() {
            return Err(PolicyError::LengthMismatch {
                policies: policies.len(),
                settings: settings.len(),
            });
        }
        if has_duplicates(policies) {
            return Err(PolicyError::DuplicatePolicies);
        }
        let mut config = FundPolicyConfig::new();
        let mut events = Vec::new();
        for (id, payload) in policies.iter().zip(settings) {
            self.enable_policy_for_fund(&mut config, *id, payload, now, &mut events)?;
        }
        Ok((config, events))
    }

    /// Enables a policy on an existing fund.
    ///
    /// # Errors
    ///
    /// `NotRegistered`, `AlreadyEnabled` or a settings error.
    pub fn enable_policy_for_fund(
        &self,
        config: &mut FundPolicyConfig,
        id: Address,
        settings: &[u8],
        now: u64,
        events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        let policy = self.require(id)?;
        if config.is_enabled(id) {
            return Err(PolicyError::AlreadyEnabled(id));
        }
        let state = policy.add_fund_settings(settings, now, events)?;
        let parameters = policy.parameter_values(&state);
        config.enable(id, state)?;
        events.push(PolicyEvent::PolicyEnabledForFund {
            policy: id,
            parameters,
        });
        debug!(policy = ?id, identifier = policy.identifier(), "Policy enabled for fund");
        Ok(())
    }

    /// Updates an enabled, updatable policy.
    ///
    /// # Errors
    ///
    /// `NotEnabled`, `NotRegistered`, `NotUpdatable` or a settings error.
    pub fn update_policy_settings_for_fund(
        &self,
        config: &mut FundPolicyConfig,
        id: Address,
        settings: &[u8],
        events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        if !config.is_enabled(id) {
            return Err(PolicyError::NotEnabled(id));
        }
        let policy = self.require(id)?;
        if !policy.updatable() {
            return Err(PolicyError::NotUpdatable(policy.identifier()));
        }
        policy.update_fund_settings(config.state_mut(id)?, settings, events)?;
        events.push(PolicyEvent::PolicySettingsUpdated { policy: id });
        Ok(())
    }

    /// Disables a policy. Its state is dropped.
    ///
    /// # Errors
    ///
    /// `NotEnabled`.
    pub fn disable_policy_for_fund(
        &self,
        config: &mut FundPolicyConfig,
        id: Address,
        events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        config.disable(id)?;
        events.push(PolicyEvent::PolicyDisabledForFund { policy: id });
        Ok(())
    }

    /// Parameter values of an enabled policy, for bound checks.
    ///
    /// # Errors
    ///
    /// `NotRegistered` or `NotEnabled`.
    pub fn parameter_values(
        &self,
        config: &FundPolicyConfig,
        id: Address,
    ) -> Result<Vec<U256>, PolicyError> {
        let policy = self.require(id)?;
        let state = config.state(id).ok_or(PolicyError::NotEnabled(id))?;
        Ok(policy.parameter_values(state))
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Runs every enabled policy implementing `hook`.
    ///
    /// # Errors
    ///
    /// `RuleFailed` naming the first rejecting policy, or `NotRegistered` if
    /// an enabled policy was deregistered.
    pub fn validate_rules(
        &self,
        config: &FundPolicyConfig,
        hook: PolicyHook,
        args: &RuleArgs,
    ) -> Result<(), PolicyError> {
        for id in config.enabled() {
            let policy = self.require(*id)?;
            if !policy.implemented_hooks().contains(&hook) {
                continue;
            }
            let Some(state) = config.state(*id) else {
                return Err(PolicyError::NotEnabled(*id));
            };
            if !policy.passes_rule(state, hook, args) {
                warn!(
                    identifier = policy.identifier(),
                    actor = ?args.actor,
                    ?hook,
                    "Policy rejected action"
                );
                return Err(PolicyError::RuleFailed(policy.identifier()));
            }
        }
        Ok(())
    }
}
