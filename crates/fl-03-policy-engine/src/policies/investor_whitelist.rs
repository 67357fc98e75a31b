//! # Investor Whitelist
//!
//! Only listed addresses may buy shares. Settings carry `add` and `remove`
//! lists; removals are applied first, so an address can be rotated out and
//! back in with a single update.

use super::decode_settings;
use crate::domain::{PolicyHook, PolicyState, RuleArgs, WhitelistState};
use crate::errors::PolicyError;
use crate::events::PolicyEvent;
use crate::ports::Policy;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use tracing::debug;

/// Identifier of the whitelist policy.
pub const IDENTIFIER: &str = "INVESTOR_WHITELIST";

/// Settings and update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistSettings {
    /// Addresses to add.
    #[serde(default)]
    pub add: Vec<Address>,
    /// Addresses to remove.
    #[serde(default)]
    pub remove: Vec<Address>,
}

/// Investor whitelist policy.
#[derive(Debug, Clone)]
pub struct InvestorWhitelist {
    id: Address,
}

impl InvestorWhitelist {
    /// Policy registered under `id`.
    #[must_use]
    pub fn new(id: Address) -> Self {
        Self { id }
    }

    fn apply(
        list: &mut WhitelistState,
        settings: &WhitelistSettings,
        events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        list.apply(&settings.add, &settings.remove)?;
        if !settings.remove.is_empty() {
            events.push(PolicyEvent::AddressesRemoved {
                addresses: settings.remove.clone(),
            });
        }
        if !settings.add.is_empty() {
            events.push(PolicyEvent::AddressesAdded {
                addresses: settings.add.clone(),
            });
        }
        debug!(
            added = settings.add.len(),
            removed = settings.remove.len(),
            members = list.members.len(),
            "Whitelist updated"
        );
        Ok(())
    }
}

impl Policy for InvestorWhitelist {
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
        events: &mut Vec<PolicyEvent>,
    ) -> Result<PolicyState, PolicyError> {
        let settings: WhitelistSettings = decode_settings(IDENTIFIER, settings)?;
        let mut list = WhitelistState::default();
        Self::apply(&mut list, &settings, events)?;
        Ok(PolicyState::Whitelist(list))
    }

    fn update_fund_settings(
        &self,
        state: &mut PolicyState,
        settings: &[u8],
        events: &mut Vec<PolicyEvent>,
    ) -> Result<(), PolicyError> {
        let settings: WhitelistSettings = decode_settings(IDENTIFIER, settings)?;
        Self::apply(state.as_whitelist_mut(IDENTIFIER)?, &settings, events)
    }

    fn passes_rule(&self, state: &PolicyState, _hook: PolicyHook, args: &RuleArgs) -> bool {
        state
            .as_whitelist(IDENTIFIER)
            .map(|list| list.members.contains(&args.actor))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::U256;

    fn payload(add: &[Address], remove: &[Address]) -> Vec<u8> {
        serde_json::to_vec(&WhitelistSettings {
            add: add.to_vec(),
            remove: remove.to_vec(),
        })
        .unwrap()
    }

    #[test]
    fn test_identifier() {
        assert_eq!(InvestorWhitelist::new(Address::ZERO).identifier(), "INVESTOR_WHITELIST");
    }

    #[test]
    fn test_rule_checks_membership() {
        let policy = InvestorWhitelist::new(Address::repeat_byte(0x01));
        let a = Address::repeat_byte(0xA1);
        let b = Address::repeat_byte(0xB2);
        let mut events = Vec::new();
        let state = policy.add_fund_settings(&payload(&[a], &[]), 0, &mut events).unwrap();

        assert!(policy.passes_rule(&state, PolicyHook::PreBuyShares, &RuleArgs::buy(a, U256::one(), 0)));
        assert!(!policy.passes_rule(&state, PolicyHook::PreBuyShares, &RuleArgs::buy(b, U256::one(), 0)));
        assert_eq!(events, vec![PolicyEvent::AddressesAdded { addresses: vec![a] }]);
    }

    #[test]
    fn test_add_and_remove_in_one_update() {
        let policy = InvestorWhitelist::new(Address::repeat_byte(0x01));
        let a = Address::repeat_byte(0xA1);
        let b = Address::repeat_byte(0xB2);
        let mut events = Vec::new();
        let mut state = policy.add_fund_settings(&payload(&[a], &[]), 0, &mut events).unwrap();

        policy
            .update_fund_settings(&mut state, &payload(&[b], &[a]), &mut events)
            .unwrap();
        let list = state.as_whitelist(IDENTIFIER).unwrap();
        assert!(list.members.contains(&b));
        assert!(!list.members.contains(&a));
    }

    #[test]
    fn test_duplicate_and_missing_entries() {
        let policy = InvestorWhitelist::new(Address::repeat_byte(0x01));
        let a = Address::repeat_byte(0xA1);
        let mut events = Vec::new();
        assert_eq!(
            policy.add_fund_settings(&payload(&[a, a], &[]), 0, &mut events),
            Err(PolicyError::AlreadyInList(a))
        );
        let mut state = policy.add_fund_settings(&payload(&[a], &[]), 0, &mut events).unwrap();
        let err = policy
            .update_fund_settings(&mut state, &payload(&[a], &[]), &mut events)
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Address already exists in list: {a:?}"));
        let missing = Address::repeat_byte(0xCC);
        assert_eq!(
            policy.update_fund_settings(&mut state, &payload(&[], &[missing]), &mut events),
            Err(PolicyError::NotInList(missing))
        );
    }

    #[test]
    fn test_malformed_payload() {
        let policy = InvestorWhitelist::new(Address::ZERO);
        assert!(matches!(
            policy.add_fund_settings(b"not json", 0, &mut Vec::new()),
            Err(PolicyError::InvalidSettings { .. })
        ));
    }
}
