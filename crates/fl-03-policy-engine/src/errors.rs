//! # Error Types
//!
//! Policy registration, per-fund configuration and rule evaluation errors.

use shared_types::{Address, ErrorKind};
use thiserror::Error;

/// Errors raised by policies and the policy manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Policy id unknown to the registry.
    #[error("policy is not registered: {0:?}")]
    NotRegistered(Address),

    /// Policy id registered twice.
    #[error("policy already registered: {0:?}")]
    AlreadyRegistered(Address),

    /// Empty policy list.
    #[error("policies cannot be empty")]
    EmptyPolicyList,

    /// Same policy listed twice.
    #[error("policies cannot include duplicates")]
    DuplicatePolicies,

    /// Policy and settings lists differ in length.
    #[error("policies and settings array lengths unequal: {policies} policies, {settings} settings")]
    LengthMismatch {
        /// Number of policies.
        policies: usize,
        /// Number of settings payloads.
        settings: usize,
    },

    /// Policy already enabled for the fund.
    #[error("policy already enabled: {0:?}")]
    AlreadyEnabled(Address),

    /// Policy not enabled for the fund.
    #[error("policy not enabled: {0:?}")]
    NotEnabled(Address),

    /// Policy settings cannot change after enabling.
    #[error("{0}: updates not allowed for this policy")]
    NotUpdatable(&'static str),

    /// Settings payload rejected by the policy.
    #[error("{policy}: invalid settings: {reason}")]
    InvalidSettings {
        /// Policy identifier.
        policy: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// Whitelist addition of a member.
    #[error("Address already exists in list: {0:?}")]
    AlreadyInList(Address),

    /// Whitelist removal of a non-member.
    #[error("Address does not exist in list: {0:?}")]
    NotInList(Address),

    /// Stored state does not belong to the policy reading it.
    #[error("{0}: fund state has the wrong shape")]
    StateMismatch(&'static str),

    /// A rule rejected the action.
    #[error("Rule evaluated to false: {0}")]
    RuleFailed(&'static str),
}

impl PolicyError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotRegistered(_) => ErrorKind::UnknownExtensionOrFee,
            Self::AlreadyRegistered(_)
            | Self::EmptyPolicyList
            | Self::DuplicatePolicies
            | Self::LengthMismatch { .. }
            | Self::AlreadyEnabled(_)
            | Self::InvalidSettings { .. }
            | Self::AlreadyInList(_)
            | Self::NotInList(_) => ErrorKind::InvalidArgument,
            Self::NotEnabled(_) | Self::NotUpdatable(_) | Self::StateMismatch(_) => {
                ErrorKind::InvalidState
            }
            Self::RuleFailed(_) => ErrorKind::PolicyViolation,
        }
    }

    /// Identifier of the failed rule, if this is a rule failure.
    #[must_use]
    pub fn violated_rule(&self) -> Option<&'static str> {
        match self {
            Self::RuleFailed(identifier) => Some(identifier),
            _ => None,
        }
    }
}
