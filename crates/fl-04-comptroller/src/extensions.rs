//! # Extensions
//!
//! `callOnExtension` targets and their action ids.
//!
//! | Extension | Id | Action | Caller |
//! |-----------|----|--------|--------|
//! | fee manager | 0 | invoke the continuous hook | anyone |
//! | fee manager | 1 | pay out shares outstanding | anyone |
//! | integration manager | 0 | `callOnIntegration` | owner or authorised user |
//! | integration manager | 1 | add tracked assets | owner or authorised user |
//! | integration manager | 2 | remove tracked assets | owner or authorised user |
//! | integration manager | 3 | add authorised users | owner |
//! | integration manager | 4 | remove authorised users | owner |

use crate::errors::ComptrollerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Selector};

/// Addresses the comptroller recognises as extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAddresses {
    /// Fee manager.
    pub fee_manager: Address,
    /// Integration manager.
    pub integration_manager: Address,
}

impl Default for ExtensionAddresses {
    fn default() -> Self {
        Self {
            fee_manager: Address::derive("FeeManager", Address::ZERO, 0),
            integration_manager: Address::derive("IntegrationManager", Address::ZERO, 0),
        }
    }
}

/// Fee manager actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeManagerAction {
    /// Settle every fee on the continuous hook.
    InvokeContinuousHook,
    /// Pay out shares outstanding; arguments are a JSON list of fee ids.
    PayoutSharesOutstanding,
}

impl TryFrom<u32> for FeeManagerAction {
    type Error = ComptrollerError;

    fn try_from(action_id: u32) -> Result<Self, Self::Error> {
        match action_id {
            0 => Ok(Self::InvokeContinuousHook),
            1 => Ok(Self::PayoutSharesOutstanding),
            other => Err(ComptrollerError::InvalidActionId(other)),
        }
    }
}

/// Integration manager actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationManagerAction {
    /// Trade through an adapter; arguments are an [`IntegrationCall`].
    CallOnIntegration,
    /// Track assets; arguments are a JSON list of assets.
    AddTrackedAssets,
    /// Untrack assets; arguments are a JSON list of assets.
    RemoveTrackedAssets,
    /// Allow accounts to trade; arguments are a JSON list of accounts.
    AddAuthUsers,
    /// Revoke trading rights; arguments are a JSON list of accounts.
    RemoveAuthUsers,
}

impl IntegrationManagerAction {
    /// Whether only the fund owner may run the action.
    #[must_use]
    pub fn owner_only(self) -> bool {
        matches!(self, Self::AddAuthUsers | Self::RemoveAuthUsers)
    }
}

impl TryFrom<u32> for IntegrationManagerAction {
    type Error = ComptrollerError;

    fn try_from(action_id: u32) -> Result<Self, Self::Error> {
        match action_id {
            0 => Ok(Self::CallOnIntegration),
            1 => Ok(Self::AddTrackedAssets),
            2 => Ok(Self::RemoveTrackedAssets),
            3 => Ok(Self::AddAuthUsers),
            4 => Ok(Self::RemoveAuthUsers),
            other => Err(ComptrollerError::InvalidActionId(other)),
        }
    }
}

/// Arguments of [`IntegrationManagerAction::CallOnIntegration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCall {
    /// Registered adapter.
    pub adapter: Address,
    /// Adapter method.
    pub selector: Selector,
    /// Adapter-specific arguments.
    pub args: Vec<u8>,
}

/// Decodes JSON extension arguments.
///
/// # Errors
///
/// `InvalidArgument` for malformed input.
pub fn decode_args<T: DeserializeOwned>(args: &[u8]) -> Result<T, ComptrollerError> {
    serde_json::from_slice(args).map_err(|err| ComptrollerError::InvalidArgument(err.to_string()))
}

/// Encodes JSON extension arguments.
///
/// # Errors
///
/// `InvalidArgument` if serialisation fails.
pub fn encode_args<T: Serialize>(args: &T) -> Result<Vec<u8>, ComptrollerError> {
    serde_json::to_vec(args).map_err(|err| ComptrollerError::InvalidArgument(err.to_string()))
}
