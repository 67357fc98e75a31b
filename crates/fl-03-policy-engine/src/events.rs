//! # Policy Events

use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};

/// Event emitted by the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyEvent {
    /// A fund enabled a policy.
    PolicyEnabledForFund {
        /// Policy id.
        policy: Address,
        /// Parameter values in the policy's declared order.
        parameters: Vec<U256>,
    },
    /// A fund changed a policy's settings.
    PolicySettingsUpdated {
        /// Policy id.
        policy: Address,
    },
    /// A fund disabled a policy.
    PolicyDisabledForFund {
        /// Policy id.
        policy: Address,
    },
    /// Whitelist members added.
    AddressesAdded {
        /// Addresses.
        addresses: Vec<Address>,
    },
    /// Whitelist members removed.
    AddressesRemoved {
        /// Addresses.
        addresses: Vec<Address>,
    },
}
