//! Fee and policy selection for a new comptroller.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Fees and policies with their encoded settings, index aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundModules {
    /// Fee ids in settlement order.
    pub fees: Vec<Address>,
    /// Settings payload per fee.
    pub fee_settings: Vec<Vec<u8>>,
    /// Policy ids.
    pub policies: Vec<Address>,
    /// Settings payload per policy.
    pub policy_settings: Vec<Vec<u8>>,
}

impl FundModules {
    /// Adds a fee.
    #[must_use]
    pub fn with_fee(mut self, fee: Address, settings: Vec<u8>) -> Self {
        self.fees.push(fee);
        self.fee_settings.push(settings);
        self
    }

    /// Adds a policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Address, settings: Vec<u8>) -> Self {
        self.policies.push(policy);
        self.policy_settings.push(settings);
        self
    }
}
