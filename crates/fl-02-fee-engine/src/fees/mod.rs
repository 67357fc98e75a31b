//! # Built-in Fees
//!
//! | Fee | Settles on | Updates on | Settlement |
//! |-----|------------|------------|------------|
//! | [`ManagementFee`] | Continuous, PreBuy, PreRedeem | - | Mint |
//! | [`PerformanceFee`] | Continuous, PreBuy, PreRedeem | Continuous, PostBuy, PreRedeem | Mint/Burn outstanding |
//! | [`EntranceReferralFee`] | PostBuy | - | Direct (shares) |
//! | [`InvestmentFee`] | PostBuy | - | Direct (locked token) |

pub mod entrance_referral;
pub mod investment;
pub mod management;
pub mod performance;

#[cfg(test)]
pub(crate) mod test_support;

pub use entrance_referral::{EntranceReferralFee, EntranceReferralFeeSettings};
pub use investment::{InvestmentFee, InvestmentFeeSettings};
pub use management::{ManagementFee, ManagementFeeSettings};
pub use performance::{PerformanceFee, PerformanceFeeSettings};

use crate::errors::FeeError;
use serde::de::DeserializeOwned;

/// Decodes a JSON settings payload.
fn decode_settings<T: DeserializeOwned>(fee: &'static str, settings: &[u8]) -> Result<T, FeeError> {
    serde_json::from_slice(settings).map_err(|err| FeeError::InvalidSettings {
        fee,
        reason: err.to_string(),
    })
}
