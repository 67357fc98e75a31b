//! # Built-in Policies
//!
//! | Policy | Hooks | Updatable |
//! |--------|-------|-----------|
//! | [`InvestorWhitelist`] | PreBuy | yes |
//! | [`MinMaxInvestment`] | PreBuy | yes |
//! | [`SharesActionTimeFrame`] | PreBuy, PreRedeem | no |

pub mod investor_whitelist;
pub mod min_max_investment;
pub mod time_frame;

pub use investor_whitelist::{InvestorWhitelist, WhitelistSettings};
pub use min_max_investment::{MinMaxInvestment, MinMaxSettings};
pub use time_frame::{SharesActionTimeFrame, TimeFrameSettings};

use crate::errors::PolicyError;
use serde::de::DeserializeOwned;

/// Decodes a JSON settings payload.
fn decode_settings<T: DeserializeOwned>(
    policy: &'static str,
    settings: &[u8],
) -> Result<T, PolicyError> {
    serde_json::from_slice(settings).map_err(|err| PolicyError::InvalidSettings {
        policy,
        reason: err.to_string(),
    })
}
