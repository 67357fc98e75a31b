//! # Referral Book
//!
//! Referee to referrer mapping for one vault. The first purchase naming a
//! referrer writes the entry; it never changes afterwards.

use crate::errors::FeeError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::BTreeMap;

/// Referrals recorded for one vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralBook {
    referrers: BTreeMap<Address, Address>,
}

impl ReferralBook {
    /// Empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Referrer of `referee`, if any.
    #[must_use]
    pub fn referrer_of(&self, referee: Address) -> Option<Address> {
        self.referrers.get(&referee).copied()
    }

    /// Whether `referee` has a referrer.
    #[must_use]
    pub fn is_referred(&self, referee: Address) -> bool {
        self.referrers.contains_key(&referee)
    }

    /// Records `referrer` for `referee`. Returns `true` when a new entry was
    /// written; a zero referrer or an existing entry is a no-op.
    ///
    /// # Errors
    ///
    /// `SelfReferral` when both addresses are equal.
    pub fn record(&mut self, referee: Address, referrer: Address) -> Result<bool, FeeError> {
        if referrer.is_zero() {
            return Ok(false);
        }
        if referrer == referee {
            return Err(FeeError::SelfReferral(referee));
        }
        if self.referrers.contains_key(&referee) {
            return Ok(false);
        }
        self.referrers.insert(referee, referrer);
        Ok(true)
    }
}
