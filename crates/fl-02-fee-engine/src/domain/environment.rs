//! # Fee Environment
//!
//! Protocol-wide parameters every fee settlement reads: recipient addresses,
//! split ratios and the investment token. Owned by the protocol controller
//! and handed to fees by reference.

use crate::errors::FeeError;
use serde::{Deserialize, Serialize};
use shared_types::math::{self, RATE_DIVISOR};
use shared_types::{Address, U256};

/// Management fee split between the fund owner, the staking pool and the DAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementSplit {
    /// Owner portion, 18 decimals.
    pub vault_owner: U256,
    /// Staking pool portion (the DAO gets the same), 18 decimals.
    pub staking_and_dao: U256,
}

impl ManagementSplit {
    /// Validated split: `vault_owner + 2 * staking_and_dao == 1e18`.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` when the portions do not add up.
    pub fn new(vault_owner: U256, staking_and_dao: U256) -> Result<Self, FeeError> {
        let total = staking_and_dao
            .checked_mul(U256::from(2))
            .and_then(|doubled| doubled.checked_add(vault_owner));
        if total != Some(RATE_DIVISOR) {
            return Err(FeeError::InvalidSettings {
                fee: "MANAGEMENT_SPLIT",
                reason: "vault owner split plus twice the staking and dao split must equal 1e18"
                    .into(),
            });
        }
        Ok(Self {
            vault_owner,
            staking_and_dao,
        })
    }
}

impl Default for ManagementSplit {
    fn default() -> Self {
        Self {
            vault_owner: RATE_DIVISOR / 2,
            staking_and_dao: RATE_DIVISOR / 4,
        }
    }
}

/// Performance fee owner split, tiered by how much the owner has staked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredSplit {
    /// Owner split with nothing staked, 18 decimals.
    pub base: U256,
    /// Added per full tier staked, 18 decimals.
    pub increase_per_tier: U256,
    /// Staked amount per tier.
    pub tier_size: U256,
    /// Upper bound of the owner split, 18 decimals.
    pub max: U256,
}

impl TieredSplit {
    /// Validated tier table.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` for a zero tier size, `base > max` or `max > 1e18`.
    pub fn new(
        base: U256,
        increase_per_tier: U256,
        tier_size: U256,
        max: U256,
    ) -> Result<Self, FeeError> {
        let reason = if tier_size.is_zero() {
            Some("tier size must be greater than 0")
        } else if base > max {
            Some("base split cannot exceed the max split")
        } else if max > RATE_DIVISOR {
            Some("max split cannot exceed 1e18")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(FeeError::InvalidSettings {
                fee: "PERFORMANCE_SPLIT",
                reason: reason.into(),
            });
        }
        Ok(Self {
            base,
            increase_per_tier,
            tier_size,
            max,
        })
    }

    /// Owner split for an owner with `staked` tokens.
    #[must_use]
    pub fn owner_split(&self, staked: U256) -> U256 {
        let tiers = staked / self.tier_size;
        let bonus = self.increase_per_tier.saturating_mul(tiers);
        self.base.saturating_add(bonus).min(self.max)
    }
}

impl Default for TieredSplit {
    fn default() -> Self {
        Self {
            base: RATE_DIVISOR / 2,
            increase_per_tier: RATE_DIVISOR / 40,
            tier_size: math::ether(1_000),
            max: RATE_DIVISOR * 3 / 4,
        }
    }
}

/// Everything protocol-wide a fee settlement needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEnvironment {
    /// Management fee split.
    pub management_split: ManagementSplit,
    /// Performance fee owner split.
    pub performance_split: TieredSplit,
    /// Staking pool recipient.
    pub staking_pool: Address,
    /// DAO recipient.
    pub dao: Address,
    /// Token the investment fee buys and locks.
    pub investment_token: Address,
}

/// Share quantities a fee distributes to each recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShares {
    /// Fund owner portion.
    pub owner: U256,
    /// Staking pool portion.
    pub staking: U256,
    /// DAO portion (the remainder).
    pub dao: U256,
}

impl SplitShares {
    /// Splits `total` giving `owner_split` to the owner and the rest evenly
    /// to staking and the DAO, the DAO taking the rounding remainder.
    ///
    /// # Errors
    ///
    /// Arithmetic errors.
    pub fn with_owner_split(total: U256, owner_split: U256) -> Result<Self, FeeError> {
        let owner = math::mul_div(total, owner_split, RATE_DIVISOR)?;
        let rest = math::sub(total, owner)?;
        let staking = rest / 2;
        let dao = math::sub(rest, staking)?;
        Ok(Self {
            owner,
            staking,
            dao,
        })
    }

    /// Splits `total` by a management split; the DAO takes the remainder.
    ///
    /// # Errors
    ///
    /// Arithmetic errors.
    pub fn with_management_split(total: U256, split: &ManagementSplit) -> Result<Self, FeeError> {
        let owner = math::mul_div(total, split.vault_owner, RATE_DIVISOR)?;
        let staking = math::mul_div(total, split.staking_and_dao, RATE_DIVISOR)?;
        let dao = math::sub(math::sub(total, owner)?, staking)?;
        Ok(Self {
            owner,
            staking,
            dao,
        })
    }
}
