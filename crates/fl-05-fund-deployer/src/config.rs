//! Engine configuration from environment variables.

use crate::errors::ConfigError;
use fl_02_fee_engine::ManagementSplit;
use shared_types::{math, Address, U256};
use std::env;

/// Owner of the dispatcher and the protocol controller when none is
/// configured.
pub const DEVNET_OWNER: Address = Address::new([0x01; 20]);

/// Settings the engine is wired with at start-up. Everything here can be
/// changed later by the protocol owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Owner of the dispatcher and the protocol controller
    pub protocol_owner: Address,

    /// Seconds between signalling and executing a migration
    pub migration_timelock: u64,

    /// Symbol of every fund's shares
    pub shares_token_symbol: String,

    /// Management fee portion paid to the vault owner, 18 decimals
    pub management_owner_split: U256,

    /// Management fee portion paid to the staking pool (and again to the
    /// DAO), 18 decimals
    pub management_staking_split: U256,

    /// Staking pool fee recipient
    pub staking_pool: Address,

    /// DAO fee recipient
    pub dao: Address,

    /// Token the investment fee is charged in
    pub investment_token: Address,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let split = ManagementSplit::default();
        Self {
            protocol_owner: DEVNET_OWNER,
            migration_timelock: 0,
            shares_token_symbol: "FLS".to_string(),
            management_owner_split: split.vault_owner,
            management_staking_split: split.staking_and_dao,
            staking_pool: Address::derive("StakingPool", DEVNET_OWNER, 0),
            dao: Address::derive("Dao", DEVNET_OWNER, 0),
            investment_token: Address::derive("InvestmentToken", DEVNET_OWNER, 0),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FL_PROTOCOL_OWNER`: Hex address of the protocol owner
    /// - `FL_MIGRATION_TIMELOCK`: Migration timelock in seconds (default: 0)
    /// - `FL_SHARES_SYMBOL`: Shares symbol (default: FLS)
    /// - `FL_MANAGEMENT_OWNER_SPLIT`: Owner portion, 18 decimals
    /// - `FL_MANAGEMENT_STAKING_SPLIT`: Staking pool portion, 18 decimals
    /// - `FL_STAKING_POOL`, `FL_DAO`, `FL_INVESTMENT_TOKEN`: Hex addresses
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for malformed values or a split that does not add up.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let address = |key: &'static str, default: Address| -> Result<Address, ConfigError> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .map_err(|source| ConfigError::InvalidAddress { key, source })
            })
        };
        let amount = |key: &'static str, default: U256| -> Result<U256, ConfigError> {
            lookup(key).map_or(Ok(default), |raw| {
                math::from_dec(raw.trim())
                    .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
            })
        };

        let config = Self {
            protocol_owner: address("FL_PROTOCOL_OWNER", defaults.protocol_owner)?,
            migration_timelock: match lookup("FL_MIGRATION_TIMELOCK") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber {
                        key: "FL_MIGRATION_TIMELOCK",
                        value: raw,
                    })?,
                None => defaults.migration_timelock,
            },
            shares_token_symbol: lookup("FL_SHARES_SYMBOL")
                .unwrap_or(defaults.shares_token_symbol),
            management_owner_split: amount(
                "FL_MANAGEMENT_OWNER_SPLIT",
                defaults.management_owner_split,
            )?,
            management_staking_split: amount(
                "FL_MANAGEMENT_STAKING_SPLIT",
                defaults.management_staking_split,
            )?,
            staking_pool: address("FL_STAKING_POOL", defaults.staking_pool)?,
            dao: address("FL_DAO", defaults.dao)?,
            investment_token: address("FL_INVESTMENT_TOKEN", defaults.investment_token)?,
        };
        config.management_split()?;
        Ok(config)
    }

    /// The management split these settings describe.
    ///
    /// # Errors
    ///
    /// `InvalidSplit` unless owner + 2 × staking equals one.
    pub fn management_split(&self) -> Result<ManagementSplit, ConfigError> {
        ManagementSplit::new(self.management_owner_split, self.management_staking_split)
            .map_err(ConfigError::InvalidSplit)
    }
}
