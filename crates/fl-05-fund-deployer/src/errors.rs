//! # Error Types
//!
//! Errors of the protocol controller, the fund deployer generations and the
//! dispatcher. Comptroller, fee, policy and vault failures are wrapped with
//! `#[from]` and keep their classification.

use fl_01_vault::VaultError;
use fl_02_fee_engine::FeeError;
use fl_03_policy_engine::PolicyError;
use fl_04_comptroller::ComptrollerError;
use shared_types::{Address, ErrorKind, MathError};
use thiserror::Error;

/// Errors returned by deployer-side entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeployerError {
    /// Caller lacks the required role.
    #[error("Only the {0} can call this function")]
    Unauthorized(&'static str),

    /// Caller is not allowed to act on this request.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Malformed input; the message names the offending argument.
    #[error("{0}")]
    InvalidArgument(&'static str),

    /// Owner-settable value already holds the requested value.
    #[error("{0}")]
    Unchanged(&'static str),

    /// The deployer generation does not accept new funds or migrations.
    #[error("Release is not Live")]
    ReleaseNotLive,

    /// Denomination asset not on the protocol's approved list.
    #[error("createNewFund: denomination asset is not approved")]
    DenominationNotApproved(Address),

    /// Fee or policy parameter outside the configured range.
    #[error("createNewFund: fee parameter value is not within the acceptable range")]
    ParameterOutOfRange {
        /// Fee or policy id.
        module: Address,
    },

    /// Fee without a protocol parameter configuration.
    #[error("createNewFund: Unknown fee")]
    UnknownFee(Address),

    /// No current fund deployer has been registered.
    #[error("createNewFund: Fund Deployer not set")]
    FundDeployerNotSet,

    /// Deployer generation unknown to the protocol.
    #[error("unknown fund deployer: {0:?}")]
    UnknownFundDeployer(Address),

    /// Vault unknown to the dispatcher.
    #[error("unknown vault: {0:?}")]
    UnknownVault(Address),

    /// Vault call registration failed.
    #[error("{0}")]
    VaultCallRegistry(&'static str),

    /// Migration state machine rejected the request.
    #[error("{0}")]
    Migration(&'static str),

    /// The migration timelock is still running.
    #[error("executeMigration: The migration timelock has not elapsed ({remaining} seconds remaining)")]
    TimelockNotElapsed {
        /// Seconds until the request is executable.
        remaining: u64,
    },

    /// Blocking task was cancelled or panicked.
    #[error("fund task failed: {0}")]
    TaskFailed(String),

    /// Comptroller failure.
    #[error(transparent)]
    Comptroller(#[from] ComptrollerError),

    /// Fee failure.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Policy failure.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Vault failure.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Arithmetic failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl DeployerError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorKind::Unauthorized,
            Self::InvalidArgument(_)
            | Self::Unchanged(_)
            | Self::DenominationNotApproved(_)
            | Self::VaultCallRegistry(_) => ErrorKind::InvalidArgument,
            Self::ReleaseNotLive
            | Self::FundDeployerNotSet
            | Self::UnknownFundDeployer(_)
            | Self::UnknownVault(_)
            | Self::Migration(_)
            | Self::TimelockNotElapsed { .. }
            | Self::TaskFailed(_) => ErrorKind::InvalidState,
            Self::ParameterOutOfRange { .. } => ErrorKind::FeeParameterOutOfRange,
            Self::UnknownFee(_) => ErrorKind::UnknownExtensionOrFee,
            Self::Comptroller(err) => err.kind(),
            Self::Fee(err) => err.kind(),
            Self::Policy(err) => err.kind(),
            Self::Vault(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }
}

/// Errors reading [`EngineConfig`](crate::config::EngineConfig) from the
/// environment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Variable holds something other than an unsigned integer.
    #[error("{key}: expected an unsigned integer, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// Variable holds something other than a hex address.
    #[error("{key}: invalid address: {source}")]
    InvalidAddress {
        /// Variable name.
        key: &'static str,
        /// Decoding failure.
        source: hex::FromHexError,
    },

    /// Management split does not add up.
    #[error("management split: {0}")]
    InvalidSplit(FeeError),
}
