//! # Error Types
//!
//! Fee registration, per-fund configuration and settlement errors.

use fl_01_vault::{CustodyError, SwapError, VaultError};
use shared_types::{Address, ErrorKind, MathError};
use thiserror::Error;

/// Errors raised by fee modules and the fee manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeError {
    /// Caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Fee id unknown to the registry.
    #[error("fee is not registered: {0:?}")]
    NotRegistered(Address),

    /// Fee id registered twice.
    #[error("fee already registered: {0:?}")]
    AlreadyRegistered(Address),

    /// Empty fee list.
    #[error("fees cannot be empty")]
    EmptyFeeList,

    /// Same fee listed twice.
    #[error("fees cannot include duplicates")]
    DuplicateFees,

    /// Fee and settings lists differ in length.
    #[error("fees and settings array lengths unequal: {fees} fees, {settings} settings")]
    LengthMismatch {
        /// Number of fees.
        fees: usize,
        /// Number of settings payloads.
        settings: usize,
    },

    /// Settings payload rejected by the fee.
    #[error("{fee}: invalid settings: {reason}")]
    InvalidSettings {
        /// Fee identifier.
        fee: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// Stored state does not belong to the fee reading it.
    #[error("{0}: fund state has the wrong shape")]
    StateMismatch(&'static str),

    /// Fee is not enabled for the fund.
    #[error("fee not enabled for fund: {0:?}")]
    NotEnabled(Address),

    /// Referrer equals the referee.
    #[error("referrer and referee should not be same: {0:?}")]
    SelfReferral(Address),

    /// Gross asset value could not be computed.
    #[error("valuation failed: {message}")]
    Valuation {
        /// Classification of the oracle failure.
        kind: ErrorKind,
        /// Human readable reason.
        message: String,
    },

    /// Vault operation failed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Arithmetic failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl From<CustodyError> for FeeError {
    fn from(err: CustodyError) -> Self {
        Self::Vault(VaultError::Custody(err))
    }
}

impl From<SwapError> for FeeError {
    fn from(err: SwapError) -> Self {
        Self::Vault(VaultError::Swap(err))
    }
}

impl FeeError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotRegistered(_) => ErrorKind::UnknownExtensionOrFee,
            Self::AlreadyRegistered(_)
            | Self::EmptyFeeList
            | Self::DuplicateFees
            | Self::LengthMismatch { .. }
            | Self::InvalidSettings { .. }
            | Self::NotEnabled(_)
            | Self::SelfReferral(_) => ErrorKind::InvalidArgument,
            Self::StateMismatch(_) => ErrorKind::InvalidState,
            Self::Valuation { kind, .. } => *kind,
            Self::Vault(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }

    /// Whether the failure came from moving assets to a recipient. These
    /// are the failures a fee payout may recover from by minting shares.
    #[must_use]
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, Self::Vault(VaultError::Custody(_)))
    }
}
