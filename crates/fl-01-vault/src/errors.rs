//! # Error Types
//!
//! Errors raised by the share ledger, the asset vault and the two ports the
//! vault drives (custody and swap router).

use shared_types::{Address, ErrorKind, MathError, U256};
use thiserror::Error;

// =============================================================================
// CUSTODY ERRORS
// =============================================================================

/// Errors from an [`AssetCustody`](crate::ports::AssetCustody) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// The sender does not hold enough of the asset.
    #[error("insufficient {asset:?} held by {holder:?}: required {required}, available {available}")]
    InsufficientBalance {
        /// Asset being moved.
        asset: Address,
        /// Account debited.
        holder: Address,
        /// Requested amount.
        required: U256,
        /// Current balance.
        available: U256,
    },

    /// The asset currently refuses all transfers.
    #[error("transfers of {0:?} are paused")]
    TransfersPaused(Address),

    /// The recipient refused to receive the asset.
    #[error("recipient {0:?} rejected the transfer")]
    RecipientRejected(Address),

    /// An externally authored token hook failed. Carries the original
    /// classification so a reentrant rejection stays recognisable.
    #[error("token callback failed: {message}")]
    Callback {
        /// Classification of the underlying failure.
        kind: ErrorKind,
        /// Human readable reason.
        message: String,
    },
}

impl CustodyError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::TransfersPaused(_) | Self::RecipientRejected(_) => ErrorKind::InvalidState,
            Self::Callback { kind, .. } => *kind,
        }
    }
}

// =============================================================================
// SWAP ERRORS
// =============================================================================

/// Errors from a [`SwapRouter`](crate::ports::SwapRouter).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    /// Output below the caller's minimum.
    #[error("slippage exceeded: received {actual}, minimum {minimum}")]
    SlippageExceeded {
        /// Caller's minimum.
        minimum: U256,
        /// Router output.
        actual: U256,
    },

    /// The swap deadline has passed.
    #[error("swap deadline {deadline} expired at {now}")]
    DeadlineExpired {
        /// Caller's deadline.
        deadline: u64,
        /// Time of the attempt.
        now: u64,
    },

    /// Path shorter than two hops or otherwise malformed.
    #[error("invalid swap path: {0}")]
    InvalidPath(String),

    /// No liquidity between two assets.
    #[error("no route from {from:?} to {to:?}")]
    NoRoute {
        /// Source asset of the hop.
        from: Address,
        /// Destination asset of the hop.
        to: Address,
    },

    /// Custody movement into or out of the router failed.
    #[error("router custody failure: {0}")]
    Custody(#[from] CustodyError),

    /// Arithmetic failure while pricing.
    #[error("router math error: {0}")]
    Math(#[from] MathError),
}

impl SwapError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SlippageExceeded { .. } => ErrorKind::SlippageExceeded,
            Self::DeadlineExpired { .. } => ErrorKind::InvalidState,
            Self::InvalidPath(_) => ErrorKind::InvalidArgument,
            Self::NoRoute { .. } => ErrorKind::UnsupportedAsset,
            Self::Custody(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }
}

// =============================================================================
// VAULT ERRORS
// =============================================================================

/// Errors from vault operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Caller lacks the capability required by the operation.
    #[error("unauthorized: {caller:?} is not the vault {role}")]
    Unauthorized {
        /// Rejected caller.
        caller: Address,
        /// Capability that was required.
        role: &'static str,
    },

    /// Holder-initiated share transfers are not supported.
    #[error("share transfers are disabled")]
    TransfersDisabled,

    /// Burn or move beyond the holder's balance.
    #[error("insufficient shares for {holder:?}: required {required}, available {available}")]
    InsufficientShares {
        /// Holder being debited.
        holder: Address,
        /// Requested amount.
        required: U256,
        /// Current balance.
        available: U256,
    },

    /// Tracked asset still holds a balance.
    #[error("cannot untrack {asset:?}: balance {balance} is not zero")]
    NonZeroBalance {
        /// Asset that was to be removed.
        asset: Address,
        /// Remaining custody balance.
        balance: U256,
    },

    /// The denomination asset is always tracked.
    #[error("denomination asset {0:?} cannot be untracked")]
    DenominationAssetRequired(Address),

    /// The value is already set.
    #[error("{0} is already set to that value")]
    Unchanged(&'static str),

    /// Malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Spender allowance too small.
    #[error("allowance of {spender:?} for {asset:?} is {allowance}, requested {requested}")]
    AllowanceExceeded {
        /// Asset being pulled.
        asset: Address,
        /// Spender pulling it.
        spender: Address,
        /// Remaining allowance.
        allowance: U256,
        /// Requested amount.
        requested: U256,
    },

    /// Custody movement failed.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// Router failed.
    #[error(transparent)]
    Swap(#[from] SwapError),

    /// Arithmetic failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl VaultError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::TransfersDisabled => ErrorKind::Unauthorized,
            Self::InsufficientShares { .. } => ErrorKind::InsufficientShares,
            Self::NonZeroBalance { .. } => ErrorKind::InvalidState,
            Self::AllowanceExceeded { .. } => ErrorKind::InsufficientBalance,
            Self::DenominationAssetRequired(_)
            | Self::Unchanged(_)
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Custody(err) => err.kind(),
            Self::Swap(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_kinds_are_preserved() {
        let err = VaultError::from(SwapError::from(CustodyError::Callback {
            kind: ErrorKind::InvalidState,
            message: "re-entrance".into(),
        }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("re-entrance"));
    }

    #[test]
    fn test_balance_errors() {
        let err = VaultError::NonZeroBalance {
            asset: Address::repeat_byte(1),
            balance: U256::one(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
