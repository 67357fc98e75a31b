//! # Error Types
//!
//! Comptroller, integration and valuation errors. Lower-layer errors
//! (vault, fees, policies) are wrapped with `#[from]` and keep their
//! classification.

use crate::domain::ComptrollerStatus;
use fl_01_vault::{CustodyError, SwapError, VaultError};
use fl_02_fee_engine::FeeError;
use fl_03_policy_engine::PolicyError;
use shared_types::{Address, ErrorKind, MathError, Selector, U256};
use thiserror::Error;

// =============================================================================
// VALUATION ERRORS
// =============================================================================

/// Errors from a [`ValueInterpreter`](crate::ports::ValueInterpreter).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValuationError {
    /// No price source for the asset.
    #[error("unsupported asset: {0:?}")]
    UnsupportedAsset(Address),

    /// Price source is older than its staleness threshold.
    #[error("stale rate for {asset:?}: updated at {updated_at}, now {now}")]
    StaleRate {
        /// Asset being priced.
        asset: Address,
        /// Last update time.
        updated_at: u64,
        /// Evaluation time.
        now: u64,
    },

    /// Arithmetic failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl ValuationError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedAsset(_) => ErrorKind::UnsupportedAsset,
            Self::StaleRate { .. } => ErrorKind::StaleRate,
            Self::Math(err) => err.kind(),
        }
    }
}

impl From<ValuationError> for FeeError {
    fn from(err: ValuationError) -> Self {
        FeeError::Valuation {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// INTEGRATION ERRORS
// =============================================================================

/// Errors from the integration manager and its adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    /// Adapter id unknown to the registry.
    #[error("adapter is not registered: {0:?}")]
    AdapterNotRegistered(Address),

    /// Adapter id registered twice.
    #[error("adapter already registered: {0:?}")]
    AdapterAlreadyRegistered(Address),

    /// Empty adapter list.
    #[error("adapters cannot be empty")]
    EmptyAdapterList,

    /// Adapter does not implement the selector.
    #[error("invalid selector: {0:02x?}")]
    InvalidSelector(Selector),

    /// Adapter arguments could not be decoded.
    #[error("invalid adapter arguments: {0}")]
    InvalidArguments(String),

    /// Asset lists violate the call rules.
    #[error("invalid asset list: {0}")]
    InvalidAssets(&'static str),

    /// Incoming asset the value interpreter cannot price.
    #[error("non-receivable incoming asset: {0:?}")]
    UnsupportedIncomingAsset(Address),

    /// Trade would dip into the investment-fee locked balance.
    #[error("spend of {asset:?} exceeds spendable balance: spend {spend}, spendable {spendable}")]
    LockedBalance {
        /// Spend asset.
        asset: Address,
        /// Maximum spend requested.
        spend: U256,
        /// Balance minus the locked amount.
        spendable: U256,
    },

    /// Post-trade receipt below the declared minimum.
    #[error("received incoming asset less than expected: {asset:?} expected {expected}, received {received}")]
    ReceivedLessThanExpected {
        /// Incoming asset.
        asset: Address,
        /// Declared minimum.
        expected: U256,
        /// Amount received.
        received: U256,
    },

    /// Post-trade spend above the declared maximum.
    #[error("spent amount greater than expected: {asset:?} max {max}, spent {spent}")]
    SpentMoreThanExpected {
        /// Spend asset.
        asset: Address,
        /// Declared maximum.
        max: U256,
        /// Amount spent.
        spent: U256,
    },

    /// Asset passed to `add_tracked_assets` is empty or unpriceable.
    #[error("cannot track {0:?}: unsupported or zero balance")]
    CannotTrack(Address),

    /// Vault rejected an approval or tracked-asset change.
    #[error(transparent)]
    Vault(#[from] VaultError),

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

impl IntegrationError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AdapterNotRegistered(_) => ErrorKind::UnknownExtensionOrFee,
            Self::AdapterAlreadyRegistered(_)
            | Self::EmptyAdapterList
            | Self::InvalidSelector(_)
            | Self::InvalidArguments(_)
            | Self::InvalidAssets(_)
            | Self::CannotTrack(_) => ErrorKind::InvalidArgument,
            Self::UnsupportedIncomingAsset(_) => ErrorKind::UnsupportedAsset,
            Self::LockedBalance { .. } => ErrorKind::InsufficientBalance,
            Self::ReceivedLessThanExpected { .. } => ErrorKind::SlippageExceeded,
            Self::SpentMoreThanExpected { .. } => ErrorKind::InvalidState,
            Self::Vault(err) => err.kind(),
            Self::Custody(err) => err.kind(),
            Self::Swap(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }
}

// =============================================================================
// COMPTROLLER ERRORS
// =============================================================================

/// Errors returned by comptroller entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComptrollerError {
    /// The same thread re-entered a fund that is mid-call.
    #[error("re-entrance")]
    Reentrance,

    /// Fund deployer is paused and the owner has not overridden it.
    #[error("fund is paused")]
    FundPaused,

    /// Comptroller is not in the required lifecycle state.
    #[error("comptroller {comptroller:?} is {status:?}")]
    NotActive {
        /// Comptroller id.
        comptroller: Address,
        /// Current status.
        status: ComptrollerStatus,
    },

    /// Comptroller id unknown to the fund.
    #[error("unknown comptroller: {0:?}")]
    UnknownComptroller(Address),

    /// Caller lacks the required role.
    #[error("unauthorized: only the {0} can call this function")]
    Unauthorized(&'static str),

    /// Malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A migration request is outstanding for the fund.
    #[error("fund has a pending migration")]
    MigrationPending,

    /// The redeemer acted too recently.
    #[error("shares action timelocked: {remaining} seconds remaining")]
    SharesActionTimelocked {
        /// Seconds until the timelock lapses.
        remaining: u64,
    },

    /// Redemption beyond the holder's balance.
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares {
        /// Requested quantity.
        requested: U256,
        /// Current balance.
        held: U256,
    },

    /// Every payout asset would pay zero.
    #[error("no payout assets")]
    NoPayoutAssets,

    /// Fewer shares received than the buyer's minimum.
    #[error("shares received {received} below minimum {minimum}")]
    SlippageExceeded {
        /// Buyer's minimum.
        minimum: U256,
        /// Shares received.
        received: U256,
    },

    /// Module parameter outside the protocol's configured range.
    #[error("parameter {index} of {module:?} out of range: {value}")]
    ParameterOutOfRange {
        /// Fee or policy id.
        module: Address,
        /// Position in the module's parameter list.
        index: usize,
        /// Offending value.
        value: U256,
    },

    /// Extension is neither the fee manager nor the integration manager.
    #[error("invalid extension: {0:?}")]
    InvalidExtension(Address),

    /// Action id unknown to the extension.
    #[error("invalid action id: {0}")]
    InvalidActionId(u32),

    /// Vault call not allowed by the fund deployer.
    #[error("unregistered vault call: {target:?} {selector:02x?}")]
    UnregisteredCall {
        /// Contract called.
        target: Address,
        /// Function selector.
        selector: Selector,
    },

    /// External contract call failed.
    #[error("contract call failed: {0}")]
    CallFailed(String),

    /// Fund record could not be decoded or upgraded.
    #[error("fund state schema error: {0}")]
    Schema(String),

    /// Vault failure.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Fee failure.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Policy failure.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Integration failure.
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    /// Valuation failure.
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    /// Arithmetic failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl From<CustodyError> for ComptrollerError {
    fn from(err: CustodyError) -> Self {
        Self::Vault(VaultError::Custody(err))
    }
}

impl ComptrollerError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Reentrance
            | Self::FundPaused
            | Self::NotActive { .. }
            | Self::UnknownComptroller(_)
            | Self::MigrationPending
            | Self::SharesActionTimelocked { .. }
            | Self::NoPayoutAssets
            | Self::CallFailed(_)
            | Self::Schema(_) => ErrorKind::InvalidState,
            Self::Unauthorized(_) | Self::UnregisteredCall { .. } => ErrorKind::Unauthorized,
            Self::InvalidArgument(_) | Self::InvalidActionId(_) => ErrorKind::InvalidArgument,
            Self::InsufficientShares { .. } => ErrorKind::InsufficientShares,
            Self::SlippageExceeded { .. } => ErrorKind::SlippageExceeded,
            Self::ParameterOutOfRange { .. } => ErrorKind::FeeParameterOutOfRange,
            Self::InvalidExtension(_) => ErrorKind::UnknownExtensionOrFee,
            Self::Vault(err) => err.kind(),
            Self::Fee(err) => err.kind(),
            Self::Policy(err) => err.kind(),
            Self::Integration(err) => err.kind(),
            Self::Valuation(err) => err.kind(),
            Self::Math(err) => err.kind(),
        }
    }

    /// Converts into the error a token callback reports, so a rejected
    /// re-entrant call keeps its classification across the custody port.
    #[must_use]
    pub fn into_callback_error(self) -> CustodyError {
        CustodyError::Callback {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}
