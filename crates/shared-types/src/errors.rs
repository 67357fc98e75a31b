//! # Error Types
//!
//! The error-kind taxonomy every crate classifies its errors into, and the
//! arithmetic error shared by the fixed-point helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR KINDS
// =============================================================================

/// Coarse classification of every failure the engine can report.
///
/// Each crate keeps its own detailed `thiserror` enum and maps every variant
/// onto one of these kinds through a `kind()` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Capability or ownership check failed.
    Unauthorized,
    /// Paused, wrong lifecycle phase, wrong migration phase, reentrant call.
    InvalidState,
    /// Zero, duplicate, out-of-range or mismatched-length input.
    InvalidArgument,
    /// An asset balance is too small for the requested movement.
    InsufficientBalance,
    /// A share balance is too small for the requested movement.
    InsufficientShares,
    /// A policy rule evaluated to false.
    PolicyViolation,
    /// A fee or policy parameter lies outside its configured range.
    FeeParameterOutOfRange,
    /// The extension, fee or policy is not registered.
    UnknownExtensionOrFee,
    /// A swap or purchase produced less than the caller's minimum.
    SlippageExceeded,
    /// The oracle's rate is older than its staleness threshold.
    StaleRate,
    /// The oracle cannot price the asset.
    UnsupportedAsset,
    /// Fixed-point overflow or division by zero.
    Arithmetic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidState => "invalid state",
            Self::InvalidArgument => "invalid argument",
            Self::InsufficientBalance => "insufficient balance",
            Self::InsufficientShares => "insufficient shares",
            Self::PolicyViolation => "policy violation",
            Self::FeeParameterOutOfRange => "fee parameter out of range",
            Self::UnknownExtensionOrFee => "unknown extension or fee",
            Self::SlippageExceeded => "slippage exceeded",
            Self::StaleRate => "stale rate",
            Self::UnsupportedAsset => "unsupported asset",
            Self::Arithmetic => "arithmetic",
        };
        f.write_str(name)
    }
}

// =============================================================================
// MATH ERRORS
// =============================================================================

/// Errors from fixed-point arithmetic.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Result does not fit into 256 bits.
    #[error("arithmetic overflow")]
    Overflow,

    /// Subtraction below zero.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
}

impl MathError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Arithmetic
    }
}
