//! # Shared Types Crate
//!
//! Primitives every FundLedger crate builds on.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, amounts and the error taxonomy are
//!   defined once here and re-used by the vault, fee, policy, comptroller and
//!   deployer crates.
//! - **Deterministic Math**: all monetary arithmetic is integer fixed point on
//!   `U256` with `U512` intermediates. Nothing here touches floating point.
//! - **Injected Time**: the [`Clock`] port is the only source of "now".
//!
//! ## Fixed-Point Scales
//!
//! | Constant | Value | Used for |
//! |----------|-------|----------|
//! | [`math::RATE_DIVISOR`] | 1e18 | fee rates, splits |
//! | [`math::SHARE_UNIT`] | 1e18 | one whole share |
//! | [`math::RATE_SCALE`] | 1e27 | per-second compounding factors |

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod errors;
pub mod math;
pub mod primitives;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ErrorKind, MathError};
pub use primitives::{has_duplicates, Address, Selector, U256};
