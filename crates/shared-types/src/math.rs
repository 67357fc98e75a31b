//! # Fixed-Point Math
//!
//! Integer arithmetic for share and fee accounting. Every helper is checked:
//! overflow surfaces as [`MathError`] instead of wrapping.

use crate::errors::MathError;
use crate::primitives::{U256, U512};

/// One whole unit of an 18-decimal rate (100%).
pub const RATE_DIVISOR: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// One whole share (shares always carry 18 decimals).
pub const SHARE_UNIT: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// Scale of per-second compounding factors (1e27).
pub const RATE_SCALE: U256 = U256([11_515_845_246_265_065_472, 54_210_108, 0, 0]);

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// `a * b / denominator`, rounded down, with a 512-bit intermediate product.
///
/// # Errors
///
/// `DivisionByZero` when `denominator` is zero, `Overflow` when the quotient
/// does not fit into 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    narrow(quotient)
}

fn narrow(value: U512) -> Result<U256, MathError> {
    let U512(words) = value;
    if words[4..].iter().any(|w| *w != 0) {
        return Err(MathError::Overflow);
    }
    Ok(U256([words[0], words[1], words[2], words[3]]))
}

/// Checked addition.
///
/// # Errors
///
/// `Overflow` past `U256::MAX`.
pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked subtraction.
///
/// # Errors
///
/// `Underflow` when `b > a`.
pub fn sub(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

/// `10^decimals` as a `U256`.
#[must_use]
pub fn unit(decimals: u8) -> U256 {
    U256::exp10(usize::from(decimals))
}

/// Fixed-point exponentiation by squaring: `x^n` where `x` and the result are
/// scaled by `base`. Each multiplication rounds half up, matching the
/// well-known `rpow` routine used for compounding interest factors.
///
/// # Errors
///
/// `Overflow` when an intermediate product exceeds 256 bits.
pub fn rpow(mut x: U256, mut n: u64, base: U256) -> Result<U256, MathError> {
    if x.is_zero() {
        return Ok(if n == 0 { base } else { U256::zero() });
    }
    let half = base / 2;
    let mut z = if n % 2 == 1 { x } else { base };
    n /= 2;
    while n > 0 {
        let xx = x.checked_mul(x).ok_or(MathError::Overflow)?;
        x = add(xx, half)? / base;
        if n % 2 == 1 {
            let zx = z.checked_mul(x).ok_or(MathError::Overflow)?;
            z = add(zx, half)? / base;
        }
        n /= 2;
    }
    Ok(z)
}

/// Converts an annual management-fee rate (18 decimals, e.g. `1e16` for 1%)
/// into the per-second compounding factor expected by the management fee:
/// `(1 / (1 - rate))^(1 / SECONDS_PER_YEAR)`, scaled by [`RATE_SCALE`].
///
/// The factor is found by bisection over [`rpow`], so the result compounds
/// back to the target within rounding of a single unit.
///
/// # Errors
///
/// `Overflow` if `annual_rate >= RATE_DIVISOR` (the target is unbounded).
pub fn per_second_rate_from_annual(annual_rate: U256) -> Result<U256, MathError> {
    if annual_rate >= RATE_DIVISOR {
        return Err(MathError::Overflow);
    }
    if annual_rate.is_zero() {
        return Ok(RATE_SCALE);
    }
    let target = mul_div(RATE_SCALE, RATE_DIVISOR, RATE_DIVISOR - annual_rate)?;
    let mut low = RATE_SCALE;
    let mut high = RATE_SCALE * 2;
    while low < high {
        let mid = low + (high - low) / 2;
        let compounds_past_target = match rpow(mid, SECONDS_PER_YEAR, RATE_SCALE) {
            Ok(value) => value >= target,
            Err(MathError::Overflow) => true,
            Err(other) => return Err(other),
        };
        if compounds_past_target {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Ok(low)
}

/// Parses a decimal literal. Used by fixtures and configuration.
///
/// # Errors
///
/// `Overflow` when the literal is not a valid 256-bit decimal.
pub fn from_dec(literal: &str) -> Result<U256, MathError> {
    U256::from_dec_str(literal).map_err(|_| MathError::Overflow)
}

/// `whole * 10^18`, convenient for 18-decimal amounts.
#[must_use]
pub fn ether(whole: u64) -> U256 {
    U256::from(whole) * SHARE_UNIT
}
