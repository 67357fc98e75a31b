//! # Valuation
//!
//! Gross asset value and gross share value of a vault.
//!
//! ```text
//! GAV = Σ value_in_terms(asset, balance(asset), denomination)   over tracked assets
//! GSV = GAV × 1e18 / total supply          (one denomination unit when supply = 0)
//! ```
//!
//! Balances are custody balances, so investment-fee locked tokens count
//! towards GAV.

use crate::errors::ValuationError;
use crate::ports::ValueInterpreter;
use fl_01_vault::{CustodyTx, VaultState};
use fl_02_fee_engine::{FeeError, GavSource};
use shared_types::{math, U256};

/// [`GavSource`] backed by a [`ValueInterpreter`].
pub struct InterpreterGav<'a> {
    interpreter: &'a dyn ValueInterpreter,
}

impl<'a> InterpreterGav<'a> {
    /// Wraps `interpreter`.
    #[must_use]
    pub fn new(interpreter: &'a dyn ValueInterpreter) -> Self {
        Self { interpreter }
    }
}

impl GavSource for InterpreterGav<'_> {
    fn calc_gav(&self, vault: &VaultState, custody: &CustodyTx<'_>) -> Result<U256, FeeError> {
        Ok(calc_gav(self.interpreter, vault, custody)?)
    }
}

/// Gross asset value of `vault` in its denomination asset.
///
/// # Errors
///
/// `UnsupportedAsset` or `StaleRate` for any tracked asset with a balance.
pub fn calc_gav(
    interpreter: &dyn ValueInterpreter,
    vault: &VaultState,
    custody: &CustodyTx<'_>,
) -> Result<U256, ValuationError> {
    let denomination = vault.denomination_asset();
    vault
        .tracked_balances(custody)
        .into_iter()
        .filter(|(_, balance)| !balance.is_zero())
        .try_fold(U256::zero(), |gav, (asset, balance)| {
            let value = if asset == denomination {
                balance
            } else {
                interpreter.value_in_terms(asset, balance, denomination)?
            };
            Ok(math::add(gav, value)?)
        })
}

/// Value of one whole share in the denomination asset.
///
/// # Errors
///
/// Valuation or arithmetic failures.
pub fn calc_gross_share_value(
    interpreter: &dyn ValueInterpreter,
    vault: &VaultState,
    custody: &CustodyTx<'_>,
) -> Result<U256, ValuationError> {
    let supply = vault.total_supply();
    if supply.is_zero() {
        return Ok(math::unit(custody.decimals(vault.denomination_asset())));
    }
    let gav = calc_gav(interpreter, vault, custody)?;
    Ok(math::mul_div(gav, math::SHARE_UNIT, supply)?)
}
