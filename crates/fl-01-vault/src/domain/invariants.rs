//! # Domain Invariants
//!
//! Rules that hold after every committed vault call.

use super::vault::VaultState;
use crate::errors::VaultError;
use shared_types::{has_duplicates, U256};

/// Invariant: holder balances sum to the total supply.
#[must_use]
pub fn invariant_supply_matches_balances(vault: &VaultState) -> bool {
    let sum = vault
        .shares()
        .holders()
        .try_fold(U256::zero(), |acc, (_, amount)| acc.checked_add(amount));
    sum == Some(vault.total_supply())
}

/// Invariant: the denomination asset is tracked, first, and no asset is
/// tracked twice.
///
/// # Errors
///
/// `InvalidArgument` describing the violated rule.
pub fn invariant_tracked_assets(vault: &VaultState) -> Result<(), VaultError> {
    let tracked = vault.tracked_assets();
    if tracked.first() != Some(&vault.denomination_asset()) {
        return Err(VaultError::InvalidArgument(
            "denomination asset must be tracked first".into(),
        ));
    }
    if has_duplicates(tracked) {
        return Err(VaultError::InvalidArgument(
            "tracked assets contain duplicates".into(),
        ));
    }
    Ok(())
}
