//! # Driven Ports (SPI - Outbound)
//!
//! The vault holds no tokens itself. Balances live behind [`AssetCustody`];
//! swaps are priced and executed by a [`SwapRouter`] whose liquidity also
//! sits in custody under the router's own address.

use crate::errors::{CustodyError, SwapError};
use shared_types::{Address, U256};

// =============================================================================
// ASSET CUSTODY
// =============================================================================

/// Token balances for every account the engine touches.
///
/// Implementations may be externally authored tokens: `transfer` is allowed
/// to fail and to call back into the engine.
pub trait AssetCustody: Send + Sync {
    /// Balance of `asset` held by `holder`.
    fn balance_of(&self, asset: Address, holder: Address) -> U256;

    /// Moves `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Any [`CustodyError`]; the implementation must not have moved funds
    /// when it returns an error.
    fn transfer(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), CustodyError>;

    /// Decimals of `asset`. Defaults to 18.
    fn decimals(&self, _asset: Address) -> u8 {
        18
    }
}

// =============================================================================
// SWAP ROUTER
// =============================================================================

/// Multi-hop swap pricing.
///
/// The vault transfers `amount_in` of `path[0]` to [`SwapRouter::address`]
/// before calling [`SwapRouter::swap`], then pulls the returned amount of the
/// last path asset from the router's custody balance.
pub trait SwapRouter: Send + Sync {
    /// Custody account holding the router's liquidity.
    fn address(&self) -> Address;

    /// Computes the output for `amount_in` along `path`.
    ///
    /// # Errors
    ///
    /// `SlippageExceeded` when the output is below `min_amount_out`,
    /// `DeadlineExpired` past `deadline`, `NoRoute` for unknown pairs.
    fn swap(
        &self,
        path: &[Address],
        amount_in: U256,
        min_amount_out: U256,
        deadline: u64,
    ) -> Result<U256, SwapError>;
}
