//! # Driven Ports (SPI - Outbound)
//!
//! | Port | Used for |
//! |------|----------|
//! | [`ValueInterpreter`] | GAV, incoming-asset support checks |
//! | [`IntegrationAdapter`] | trades through `callOnIntegration` |
//! | [`ContractCaller`] | registered vault calls |
//! | [`DeployerRegistry`] | release status and the vault-call allow list |

use crate::domain::ReleaseStatus;
use crate::errors::{IntegrationError, ValuationError};
use fl_01_vault::CustodyTx;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Selector, U256};

// =============================================================================
// VALUATION
// =============================================================================

/// Converts asset amounts into a quote asset.
pub trait ValueInterpreter: Send + Sync {
    /// Value of `amount` of `asset` in `quote`.
    ///
    /// # Errors
    ///
    /// `UnsupportedAsset` or `StaleRate`.
    fn value_in_terms(
        &self,
        asset: Address,
        amount: U256,
        quote: Address,
    ) -> Result<U256, ValuationError>;

    /// Whether `asset` can be priced at all.
    fn is_supported_asset(&self, asset: Address) -> bool;
}

// =============================================================================
// INTEGRATIONS
// =============================================================================

/// Assets an adapter method spends and receives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsForMethod {
    /// Spend assets and the maximum of each the adapter may pull.
    pub spend_assets: Vec<(Address, U256)>,
    /// Incoming assets and the minimum of each the vault must receive.
    pub incoming_assets: Vec<(Address, U256)>,
}

/// A trading venue the fund can reach through the integration manager.
///
/// Before [`IntegrationAdapter::take_order`] the manager moves the maximum
/// spend amounts to [`IntegrationAdapter::address`]; the adapter must send
/// incoming assets and any unspent remainder back to the vault.
pub trait IntegrationAdapter: Send + Sync {
    /// Registry id and custody account.
    fn address(&self) -> Address;

    /// Stable human readable identifier.
    fn identifier(&self) -> &'static str;

    /// Decodes the spend and incoming assets of a call.
    ///
    /// # Errors
    ///
    /// `InvalidSelector` or `InvalidArguments`.
    fn parse_assets_for_method(
        &self,
        selector: Selector,
        args: &[u8],
    ) -> Result<AssetsForMethod, IntegrationError>;

    /// Executes the trade.
    ///
    /// # Errors
    ///
    /// Any adapter failure; the whole call is rolled back.
    fn take_order(
        &self,
        custody: &mut CustodyTx<'_>,
        vault: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<(), IntegrationError>;
}

// =============================================================================
// EXTERNAL CALLS
// =============================================================================

/// Executes registered calls on behalf of a vault.
pub trait ContractCaller: Send + Sync {
    /// Calls `target` with `selector` and `args` as `vault`.
    ///
    /// # Errors
    ///
    /// A message describing the failure.
    fn call(
        &self,
        vault: Address,
        target: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<Vec<u8>, String>;
}

// =============================================================================
// DEPLOYER VIEW
// =============================================================================

/// What a comptroller needs to know about the deployer generation that
/// created it.
pub trait DeployerRegistry: Send + Sync {
    /// Release status of `fund_deployer`. Unknown deployers report `Paused`.
    fn release_status(&self, fund_deployer: Address) -> ReleaseStatus;

    /// Whether `fund_deployer` allows vaults to call `target` with `selector`.
    fn is_registered_vault_call(
        &self,
        fund_deployer: Address,
        target: Address,
        selector: Selector,
    ) -> bool;

    /// Inclusive `(min, max)` bounds for each parameter of `module`, if the
    /// protocol configured any.
    fn parameter_ranges(&self, _module: Address) -> Option<(Vec<U256>, Vec<U256>)> {
        None
    }
}
