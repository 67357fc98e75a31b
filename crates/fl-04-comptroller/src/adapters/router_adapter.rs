//! Integration adapter that trades through a [`SwapRouter`].

use crate::errors::IntegrationError;
use crate::ports::{AssetsForMethod, IntegrationAdapter};
use fl_01_vault::{CustodyTx, SwapRouter};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Selector, U256};
use std::sync::Arc;
use tracing::debug;

/// Selector of the only method the adapter implements.
pub const TAKE_ORDER: Selector = [0x03, 0xe3, 0x8a, 0x2b];

/// Arguments of [`TAKE_ORDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeOrderArgs {
    /// Swap path; first hop is spent, last hop is received.
    pub path: Vec<Address>,
    /// Amount of `path[0]` to sell.
    pub outgoing_amount: U256,
    /// Minimum amount of the last hop to receive.
    pub min_incoming_amount: U256,
    /// Router deadline.
    pub deadline: u64,
}

impl TakeOrderArgs {
    fn decode(args: &[u8]) -> Result<Self, IntegrationError> {
        let decoded: Self = serde_json::from_slice(args)
            .map_err(|err| IntegrationError::InvalidArguments(err.to_string()))?;
        if decoded.path.len() < 2 {
            return Err(IntegrationError::InvalidArguments(
                "path needs at least two assets".into(),
            ));
        }
        Ok(decoded)
    }

    /// Encodes the arguments.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, IntegrationError> {
        serde_json::to_vec(self).map_err(|err| IntegrationError::InvalidArguments(err.to_string()))
    }
}

/// Swap adapter backed by a router.
pub struct RouterAdapter {
    address: Address,
    router: Arc<dyn SwapRouter>,
}

impl RouterAdapter {
    /// Adapter with custody account `address`.
    #[must_use]
    pub fn new(address: Address, router: Arc<dyn SwapRouter>) -> Self {
        Self { address, router }
    }
}

impl IntegrationAdapter for RouterAdapter {
    fn address(&self) -> Address {
        self.address
    }

    fn identifier(&self) -> &'static str {
        "ROUTER_SWAP"
    }

    fn parse_assets_for_method(
        &self,
        selector: Selector,
        args: &[u8],
    ) -> Result<AssetsForMethod, IntegrationError> {
        if selector != TAKE_ORDER {
            return Err(IntegrationError::InvalidSelector(selector));
        }
        let args = TakeOrderArgs::decode(args)?;
        let (Some(outgoing), Some(incoming)) = (args.path.first(), args.path.last()) else {
            return Err(IntegrationError::InvalidArguments("empty path".into()));
        };
        Ok(AssetsForMethod {
            spend_assets: vec![(*outgoing, args.outgoing_amount)],
            incoming_assets: vec![(*incoming, args.min_incoming_amount)],
        })
    }

    fn take_order(
        &self,
        custody: &mut CustodyTx<'_>,
        vault: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<(), IntegrationError> {
        if selector != TAKE_ORDER {
            return Err(IntegrationError::InvalidSelector(selector));
        }
        let args = TakeOrderArgs::decode(args)?;
        let (Some(outgoing), Some(incoming)) = (args.path.first(), args.path.last()) else {
            return Err(IntegrationError::InvalidArguments("empty path".into()));
        };
        let router = self.router.address();

        custody.transfer(*outgoing, self.address, router, args.outgoing_amount)?;
        let received = self.router.swap(
            &args.path,
            args.outgoing_amount,
            args.min_incoming_amount,
            args.deadline,
        )?;
        custody.transfer(*incoming, router, vault, received)?;

        let leftover = custody.balance_of(*outgoing, self.address);
        custody.transfer(*outgoing, self.address, vault, leftover)?;
        debug!(%received, ?incoming, "Router adapter order filled");
        Ok(())
    }
}
