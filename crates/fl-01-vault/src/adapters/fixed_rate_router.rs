//! Fixed-Rate Router Adapter
//!
//! Implements the `SwapRouter` port with a table of per-hop exchange rates.
//! Liquidity is whatever custody holds under the router's address.

use crate::errors::SwapError;
use crate::ports::SwapRouter;
use parking_lot::RwLock;
use shared_types::{math, Address, Clock, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Router quoting `amount * numerator / denominator` per hop.
pub struct FixedRateRouter {
    address: Address,
    clock: Arc<dyn Clock>,
    rates: RwLock<HashMap<(Address, Address), (U256, U256)>>,
}

impl FixedRateRouter {
    /// Router whose liquidity sits under `address`.
    pub fn new(address: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            address,
            clock,
            rates: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the `from -> to` rate. A zero denominator removes the pair.
    pub fn set_rate(&self, from: Address, to: Address, numerator: U256, denominator: U256) {
        let mut rates = self.rates.write();
        if denominator.is_zero() {
            rates.remove(&(from, to));
        } else {
            rates.insert((from, to), (numerator, denominator));
        }
    }

    /// Output of `amount_in` along `path` without executing anything.
    ///
    /// # Errors
    ///
    /// `InvalidPath` or `NoRoute`.
    pub fn quote(&self, path: &[Address], amount_in: U256) -> Result<U256, SwapError> {
        if path.len() < 2 {
            return Err(SwapError::InvalidPath(format!(
                "expected at least two hops, got {}",
                path.len()
            )));
        }
        let rates = self.rates.read();
        path.windows(2).try_fold(amount_in, |amount, hop| {
            let (from, to) = (hop[0], hop[1]);
            let (numerator, denominator) = rates
                .get(&(from, to))
                .copied()
                .ok_or(SwapError::NoRoute { from, to })?;
            Ok(math::mul_div(amount, numerator, denominator)?)
        })
    }
}

impl SwapRouter for FixedRateRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn swap(
        &self,
        path: &[Address],
        amount_in: U256,
        min_amount_out: U256,
        deadline: u64,
    ) -> Result<U256, SwapError> {
        let now = self.clock.now();
        if now > deadline {
            return Err(SwapError::DeadlineExpired { deadline, now });
        }
        let amount_out = self.quote(path, amount_in)?;
        if amount_out < min_amount_out {
            return Err(SwapError::SlippageExceeded {
                minimum: min_amount_out,
                actual: amount_out,
            });
        }
        debug!(hops = path.len(), %amount_in, %amount_out, "router swap");
        Ok(amount_out)
    }
}
