//! Table-driven value interpreter: every asset has a price in a common
//! reference unit (18 decimals), its token decimals and an update time.

use crate::errors::ValuationError;
use crate::ports::ValueInterpreter;
use parking_lot::RwLock;
use shared_types::{math, Address, Clock, U256};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct PriceEntry {
    price: U256,
    decimals: u8,
    updated_at: u64,
}

/// In-memory [`ValueInterpreter`] with a staleness threshold.
pub struct PriceTableInterpreter {
    prices: RwLock<BTreeMap<Address, PriceEntry>>,
    clock: Arc<dyn Clock>,
    max_staleness: u64,
}

impl PriceTableInterpreter {
    /// Interpreter rejecting rates older than `max_staleness` seconds.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, max_staleness: u64) -> Self {
        Self {
            prices: RwLock::new(BTreeMap::new()),
            clock,
            max_staleness,
        }
    }

    /// Sets the reference price of one whole unit of `asset`, timestamped now.
    pub fn set_price(&self, asset: Address, price: U256, decimals: u8) {
        let updated_at = self.clock.now();
        self.prices.write().insert(
            asset,
            PriceEntry {
                price,
                decimals,
                updated_at,
            },
        );
    }

    /// Drops `asset` from the table.
    pub fn remove(&self, asset: Address) {
        self.prices.write().remove(&asset);
    }

    fn fresh(&self, asset: Address) -> Result<PriceEntry, ValuationError> {
        let entry = self
            .prices
            .read()
            .get(&asset)
            .copied()
            .ok_or(ValuationError::UnsupportedAsset(asset))?;
        let now = self.clock.now();
        if now.saturating_sub(entry.updated_at) > self.max_staleness {
            return Err(ValuationError::StaleRate {
                asset,
                updated_at: entry.updated_at,
                now,
            });
        }
        Ok(entry)
    }
}

impl ValueInterpreter for PriceTableInterpreter {
    fn value_in_terms(
        &self,
        asset: Address,
        amount: U256,
        quote: Address,
    ) -> Result<U256, ValuationError> {
        if asset == quote || amount.is_zero() {
            return Ok(amount);
        }
        let base = self.fresh(asset)?;
        let quote_entry = self.fresh(quote)?;
        // amount * price_a * 10^dq / (price_q * 10^da)
        let in_reference = math::mul_div(amount, base.price, math::unit(base.decimals))?;
        Ok(math::mul_div(
            in_reference,
            math::unit(quote_entry.decimals),
            quote_entry.price,
        )?)
    }

    fn is_supported_asset(&self, asset: Address) -> bool {
        self.prices.read().contains_key(&asset)
    }
}
