//! # Vault Subsystem
//!
//! **Component ID:** 1  
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! Holds the per-fund record that the comptroller drives: the share ledger,
//! the tracked asset list, spender allowances and the role addresses. Token
//! balances themselves live behind the [`AssetCustody`](ports::AssetCustody)
//! port; the vault only ever moves them through a [`CustodyTx`] so that a
//! failed call can be unwound.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Balances sum to total supply | `ShareLedger::{mint, burn, transfer}` |
//! | Denomination asset always tracked | `VaultState::remove_tracked_asset` |
//! | No asset tracked twice | `VaultState::add_tracked_asset` |
//! | Only the accessor mutates | `VaultState::ensure_accessor` |
//! | Holders cannot transfer shares | `VaultState::transfer` |
//!
//! ## Atomicity
//!
//! ```text
//! CustodyTx::new ──transfer──→ journal ──commit──→ kept
//!                                  │
//!                                  └── drop / rollback_to ──→ reversed
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryCustody, FixedRateRouter               │
//! └─────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - AssetCustody, SwapRouter               │
//! └─────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────┐
//! │  domain/share_ledger.rs - ShareLedger                       │
//! │  domain/vault.rs        - VaultState, SwapOrder             │
//! │  domain/custody_tx.rs   - CustodyTx, Savepoint              │
//! │  domain/invariants.rs   - post-condition checks             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;

pub use adapters::{FixedRateRouter, InMemoryCustody, TransferHook};
pub use domain::{
    invariant_supply_matches_balances, invariant_tracked_assets, CustodyTx, Savepoint,
    ShareLedger, SwapOrder, TransferRecord, VaultState,
};
pub use errors::{CustodyError, SwapError, VaultError};
pub use events::VaultEffect;
pub use ports::{AssetCustody, SwapRouter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::domain::{CustodyTx, SwapOrder, VaultState};
    pub use crate::errors::{CustodyError, SwapError, VaultError};
    pub use crate::events::VaultEffect;
    pub use crate::ports::{AssetCustody, SwapRouter};
}
