//! # Domain Module
//!
//! Share ledger, vault record and the custody journal.

pub mod custody_tx;
pub mod invariants;
pub mod share_ledger;
pub mod vault;

pub use custody_tx::{CustodyTx, Savepoint, TransferRecord};
pub use invariants::{invariant_supply_matches_balances, invariant_tracked_assets};
pub use share_ledger::ShareLedger;
pub use vault::{SwapOrder, VaultState};
