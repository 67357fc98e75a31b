//! # Domain Module
//!
//! The persisted fund record, comptroller records, migration requests and
//! the per-fund lock.

pub mod comptroller;
pub mod fund_cell;
pub mod fund_state;
pub mod migration;

pub use comptroller::{ComptrollerRecord, ComptrollerStatus, ReleaseStatus};
pub use fund_cell::{EntryGuard, FundCell};
pub use fund_state::{FundState, FUND_STATE_SCHEMA_VERSION};
pub use migration::MigrationRequest;
