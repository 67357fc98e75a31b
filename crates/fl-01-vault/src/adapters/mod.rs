//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the custody and router ports.

mod fixed_rate_router;
mod memory_custody;

pub use fixed_rate_router::FixedRateRouter;
pub use memory_custody::{InMemoryCustody, TransferHook};
