//! # Adapters
//!
//! In-memory implementations of the comptroller ports.

pub mod price_table;
pub mod recording_caller;
pub mod router_adapter;
pub mod static_registry;

pub use price_table::PriceTableInterpreter;
pub use recording_caller::{RecordedCall, RecordingContractCaller};
pub use router_adapter::{RouterAdapter, TakeOrderArgs, TAKE_ORDER};
pub use static_registry::StaticDeployerRegistry;
