//! # Domain
//!
//! Protocol-wide records: two-step ownership, the protocol configuration,
//! release state of a deployer generation and the module set a new fund
//! is configured with.

pub mod modules;
pub mod ownership;
pub mod protocol_config;
pub mod release;

pub use modules::FundModules;
pub use ownership::Ownership;
pub use protocol_config::{ParameterRange, ProtocolConfig};
pub use release::ReleaseState;
