//! # Ports
//!
//! Collaborators the comptroller drives.

pub mod outbound;

pub use outbound::{
    AssetsForMethod, ContractCaller, DeployerRegistry, IntegrationAdapter, ValueInterpreter,
};
