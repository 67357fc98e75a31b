//! # Ports
//!
//! Outbound interfaces the vault depends on.

pub mod outbound;

pub use outbound::{AssetCustody, SwapRouter};
