//! # Ports
//!
//! The policy plug-in seam.

pub mod outbound;

pub use outbound::Policy;
