//! # Ports
//!
//! The fee module plug-in seam and the collaborators fees consult.

pub mod outbound;

pub use outbound::{Fee, GavSource, StakingOracle};
