//! # FundLedger Test Suite
//!
//! Cross-crate scenarios run against a fully wired engine.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs           # Wired engine over in-memory ports
//! │   └── integration/
//! │       ├── fee_flows.rs      # Management and investment fees end to end
//! │       ├── policy_flows.rs   # Whitelist and min/max investment
//! │       ├── migration.rs      # Release upgrades keep fund state intact
//! │       ├── atomicity.rs      # Rollback and re-entrance
//! │       ├── concurrency.rs    # Parallel callers through FundService
//! │       └── invariants.rs     # Property tests over random share activity
//! └── benches/
//!     └── fund_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fl-tests
//!
//! # By category
//! cargo test -p fl-tests integration::migration::
//! cargo test -p fl-tests integration::invariants::
//!
//! # Benchmarks
//! cargo bench -p fl-tests
//! ```

pub mod fixtures;
pub mod integration;
