//! # Fund Telemetry
//!
//! Logging and metrics for FundLedger deployments.
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty output in
//!   development and JSON in containers.
//! - **Metrics**: Prometheus counters and histograms in a process-wide
//!   registry, scraped through [`encode_metrics`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fund_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // engine runs here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FL_SERVICE_NAME` | `fund-ledger` | Service name in logs |
//! | `FL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `FL_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `FL_NETWORK` | `devnet` | Deployment identifier |

#![warn(missing_docs)]

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, CallTimer, MetricsHandle, CALL_DURATION, CALL_ERRORS,
    FEE_SETTLEMENTS, FUNDS_CREATED, MIGRATIONS, POLICY_VIOLATIONS, REGISTRY, SHARES_BOUGHT,
    SHARES_REDEEMED,
};

use anyhow::Context;
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the application.
///
/// # Errors
///
/// Fails when metrics are already registered or a global subscriber is
/// already installed.
pub fn init_telemetry(config: TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let metrics = register_metrics().context("registering metrics")?;
    tracing_setup::init_tracing(&config).context("installing tracing subscriber")?;
    Ok(TelemetryGuard {
        service: config.full_service_name(),
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service, "Shutting down telemetry");
    }
}

/// Increment a counter, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
