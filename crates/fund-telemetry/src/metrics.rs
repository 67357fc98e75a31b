//! Prometheus metrics for the FundLedger engine.
//!
//! All metrics follow the naming convention: `fl_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SHARES
    // =========================================================================

    /// Successful share purchases
    pub static ref SHARES_BOUGHT: Counter = Counter::new(
        "fl_shares_bought_total",
        "Total number of successful share purchases"
    ).expect("metric creation failed");

    /// Successful redemptions
    pub static ref SHARES_REDEEMED: CounterVec = CounterVec::new(
        Opts::new("fl_shares_redeemed_total", "Total number of successful redemptions"),
        &["kind"]  // kind: in_kind/swap
    ).expect("metric creation failed");

    // =========================================================================
    // FEES AND POLICIES
    // =========================================================================

    /// Fee settlements that moved value
    pub static ref FEE_SETTLEMENTS: CounterVec = CounterVec::new(
        Opts::new("fl_fee_settlements_total", "Fee settlements that moved value"),
        &["hook"]
    ).expect("metric creation failed");

    /// Actions rejected by a policy rule
    pub static ref POLICY_VIOLATIONS: Counter = Counter::new(
        "fl_policy_violations_total",
        "Total actions rejected by a policy rule"
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Funds created
    pub static ref FUNDS_CREATED: Counter = Counter::new(
        "fl_funds_created_total",
        "Total funds created"
    ).expect("metric creation failed");

    /// Migration requests by stage
    pub static ref MIGRATIONS: CounterVec = CounterVec::new(
        Opts::new("fl_migrations_total", "Migration requests by stage"),
        &["stage"]  // stage: signaled/executed/cancelled
    ).expect("metric creation failed");

    // =========================================================================
    // CALLS
    // =========================================================================

    /// Failed calls by error kind
    pub static ref CALL_ERRORS: CounterVec = CounterVec::new(
        Opts::new("fl_call_errors_total", "Failed calls by operation and error kind"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    /// Call duration
    pub static ref CALL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "fl_call_duration_seconds",
            "Time spent inside a fund call"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Proof that the metrics are registered.
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// # Errors
///
/// `MetricsInit` if a metric is already registered.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SHARES_BOUGHT.clone()),
        Box::new(SHARES_REDEEMED.clone()),
        Box::new(FEE_SETTLEMENTS.clone()),
        Box::new(POLICY_VIOLATIONS.clone()),
        Box::new(FUNDS_CREATED.clone()),
        Box::new(MIGRATIONS.clone()),
        Box::new(CALL_ERRORS.clone()),
        Box::new(CALL_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// `MetricsInit` if encoding fails.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Observes the elapsed time of one operation on drop.
pub struct CallTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl CallTimer {
    /// Start timing `operation`.
    pub fn new(operation: &str) -> Self {
        Self {
            histogram: CALL_DURATION.with_label_values(&[operation]),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
