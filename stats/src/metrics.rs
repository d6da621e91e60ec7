//! Prometheus metrics for the xTDH engine.
//!
//! The [`EngineMetrics`] struct owns a dedicated [`Registry`] that a
//! `/metrics` endpoint can encode into the Prometheus text exposition
//! format.

use prometheus::{
    register_gauge_with_registry, register_histogram_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Gauge, Histogram,
    HistogramOpts, IntCounter, IntGauge, Opts, Registry,
};

/// Central collection of engine-level Prometheus metrics.
pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Total recalculation runs started.
    pub runs_total: IntCounter,
    /// Total recalculation runs that failed before commit.
    pub runs_failed_total: IntCounter,
    /// Wall-clock duration of a full recalculation run, in milliseconds.
    pub run_duration_ms: Histogram,
    /// The global granted daily-rate total as of the last activated stats
    /// slot.
    pub granted_rate_total: Gauge,
    /// Current number of registered identities.
    pub identity_count: IntGauge,
}

impl EngineMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let runs_total = register_int_counter_with_registry!(
            Opts::new("xtdh_runs_total", "Total recalculation runs started"),
            registry
        )
        .expect("failed to register runs_total counter");

        let runs_failed_total = register_int_counter_with_registry!(
            Opts::new(
                "xtdh_runs_failed_total",
                "Total recalculation runs that failed before commit"
            ),
            registry
        )
        .expect("failed to register runs_failed_total counter");

        let run_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "xtdh_run_duration_ms",
                "Wall-clock duration of a full recalculation run"
            )
            .buckets(vec![50.0, 250.0, 1_000.0, 5_000.0, 30_000.0, 120_000.0]),
            registry
        )
        .expect("failed to register run_duration_ms histogram");

        let granted_rate_total = register_gauge_with_registry!(
            Opts::new(
                "xtdh_granted_rate_total",
                "Global granted daily-rate total of the active stats slot"
            ),
            registry
        )
        .expect("failed to register granted_rate_total gauge");

        let identity_count = register_int_gauge_with_registry!(
            Opts::new("xtdh_identity_count", "Current number of registered identities"),
            registry
        )
        .expect("failed to register identity_count gauge");

        Self {
            registry,
            runs_total,
            runs_failed_total,
            run_duration_ms,
            granted_rate_total,
            identity_count,
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_register_without_collision() {
        let metrics = EngineMetrics::new();
        metrics.runs_total.inc();
        metrics.granted_rate_total.set(123.5);
        assert_eq!(metrics.runs_total.get(), 1);
        assert_eq!(metrics.granted_rate_total.get(), 123.5);
        assert_eq!(metrics.registry.gather().len(), 5);
    }
}
