//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Batch submission and finalization
//! - Per-item outcomes
//! - Page reconciliation

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch submissions by result.
pub static BATCH_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "poolscout_batch_submissions_total",
            "Total batch submission attempts",
        ),
        &["result"], // "accepted", "remote_busy", or DashboardError::kind()
    )
    .unwrap()
});

/// Batch items reaching a terminal status.
pub static BATCH_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "poolscout_batch_items_total",
            "Total batch items by terminal outcome",
        ),
        &["outcome"], // "completed", "failed"
    )
    .unwrap()
});

/// Size of accepted batches.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("poolscout_batch_size", "Number of items per accepted batch")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

/// Batches that reached completion.
pub static BATCHES_FINALIZED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "poolscout_batches_finalized_total",
        "Total batches finalized",
    )
    .unwrap()
});

// =============================================================================
// Reconciliation Metrics
// =============================================================================

/// Page reconciliations by result.
pub static RECONCILIATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "poolscout_reconciliations_total",
            "Total saved-report reconciliations",
        ),
        &["result"], // "ok", or DashboardError::kind()
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(BATCH_SUBMISSIONS.clone()),
        Box::new(BATCH_ITEMS.clone()),
        Box::new(BATCH_SIZE.clone()),
        Box::new(BATCHES_FINALIZED.clone()),
        Box::new(RECONCILIATIONS.clone()),
    ]
}

/// Register all core metrics in `registry`.
pub fn register_metrics(registry: &Registry) -> prometheus::Result<()> {
    for collector in all_metrics() {
        registry.register(collector)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_exposes_families() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();

        BATCH_SUBMISSIONS.with_label_values(&["accepted"]).inc();
        RECONCILIATIONS.with_label_values(&["ok"]).inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"poolscout_batch_submissions_total".to_string()));
        assert!(names.contains(&"poolscout_reconciliations_total".to_string()));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        assert!(register_metrics(&registry).is_err());
    }
}
