//! Prometheus metrics for the command-line front-end.
//!
//! The registry carries the core batch and reconciliation metrics plus
//! per-command counts and durations.

use anyhow::Context;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    poolscout_core::metrics::register_metrics(&registry).unwrap();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Command Metrics
// =============================================================================

/// Commands run, by command and result.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("poolscout_commands_total", "Total commands run"),
        &["command", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Command wall time in seconds.
pub static COMMAND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "poolscout_command_duration_seconds",
            "Command duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["command"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(COMMAND_DURATION.clone()))
        .unwrap();
}

/// Record one finished command.
pub fn record_command(command: &str, ok: bool, seconds: f64) {
    let result = if ok { "ok" } else { "error" };
    COMMANDS_TOTAL.with_label_values(&[command, result]).inc();
    COMMAND_DURATION
        .with_label_values(&[command])
        .observe(seconds);
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_core_and_command_metrics() {
        record_command("search", true, 0.2);
        poolscout_core::metrics::BATCHES_FINALIZED.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("poolscout_commands_total{command=\"search\",result=\"ok\"}"));
        assert!(text.contains("poolscout_command_duration_seconds_bucket"));
        assert!(text.contains("poolscout_batches_finalized_total"));
    }
}
