//! Prometheus metrics for the expansion engine.
//!
//! - Expansion metrics (top-level expansions, placeholders resolved)
//! - Depth budget hits
//! - Filter failures by filter name

mod helpers;

pub use helpers::{encode_metrics, ExpansionMetrics, FilterMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_expander";

lazy_static! {
    /// Total top-level expansions
    pub static ref EXPANSIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_expansions_total", METRIC_PREFIX),
        "Total top-level template expansions"
    ).unwrap();

    /// Total placeholders resolved, at any nesting level
    pub static ref PLACEHOLDERS_RESOLVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_placeholders_resolved_total", METRIC_PREFIX),
        "Total placeholders resolved"
    ).unwrap();

    /// Times an expansion branch stopped on the depth budget
    pub static ref DEPTH_EXCEEDED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_depth_exceeded_total", METRIC_PREFIX),
        "Total expansions halted by the recursion budget"
    ).unwrap();

    /// Filter failures (unknown filter, bad arguments, digest unavailable)
    pub static ref FILTER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_filter_failures_total", METRIC_PREFIX),
        "Total filter invocations that failed",
        &["filter"]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        EXPANSIONS_TOTAL.inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_expander_expansions_total"));
    }

    #[test]
    fn test_filter_failure_labels() {
        FilterMetrics::record_failure("bogus");
        assert!(FILTER_FAILURES_TOTAL.with_label_values(&["bogus"]).get() >= 1);
    }
}
