//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    DEPTH_EXCEEDED_TOTAL, EXPANSIONS_TOTAL, FILTER_FAILURES_TOTAL, PLACEHOLDERS_RESOLVED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording expansion metrics
pub struct ExpansionMetrics;

impl ExpansionMetrics {
    /// Record a top-level expansion
    pub fn record_expansion() {
        EXPANSIONS_TOTAL.inc();
    }

    /// Record a resolved placeholder
    pub fn record_placeholder() {
        PLACEHOLDERS_RESOLVED_TOTAL.inc();
    }

    /// Record an expansion branch halted by the depth budget
    pub fn record_depth_exceeded() {
        DEPTH_EXCEEDED_TOTAL.inc();
    }
}

/// Helper struct for recording filter metrics
pub struct FilterMetrics;

impl FilterMetrics {
    /// Record a failed filter invocation
    pub fn record_failure(filter: &str) {
        FILTER_FAILURES_TOTAL.with_label_values(&[filter]).inc();
    }
}
