//! CRM client metrics collection.
//!
//! Provides standardized metrics for monitoring API traffic:
//! - Request counters by operation and status
//! - Latency histograms
//! - Retry and login counters

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total CRM API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "crm_requests_total";

    /// Total retry attempts by operation and reason.
    pub const RETRIES_TOTAL: &str = "crm_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "crm_latency_seconds";

    /// Login attempts by outcome.
    pub const LOGINS_TOTAL: &str = "crm_logins_total";

    /// Records returned to callers by resource.
    pub const RECORDS_RETURNED_TOTAL: &str = "crm_records_returned_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed request, including all of its retries.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str, reason: &'static str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record the outcome of a login round trip.
pub fn record_login(outcome: &'static str) {
    counter!(names::LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record how many records a listing returned.
pub fn record_records(resource: &'static str, count: usize) {
    counter!(names::RECORDS_RETURNED_TOTAL, "resource" => resource).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
        assert!(names::LOGINS_TOTAL.starts_with("crm_"));
    }
}
