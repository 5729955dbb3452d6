//! Metrics for quorum query coordination
//!
//! Uses the `metrics` facade; install an exporter (e.g. Prometheus via
//! `tessera-observe`) to collect them.

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Initialize metric descriptions for quorum queries
pub fn init_quorum_metrics() {
    describe_counter!(
        "tessera_quorum_queries_total",
        "Total quorum queries by final result"
    );

    describe_counter!(
        "tessera_quorum_endpoint_calls_total",
        "Total endpoint calls by outcome"
    );

    describe_counter!(
        "tessera_quorum_retry_rounds_total",
        "Total retry rounds by failure class"
    );

    describe_histogram!(
        "tessera_quorum_query_duration_seconds",
        "End-to-end duration of quorum queries in seconds"
    );
}

/// Record a finished query with its result label
pub fn record_query(result: &str) {
    counter!("tessera_quorum_queries_total", "result" => result.to_string()).increment(1);
}

/// Record one endpoint call outcome
pub fn record_endpoint_call(result: &str) {
    counter!("tessera_quorum_endpoint_calls_total", "result" => result.to_string()).increment(1);
}

/// Record a retry round with its failure class
pub fn record_retry_round(class: &str) {
    counter!("tessera_quorum_retry_rounds_total", "class" => class.to_string()).increment(1);
}

/// Record the end-to-end duration of a query
pub fn record_query_duration(seconds: f64) {
    histogram!("tessera_quorum_query_duration_seconds").record(seconds);
}
