//! Fetch metrics
//!
//! Recorded through the `metrics` facade. Without an installed recorder the
//! calls are no-ops; `init_telemetry` installs a Prometheus exporter when a
//! metrics port is configured.

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One page request, including failed attempts
    PageRequest,
    /// Complete history fetch for one product
    FullFetch,
}

/// Counter metric types, labelled by product
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Pages received
    PagesFetched,
    /// Fills received
    FillsFetched,
    /// Page requests retried after a network error
    RequestRetries,
    /// Product fetches that ended in an error
    FetchFailures,
}

impl LatencyMetric {
    pub fn name(&self) -> &'static str {
        match self {
            LatencyMetric::PageRequest => "cbpstats_page_request_latency_ms",
            LatencyMetric::FullFetch => "cbpstats_fetch_duration_ms",
        }
    }
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::PagesFetched => "cbpstats_pages_fetched_total",
            CounterMetric::FillsFetched => "cbpstats_fills_fetched_total",
            CounterMetric::RequestRetries => "cbpstats_request_retries_total",
            CounterMetric::FetchFailures => "cbpstats_fetch_failures_total",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a per-product counter
pub fn increment_counter(metric: CounterMetric, product_id: &str, value: u64) {
    metrics::counter!(metric.name(), "product" => product_id.to_string()).increment(value);
}
