//! Prometheus metrics for metascope
//!
//! Observability for index builds and metadata queries.

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Search metrics
    // ============================================================================

    /// Total number of search requests
    pub static ref SEARCH_REQUESTS: Counter = Counter::with_opts(
        Opts::new(
            "metascope_search_requests_total",
            "Total number of search requests"
        )
    ).expect("Failed to create SEARCH_REQUESTS counter");

    /// Search latency in seconds
    pub static ref SEARCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "metascope_search_latency_seconds",
            "Search latency in seconds"
        ).buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).expect("Failed to create SEARCH_LATENCY histogram");

    /// Number of results returned per search
    pub static ref SEARCH_RESULTS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "metascope_search_results_count",
            "Number of results returned per search"
        ).buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 1000.0])
    ).expect("Failed to create SEARCH_RESULTS histogram");

    // ============================================================================
    // Build metrics
    // ============================================================================

    /// Builds that passed the start checks
    pub static ref BUILDS_STARTED: Counter = Counter::with_opts(
        Opts::new("metascope_builds_started_total", "Index builds started")
    ).expect("Failed to create BUILDS_STARTED counter");

    /// Builds that published an index
    pub static ref BUILDS_COMPLETED: Counter = Counter::with_opts(
        Opts::new("metascope_builds_completed_total", "Index builds published")
    ).expect("Failed to create BUILDS_COMPLETED counter");

    pub static ref BUILDS_CANCELLED: Counter = Counter::with_opts(
        Opts::new("metascope_builds_cancelled_total", "Index builds cancelled")
    ).expect("Failed to create BUILDS_CANCELLED counter");

    pub static ref BUILDS_FAILED: Counter = Counter::with_opts(
        Opts::new("metascope_builds_failed_total", "Index builds that failed")
    ).expect("Failed to create BUILDS_FAILED counter");

    /// Enumeration branches skipped after a source failure
    pub static ref SKIPPED_BRANCHES: Counter = Counter::with_opts(
        Opts::new(
            "metascope_skipped_branches_total",
            "Modules or member lists skipped because the source failed"
        )
    ).expect("Failed to create SKIPPED_BRANCHES counter");

    /// Records in the published index
    pub static ref INDEXED_RECORDS: Gauge = Gauge::with_opts(
        Opts::new("metascope_indexed_records", "Records in the published index")
    ).expect("Failed to create INDEXED_RECORDS gauge");

    /// Keys in the published index
    pub static ref INDEXED_KEYS: Gauge = Gauge::with_opts(
        Opts::new("metascope_indexed_keys", "Keys in the published index")
    ).expect("Failed to create INDEXED_KEYS gauge");

    /// Time to walk the source and build an index
    pub static ref BUILD_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "metascope_build_duration_seconds",
            "Time to build an index in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0])
    ).expect("Failed to create BUILD_DURATION histogram");
}

/// Register all metrics with the global registry
///
/// This function should be called once at application startup.
/// Panics if metrics registration fails.
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(SEARCH_REQUESTS.clone()))
        .expect("Failed to register SEARCH_REQUESTS");
    REGISTRY
        .register(Box::new(SEARCH_LATENCY.clone()))
        .expect("Failed to register SEARCH_LATENCY");
    REGISTRY
        .register(Box::new(SEARCH_RESULTS.clone()))
        .expect("Failed to register SEARCH_RESULTS");
    REGISTRY
        .register(Box::new(BUILDS_STARTED.clone()))
        .expect("Failed to register BUILDS_STARTED");
    REGISTRY
        .register(Box::new(BUILDS_COMPLETED.clone()))
        .expect("Failed to register BUILDS_COMPLETED");
    REGISTRY
        .register(Box::new(BUILDS_CANCELLED.clone()))
        .expect("Failed to register BUILDS_CANCELLED");
    REGISTRY
        .register(Box::new(BUILDS_FAILED.clone()))
        .expect("Failed to register BUILDS_FAILED");
    REGISTRY
        .register(Box::new(SKIPPED_BRANCHES.clone()))
        .expect("Failed to register SKIPPED_BRANCHES");
    REGISTRY
        .register(Box::new(INDEXED_RECORDS.clone()))
        .expect("Failed to register INDEXED_RECORDS");
    REGISTRY
        .register(Box::new(INDEXED_KEYS.clone()))
        .expect("Failed to register INDEXED_KEYS");
    REGISTRY
        .register(Box::new(BUILD_DURATION.clone()))
        .expect("Failed to register BUILD_DURATION");
}

/// Gather all metrics and encode them in Prometheus text format
///
/// Returns an empty string if encoding fails.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}

/// Current metric values in a human-readable form
pub struct MetricSnapshot {
    pub search_requests_total: f64,
    pub search_latency_avg: f64,
    pub builds_completed: f64,
    pub builds_cancelled: f64,
    pub skipped_branches: f64,
    pub indexed_records: f64,
    pub indexed_keys: f64,
}

impl MetricSnapshot {
    /// Capture the current state of all metrics
    pub fn capture() -> Self {
        Self {
            search_requests_total: SEARCH_REQUESTS.get(),
            search_latency_avg: calculate_histogram_avg(&SEARCH_LATENCY),
            builds_completed: BUILDS_COMPLETED.get(),
            builds_cancelled: BUILDS_CANCELLED.get(),
            skipped_branches: SKIPPED_BRANCHES.get(),
            indexed_records: INDEXED_RECORDS.get(),
            indexed_keys: INDEXED_KEYS.get(),
        }
    }
}

/// Calculate the average value from a histogram
fn calculate_histogram_avg(histogram: &Histogram) -> f64 {
    let count = histogram.get_sample_count();
    if count == 0 {
        return 0.0;
    }
    histogram.get_sample_sum() / count as f64
}
