//! Prometheus metrics for the JWKS server.
//!
//! Provides counters, histograms, and gauges for observability.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwks_server_tokens_issued_total",
        "Total number of tokens issued",
        &["key_class"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Failed issuance counter.
pub static TOKEN_ISSUE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwks_server_token_issue_failures_total",
        "Total number of failed token issuances",
        &["code"]
    )
    .expect("Failed to register token_issue_failures metric")
});

/// JWKS publications counter.
pub static JWKS_PUBLICATIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "jwks_server_jwks_publications_total",
        "Total number of JWKS documents served"
    )
    .expect("Failed to register jwks_publications metric")
});

/// Keys in the most recent publication.
pub static JWKS_KEYS_PUBLISHED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "jwks_server_jwks_keys_published",
        "Number of keys in the most recently served JWKS"
    )
    .expect("Failed to register jwks_keys_published metric")
});

/// Generated keys counter.
pub static KEYS_GENERATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "jwks_server_keys_generated_total",
        "Total number of RSA signing keys generated"
    )
    .expect("Failed to register keys_generated metric")
});

/// HTTP route latency histogram.
pub static HTTP_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "jwks_server_http_latency_seconds",
        "HTTP handler latency in seconds",
        &["route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_latency metric")
});

/// Record a token issuance.
pub fn record_token_issued(key_class: &str) {
    TOKENS_ISSUED.with_label_values(&[key_class]).inc();
}

/// Record a failed issuance by error code.
pub fn record_issue_failure(code: &str) {
    TOKEN_ISSUE_FAILURES.with_label_values(&[code]).inc();
}

/// Record a JWKS publication.
pub fn record_jwks_published(key_count: usize) {
    JWKS_PUBLICATIONS.inc();
    JWKS_KEYS_PUBLISHED.set(i64::try_from(key_count).unwrap_or(i64::MAX));
}

/// Record a generated key.
pub fn record_key_generated() {
    KEYS_GENERATED.inc();
}

/// Record HTTP handler latency.
pub fn record_http_latency(route: &str, duration_secs: f64) {
    HTTP_LATENCY.with_label_values(&[route]).observe(duration_secs);
}

/// Render the default registry in the Prometheus text format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .is_err()
    {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
