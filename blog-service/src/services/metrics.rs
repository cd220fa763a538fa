//! Metrics collection for blog-service.
//!
//! Standard HTTP metrics go through the `metrics` recorder; generation and
//! distribution counters live in a dedicated Prometheus registry.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;
use std::time::Duration;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static GENERATION_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static EMAILS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize metrics collection. Safe to call more than once.
pub fn init_metrics() {
    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }

    let registry = Registry::new();

    let generation_counter = IntCounterVec::new(
        Opts::new(
            "blog_generation_requests_total",
            "Generation requests by provenance of the returned text",
        ),
        &["provenance"],
    )
    .expect("Failed to create blog_generation_requests_total metric");

    let provider_errors = IntCounterVec::new(
        Opts::new(
            "blog_provider_errors_total",
            "Provider call failures by provider and error class",
        ),
        &["provider", "class"],
    )
    .expect("Failed to create blog_provider_errors_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "blog_provider_latency_seconds",
            "Latency of text provider calls",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider", "model"],
    )
    .expect("Failed to create blog_provider_latency_seconds metric");

    let emails_counter = IntCounterVec::new(
        Opts::new("blog_emails_total", "Distribution emails by outcome"),
        &["status"],
    )
    .expect("Failed to create blog_emails_total metric");

    registry
        .register(Box::new(generation_counter.clone()))
        .expect("Failed to register blog_generation_requests_total");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register blog_provider_errors_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register blog_provider_latency_seconds");
    registry
        .register(Box::new(emails_counter.clone()))
        .expect("Failed to register blog_emails_total");

    // A concurrent initializer may have won; its collectors stay authoritative.
    if PROMETHEUS_REGISTRY.set(registry).is_err() {
        return;
    }
    let _ = GENERATION_REQUESTS_TOTAL.set(generation_counter);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = EMAILS_TOTAL.set(emails_counter);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Count a finished generation request; `provenance` is "none" on failure.
pub fn record_generation(provenance: &str) {
    if let Some(counter) = GENERATION_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[provenance]).inc();
    }
}

pub fn record_provider_error(provider: &str, class: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, class]).inc();
    }
}

pub fn observe_provider_latency(provider: &str, model: &str, elapsed: Duration) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_email(status: &str) {
    if let Some(counter) = EMAILS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
