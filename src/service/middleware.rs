//! Service middleware and metric events.
//!
//! Metrics are emitted as structured `tracing` events under the
//! `temporal_kernel::metrics` target and aggregated from logs downstream.

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "temporal_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Collapse UUID path segments to `:id` to keep metric cardinality bounded.
fn normalize_path(path: &str) -> String {
    static UUID: OnceLock<Regex> = OnceLock::new();
    let uuid = UUID.get_or_init(|| {
        Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
            .expect("static UUID pattern")
    });
    uuid.replace_all(path, ":id").to_string()
}

/// Record one analysis call.
pub fn record_analysis_metric(operation: &str, result_count: usize, latency_ms: u64) {
    info!(
        target: "temporal_kernel::metrics",
        metric_type = "analysis",
        operation = operation,
        result_count = result_count,
        latency_ms = latency_ms,
        "analysis_metric"
    );
}

/// Record the outcome of an ingestion job.
pub fn record_ingestion_metric(accepted: usize, rejected: usize, success: bool) {
    let status = if success { "completed" } else { "failed" };
    info!(
        target: "temporal_kernel::metrics",
        metric_type = "ingestion",
        accepted = accepted,
        rejected = rejected,
        status = status,
        "ingestion_metric"
    );
}
