use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all Krishi metrics
const PREFIX: &str = "krishi";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Soil Metrics
    pub static ref SOIL_ANALYSES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_soil_analyses_total"),
        "Total number of stored soil analyses"
    ).expect("Failed to create soil_analyses_total metric");

    pub static ref SOIL_HEALTH_SCORE: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_soil_health_score"),
            "Health score of analyzed soil samples"
        )
        .buckets(vec![5.0, 10.0, 15.0, 20.0, 22.5, 25.0, 50.0])
    ).expect("Failed to create soil_health_score metric");

    pub static ref CROP_MATCHES_PER_ANALYSIS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_crop_matches_per_analysis"),
            "Number of suitable crops found per analysis"
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0])
    ).expect("Failed to create crop_matches_per_analysis metric");

    pub static ref CROP_RECOMMENDATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_crop_recommendations_total"),
            "Stored crop recommendations by source"
        ),
        &["source"]
    ).expect("Failed to create crop_recommendations_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type"),
        &["error_type"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already-registered errors are expected when tests initialize repeatedly
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SOIL_ANALYSES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SOIL_HEALTH_SCORE.clone()));
    let _ = REGISTRY.register(Box::new(CROP_MATCHES_PER_ANALYSIS.clone()));
    let _ = REGISTRY.register(Box::new(CROP_RECOMMENDATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a stored analysis
pub fn record_soil_analysis(health_score: f64, crop_matches: usize) {
    SOIL_ANALYSES_TOTAL.inc();
    SOIL_HEALTH_SCORE.observe(health_score);
    CROP_MATCHES_PER_ANALYSIS.observe(crop_matches as f64);
}

pub fn record_crop_recommendations(source: &str, count: usize) {
    CROP_RECOMMENDATIONS_TOTAL
        .with_label_values(&[source])
        .inc_by(count as f64);
}

pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
