use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder,
};

// Prometheus metrics (default registry)
pub static GET_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("kv_store_get_total", "Total get requests served")
        .expect("register get_total")
});

pub static GET_MISS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("kv_store_get_miss_total", "Get requests for absent keys")
        .expect("register get_miss_total")
});

pub static PUT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("kv_store_put_total", "Total key/value pairs written")
        .expect("register put_total")
});

pub static REQUEST_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("kv_store_request_errors_total", "Requests answered with an error body")
        .expect("register request_errors_total")
});

pub static ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("kv_store_entries", "Entries held by the store at last scrape")
        .expect("register entries")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

/// Register every metric up front so a scrape lists them before first use.
pub fn init() {
    Lazy::force(&GET_TOTAL);
    Lazy::force(&GET_MISS_TOTAL);
    Lazy::force(&PUT_TOTAL);
    Lazy::force(&REQUEST_ERRORS_TOTAL);
    Lazy::force(&ENTRIES);
}
