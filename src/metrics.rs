use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("viajeia_requests_total", "Total number of planning requests").unwrap();
    pub static ref RATE_LIMITED: CounterVec = register_counter_vec!(
        "viajeia_rate_limited_total",
        "Requests blocked by the admission controller",
        &["limit_type"]
    )
    .unwrap();
    pub static ref REJECTED_INPUT: Counter =
        register_counter!("viajeia_rejected_input_total", "Requests rejected by input validation").unwrap();
    pub static ref MODEL_FAILURES: Counter =
        register_counter!("viajeia_model_failures_total", "Failed language model calls").unwrap();
    pub static ref MODEL_LATENCY: Histogram = register_histogram!(
        "viajeia_model_latency_seconds",
        "Language model latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_IDENTITIES: Gauge = register_gauge!(
        "viajeia_tracked_identities",
        "Identities currently held by the rate limiter"
    )
    .unwrap();
}
