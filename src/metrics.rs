use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("classify_requests_total", "Total number of classify requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("classify_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref REJECTED_SELECTIONS: Counter =
        register_counter!("classify_rejected_selections_total", "Requests rejected for an invalid selection").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("classify_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("classify_cache_misses_total", "Total cache misses").unwrap();
    pub static ref INFERENCE_LATENCY: Histogram = register_histogram!(
        "classify_inference_latency_seconds",
        "Remote inference latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("classify_cache_size", "Current number of items in cache").unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("classify_rate_limit_entries", "Identifiers currently tracked by the rate limiter").unwrap();
}
