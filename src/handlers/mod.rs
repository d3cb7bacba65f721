mod health;
mod metrics;
mod classify;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use classify::classify_handler;
