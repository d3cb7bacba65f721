use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

use crate::cache::PredictionCache;
use crate::metrics::{CACHE_SIZE, RATE_LIMIT_ENTRIES};
use crate::rate_limit::RateLimiter;

// Housekeeping loop - runs on its own interval, independent of traffic
pub async fn housekeeping(rate_limiter: Arc<RateLimiter>, cache: PredictionCache, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    info!(interval = ?sweep_interval, "Housekeeping started");

    loop {
        interval.tick().await;

        let swept = rate_limiter.sweep_expired();
        let purged = cache.purge_expired();

        RATE_LIMIT_ENTRIES.set(rate_limiter.len() as f64);
        CACHE_SIZE.set(cache.len() as f64);

        if swept > 0 || purged > 0 {
            debug!(
                swept,
                purged,
                tracked = rate_limiter.len(),
                "Housekeeping removed expired entries"
            );
        }
    }
}
