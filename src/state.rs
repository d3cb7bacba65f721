use std::sync::Arc;
use tokio::sync::mpsc;

use crate::models::InferenceJob;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

// app's shared state

pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit: RateLimitConfig,
    pub max_image_side: u32, // largest accepted width/height
    pub job_tx: mpsc::Sender<InferenceJob>,
}
