use clap::Parser;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure - every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "region-classify-gateway")]
#[command(about = "Crops a selected image region and classifies it on a remote GPU worker")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // RunPod API base url
    #[arg(long, env = "RUNPOD_URL", default_value = "https://api.runpod.ai")]
    pub runpod_url: String,

    // Serverless endpoint running the label scorer
    #[arg(long, env = "RUNPOD_ENDPOINT_ID")]
    pub endpoint_id: String,

    #[arg(long, env = "RUNPOD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // How often expired rate limit entries and cache entries are swept
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Prediction cache TTL in seconds
    #[arg(short, long, env = "CACHE_TTL", default_value_t = 300)]
    pub cache_ttl: u64,

    // Timeout for one remote inference call, in seconds
    #[arg(long, env = "INFERENCE_TIMEOUT", default_value_t = 90)]
    pub inference_timeout: u64,

    // Jobs waiting for the inference worker before handlers block
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 100)]
    pub queue_capacity: usize,

    // Remote inference calls allowed in flight at once
    #[arg(long, env = "MAX_CONCURRENT_INFERENCE", default_value_t = 4)]
    pub max_concurrent_inference: usize,

    // Largest accepted request body
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 15 * 1024 * 1024)]
    pub max_body_bytes: usize,

    // Largest accepted image width or height, in pixels
    #[arg(long, env = "MAX_IMAGE_SIDE", default_value_t = 8192)]
    pub max_image_side: u32,
}

impl Args {
    pub fn rate_limit_config(&self) -> Result<RateLimitConfig, String> {
        if self.rate_limit == 0 {
            return Err("--rate-limit must be greater than 0".to_string());
        }
        if self.rate_window == 0 {
            return Err("--rate-window must be greater than 0".to_string());
        }
        Ok(RateLimitConfig {
            max_requests: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
        })
    }

    // Checks the settings that have no meaningful zero value
    pub fn validate(&self) -> Result<(), String> {
        self.rate_limit_config()?;
        if self.queue_capacity == 0 {
            return Err("--queue-capacity must be greater than 0".to_string());
        }
        if self.max_concurrent_inference == 0 {
            return Err("--max-concurrent-inference must be greater than 0".to_string());
        }
        if self.sweep_interval == 0 {
            return Err("--sweep-interval must be greater than 0".to_string());
        }
        Ok(())
    }
}
