use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use region_classify_gateway::cache::PredictionCache;
use region_classify_gateway::config::Args;
use region_classify_gateway::inference::RunpodClient;
use region_classify_gateway::models::InferenceJob;
use region_classify_gateway::housekeeping::housekeeping;
use region_classify_gateway::rate_limit::RateLimiter;
use region_classify_gateway::routes::create_router;
use region_classify_gateway::state::AppState;
use region_classify_gateway::worker::inference_worker;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // LOG_FORMAT=json for log shipping, human readable otherwise
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }
}

// this is main async function with tokio
#[tokio::main]
async fn main() {
    init_tracing();

    // parse cli arguments
    let args = Args::parse();

    let rate_limit = match args.validate().and_then(|_| args.rate_limit_config()) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let client = match RunpodClient::new(
        &args.runpod_url,
        &args.endpoint_id,
        &args.api_key,
        Duration::from_secs(args.inference_timeout),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build inference client: {}", e);
            std::process::exit(1);
        }
    };

    let (job_tx, job_rx) = mpsc::channel::<InferenceJob>(args.queue_capacity);
    let cache = PredictionCache::new(Duration::from_secs(args.cache_ttl));
    let rate_limiter = Arc::new(RateLimiter::new());

    // creating shared state
    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        rate_limit,
        max_image_side: args.max_image_side,
        job_tx,
    });

    // spawn the background worker
    tokio::spawn(inference_worker(
        job_rx,
        client,
        cache.clone(),
        args.max_concurrent_inference,
    ));

    // expired rate limit windows and cache entries
    tokio::spawn(housekeeping(
        rate_limiter,
        cache,
        Duration::from_secs(args.sweep_interval),
    ));

    let app = create_router(state, args.max_body_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Gateway running on http://localhost:{}", args.port);
    info!("Forwarding crops to RunPod endpoint {}", args.endpoint_id);
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );

    // peer address is the last-resort rate limit identifier
    let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
