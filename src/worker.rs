use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

use crate::cache::{PredictionCache, make_cache_key};
use crate::inference::RunpodClient;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE, INFERENCE_LATENCY};
use crate::models::InferenceJob;

/// Background worker: drains the job queue and scores crops on the remote
/// endpoint, with at most `max_concurrent` calls in flight.
///
/// The queue is only pulled from once a slot is free, so a full set of slow
/// calls leaves new jobs waiting in the bounded channel.
pub async fn inference_worker(
    mut rx: mpsc::Receiver<InferenceJob>,
    client: RunpodClient,
    cache: PredictionCache,
    max_concurrent: usize,
) {
    info!(
        endpoint = %client.runsync_url(),
        max_concurrent,
        "Inference worker started"
    );

    let client = Arc::new(client);
    let slots = Arc::new(Semaphore::new(max_concurrent.max(1)));

    loop {
        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        let Some(job) = rx.recv().await else {
            break;
        };

        let client = Arc::clone(&client);
        let cache = cache.clone();
        tokio::spawn(async move {
            process_job(job, &client, &cache).await;
            drop(permit);
        });
    }

    info!("Inference worker stopped - queue closed");
}

async fn process_job(job: InferenceJob, client: &RunpodClient, cache: &PredictionCache) {
    let cache_key = make_cache_key(&job.crop);

    // check cache first
    if let Some(predictions) = cache.get(&cache_key) {
        CACHE_HITS.inc();
        info!("[Worker] Cache HIT");
        let _ = job.response_tx.send(Ok(predictions));
        return;
    }
    CACHE_MISSES.inc();

    let start = Instant::now();
    let result = client.classify(&job.crop).await;
    INFERENCE_LATENCY.observe(start.elapsed().as_secs_f64());

    match &result {
        Ok(predictions) => {
            cache.insert(cache_key, predictions.clone());
            CACHE_SIZE.set(cache.len() as f64);
        }
        Err(e) => warn!(error = %e, "[Worker] Inference failed"),
    }

    // handler may have gone away; nothing to do then
    let _ = job.response_tx.send(result);
}
