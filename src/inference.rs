use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::Prediction;

// The remote worker ranks the full vocabulary; only the head is returned
pub const TOP_K: usize = 5;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Inference failed: {0}")]
    Remote(String),

    #[error("Inference job did not complete (status {0})")]
    Incomplete(String),
}

// RunPod serverless request envelope
#[derive(Serialize)]
struct RunsyncRequest<'a> {
    input: RunsyncInput<'a>,
}

#[derive(Serialize)]
struct RunsyncInput<'a> {
    image_base64: &'a str,
}

// RunPod serverless response envelope
#[derive(Deserialize, Debug)]
struct RunsyncResponse {
    status: String,
    #[serde(default)]
    output: Option<WorkerOutput>,
    #[serde(default)]
    error: Option<String>,
}

// What the worker handler itself returns
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum WorkerOutput {
    Predictions(Vec<Prediction>),
    Failure { error: String },
}

/// Client for the label-scoring worker deployed as a RunPod serverless
/// endpoint. Calls are synchronous (`runsync`) and never retried.
#[derive(Clone)]
pub struct RunpodClient {
    client: Client,
    base_url: String,
    endpoint_id: String,
    api_key: String,
}

impl RunpodClient {
    pub fn new(
        base_url: &str,
        endpoint_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, endpoint_id, api_key))
    }

    pub fn with_client(client: Client, base_url: &str, endpoint_id: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint_id: endpoint_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn runsync_url(&self) -> String {
        format!("{}/v2/{}/runsync", self.base_url, self.endpoint_id)
    }

    // Score an encoded image; returns at most TOP_K predictions, best first
    pub async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>, InferenceError> {
        let encoded = STANDARD.encode(image);
        let body = RunsyncRequest {
            input: RunsyncInput {
                image_base64: &encoded,
            },
        };

        let res = self
            .client
            .post(self.runsync_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RunsyncResponse = res.json().await?;
        into_predictions(envelope)
    }
}

fn into_predictions(envelope: RunsyncResponse) -> Result<Vec<Prediction>, InferenceError> {
    match (envelope.status.as_str(), envelope.output) {
        ("COMPLETED", Some(WorkerOutput::Predictions(mut predictions))) => {
            predictions.truncate(TOP_K);
            Ok(predictions)
        }
        (_, Some(WorkerOutput::Failure { error })) => Err(InferenceError::Remote(error)),
        ("FAILED", _) => Err(InferenceError::Remote(
            envelope.error.unwrap_or_else(|| "unknown worker error".to_string()),
        )),
        (status, _) => Err(InferenceError::Incomplete(status.to_string())),
    }
}
