use axum::extract::rejection::JsonRejection;
use axum::http::{Extensions, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, extract::State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::client_ip::client_identifier;
use crate::crop::{CropError, prepare_crop};
use crate::error::{ApiError, ApiResult};
use crate::metrics::{RATE_LIMITED_TOTAL, REJECTED_SELECTIONS, REQUEST_TOTAL};
use crate::models::{ClassifyRequest, ClassifyResponse, InferenceJob};
use crate::state::AppState;

// Browsers hand over canvas exports as data urls; accept both forms
fn decode_image_payload(payload: &str) -> Result<Vec<u8>, ApiError> {
    let payload = payload.trim();
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::InvalidImage(format!("Invalid base64 image: {e}")))
}

pub async fn classify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    REQUEST_TOTAL.inc();

    // admit or reject before any decoding work
    let identifier = client_identifier(&headers, &extensions);
    let decision = state.rate_limiter.check_rate_limit(&identifier, &state.rate_limit);
    if !decision.allowed {
        RATE_LIMITED_TOTAL.inc();
        warn!(client = %identifier, "Rate limit exceeded");
        return Err(ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs(state.rate_limiter.now()),
        });
    }

    let Json(request) = payload.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        _ => ApiError::MalformedInput(e.body_text()),
    })?;

    let bytes = decode_image_payload(&request.image_base64)?;
    let selection = request.selection;
    let max_side = state.max_image_side;

    // decoding and cropping are CPU bound
    let (clamped, crop) = tokio::task::spawn_blocking(move || prepare_crop(&bytes, &selection, max_side))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .inspect_err(|e| {
            if let CropError::Selection(err) = e {
                REJECTED_SELECTIONS.inc();
                info!(client = %identifier, error = %err, "Selection rejected");
            }
        })?;

    let (response_tx, response_rx) = oneshot::channel();

    let job = InferenceJob { crop, response_tx };

    state.job_tx.send(job).await.map_err(|_| ApiError::Unavailable)?;

    let predictions = response_rx.await.map_err(|_| ApiError::Unavailable)??;

    info!(
        client = %identifier,
        x = clamped.x,
        y = clamped.y,
        w = clamped.w,
        h = clamped.h,
        top = predictions.first().map(|p| p.label.as_str()).unwrap_or(""),
        "Classified selection"
    );

    Ok((
        [("x-ratelimit-remaining", decision.remaining.to_string())],
        Json(ClassifyResponse {
            predictions,
            selection: clamped,
        }),
    ))
}
