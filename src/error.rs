//! HTTP-facing error type.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::crop::CropError;
use crate::geometry::SelectionError;
use crate::inference::InferenceError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("{0}")]
    SelectionTooSmall(SelectionError),

    #[error("Rate limit exceeded. Try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Configuration invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Inference service error: {0}")]
    Upstream(String),

    #[error("Inference service unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) | ApiError::SelectionTooSmall(_) | ApiError::InvalidImage(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvariantViolation(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::MalformedInput(_) => "malformed_input",
            ApiError::SelectionTooSmall(_) => "selection_too_small",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::InvariantViolation(_) => "invalid_dimensions",
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Upstream(_) => "inference_failed",
            ApiError::Unavailable => "inference_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::Malformed(msg) => ApiError::MalformedInput(msg),
            SelectionError::TooSmall { .. } => ApiError::SelectionTooSmall(err),
            SelectionError::DegenerateDimensions { .. } => ApiError::InvariantViolation(err.to_string()),
        }
    }
}

impl From<CropError> for ApiError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::Decode(msg) => ApiError::InvalidImage(format!("Invalid image: {msg}")),
            CropError::Encode(msg) => ApiError::Internal(msg),
            CropError::Selection(e) => e.into(),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.code(),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            let headers = response.headers_mut();
            headers.insert("retry-after", HeaderValue::from(retry_after_secs));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
        }
        response
    }
}
