use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::recommender::controller::SubmitError;
use crate::recommender::profile::ProfileError;
use crate::recommender::throttle::THROTTLE_ALERT;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Throttled: retry after {retry_after_ms}ms")]
    Throttled { retry_after_ms: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::UnknownField(_) => AppError::NotFound(err.to_string()),
            ProfileError::InvalidOption { .. } => AppError::Validation(err.to_string()),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(state) => AppError::MissingFields(state.messages()),
            SubmitError::Throttled { retry_after_ms } => AppError::Throttled { retry_after_ms },
            SubmitError::InFlight => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::MissingFields(messages) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Required fields are missing".to_string(),
                Some(json!(messages)),
            ),
            AppError::Throttled { retry_after_ms } => {
                // Round up so clients never retry inside the window.
                retry_after = Some((retry_after_ms + 999) / 1000);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "THROTTLED",
                    THROTTLE_ALERT.to_string(),
                    Some(json!({ "retry_after_ms": retry_after_ms })),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
