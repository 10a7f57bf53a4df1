use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use catalog_core::DomainError;
use catalog_infra::StoreError;

/// Failure of a dispatched message, as seen by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unknown message pattern `{0}`")]
    UnknownPattern(String),

    #[error("{0}")]
    Persistence(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UnknownPattern(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::UnknownPattern(_) => "unknown_pattern",
            ApiError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::Validation(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            e @ StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            // Storage details stay in the logs.
            e @ StoreError::Persistence { .. } => {
                tracing::error!(error = %e, "persistence failure");
                ApiError::Persistence("internal persistence error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.code(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "status": status.as_u16(),
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
