use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::errors;
use crate::app::patterns::{self, MessagePattern};
use crate::app::services::AppServices;

/// Envelope of one message: `{"cmd": "<pattern>", "data": <payload>}`.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub cmd: String,
    #[serde(default)]
    pub data: Value,
}

pub async fn handle_message(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RpcRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(request) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_message", rejection.body_text());
        }
    };

    let pattern: MessagePattern = match request.cmd.parse() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(cmd = %request.cmd, "rejected message with unknown pattern");
            return e.into_response();
        }
    };

    match patterns::dispatch(&services, pattern, request.data).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::warn!(%pattern, status = e.status().as_u16(), error = %e, "message failed");
            e.into_response()
        }
    }
}
