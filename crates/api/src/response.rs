use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use promptdraw_runtime::DrawError;

pub type AppSuccess = GenericResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl GenericResponse {
    pub fn new(status: StatusCode, message: &str, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

impl IntoResponse for GenericResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json::from(self)).into_response()
    }
}

#[derive(Debug)]
pub struct AppError(pub StatusCode, pub anyhow::Error);
impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        Self(status, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        } else {
            tracing::warn!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        }

        // draw failures tell the caller whether trying again can help
        let data = match self.1.downcast_ref::<DrawError>() {
            Some(e) => json!({ "kind": e.kind(), "retryable": e.is_retryable() }),
            None => json!({}),
        };
        GenericResponse::new(self.0, &self.1.to_string(), data).into_response()
    }
}

fn draw_error_status(err: &DrawError) -> StatusCode {
    match err {
        DrawError::UserNotFound(_) => StatusCode::NOT_FOUND,
        DrawError::InsufficientQuota => StatusCode::TOO_MANY_REQUESTS,
        DrawError::PoolNotFound(_) => StatusCode::NOT_FOUND,
        DrawError::PoolInactive(_) => StatusCode::CONFLICT,
        DrawError::PoolAccessDenied(_) => StatusCode::FORBIDDEN,
        DrawError::NoEligibleCard { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DrawError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<DrawError> for AppError {
    fn from(err: DrawError) -> Self {
        Self(draw_error_status(&err), err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(StatusCode::BAD_REQUEST, err)
    }
}
