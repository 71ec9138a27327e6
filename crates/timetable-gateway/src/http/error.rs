//! Mapping from scheduler outcomes to HTTP responses.
//!
//! Body shape: `{"error": {"code": "...", "message": "...", ...extra}}`

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use timetable_scheduler::SchedulerError;
use tracing::warn;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    extra: Map<String, Value>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            extra: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        let message = e.to_string();
        let code = e.code();
        match e {
            SchedulerError::Conflict {
                entry_id,
                resources,
            } => ApiError::new(StatusCode::CONFLICT, code, message)
                .with("entry_id", json!(entry_id))
                .with("resources", json!(resources)),
            SchedulerError::NotFound { id } => {
                ApiError::new(StatusCode::NOT_FOUND, code, message).with("id", json!(id))
            }
            SchedulerError::Validation { field, .. } => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
                    .with("field", json!(field))
            }
            SchedulerError::Persistence(_) => {
                warn!(error = %message, "request failed on storage");
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
            }
            SchedulerError::Calendar(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            e.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            e.body_text(),
        )
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        warn!(error = %e, "scheduler task failed");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            format!("task join error: {e}"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = self.extra;
        error.insert("code".into(), json!(self.code));
        error.insert("message".into(), json!(self.message));
        (self.status, Json(json!({ "error": error }))).into_response()
    }
}
