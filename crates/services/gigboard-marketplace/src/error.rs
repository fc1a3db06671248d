use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde_json::json;
use thiserror::Error;

// Set once at startup from ServiceConfig. In development mode error responses
// carry a debug representation under "stack".
static DEV_MODE: OnceCell<bool> = OnceCell::new();

pub fn set_dev_mode(enabled: bool) {
    let _ = DEV_MODE.set(enabled);
}

fn dev_mode() -> bool {
    DEV_MODE.get().copied().unwrap_or(false)
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Payment processor error: {0}")]
    Processor(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_request",
            AppError::Conflict(_) => "conflict",
            AppError::Config(_) => "configuration_error",
            AppError::Processor(_) => "processor_error",
            AppError::Storage(_) => "storage_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Application error: {:#}", self);
        }

        let mut body = json!({
            "error": self.to_string(),
            "type": self.kind(),
        });
        if dev_mode() {
            body["stack"] = json!(format!("{:?}", self));
        }

        (status, Json(body)).into_response()
    }
}
