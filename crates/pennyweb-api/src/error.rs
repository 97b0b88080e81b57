//! Error types for pennyweb-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pennyweb_core::error::ErrorCode;
use pennyweb_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e.code() {
                ErrorCode::TransactionNotFound => StatusCode::NOT_FOUND,
                ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Core(e) => serde_json::to_value(e.to_details())
                .unwrap_or_else(|_| serde_json::json!({ "message": e.to_string() })),
            other => serde_json::json!({ "message": other.to_string() }),
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(body)).into_response()
    }
}
