use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored document could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found")]
    NotFound,

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl AppError {
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, field, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, None, "Not Found".to_string()),
            AppError::InvalidInput { field, message } => {
                (StatusCode::BAD_REQUEST, Some(field), message)
            }
            AppError::InvalidReference(msg) => {
                error!("invalid reference: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Internal data inconsistency".to_string(),
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Serialization(e) => {
                error!("stored document decode failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Stored data could not be decoded".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            field,
            message: error_message,
        });

        (status, body).into_response()
    }
}
