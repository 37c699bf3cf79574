use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Token exchange failed: {0}")]
    UpstreamAuth(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Unauthorized")]
    MissingCredential,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to publish export: {0}")]
    Publish(String),

    #[error("Resource not found")]
    NotFound(String),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Unauthorized",
                    "message": "Session expired or invalid",
                }),
            ),
            AppError::NotFound(ref key) => {
                tracing::error!("Resource not found: {}", key);
                (
                    StatusCode::NOT_FOUND,
                    json!({ "error": "Resource not found" }),
                )
            }
            AppError::InvalidFilename(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                )
            }
            _ => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
