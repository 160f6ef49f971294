use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Comm module initialization errors
#[derive(Debug, Error)]
pub enum CommInitError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("Failed to bind TCP listener: {0}")]
    BindFailed(String),
}

/// Comm module runtime errors
#[derive(Debug, Error)]
pub enum CommError {
    #[error("Failed to read template: {0}")]
    Template(std::io::Error),

    #[error("Failed to read resource catalog: {0}")]
    CatalogRead(std::io::Error),

    #[error("Invalid resource catalog: {0}")]
    CatalogParse(serde_json::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Result type for comm operations
pub type Result<T> = std::result::Result<T, CommError>;

impl IntoResponse for CommError {
    fn into_response(self) -> Response {
        match &self {
            CommError::BadRequest(msg) => {
                let body = json!({
                    "error": msg,
                    "code": "BAD_REQUEST",
                });
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
            }
        }
    }
}
