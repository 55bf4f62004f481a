// In crates/web-server/src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] database::Error),
    #[error("Queue error: {0}")]
    Queue(#[from] task_queue::Error),
    #[error("Engine error: {0}")]
    Engine(#[from] engine::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to bind server address")]
    ServerBindError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maps API errors onto HTTP responses. Internal failure details stay in the
/// logs; clients get a generic message.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            _ => {
                tracing::error!(error = %self, "API request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
