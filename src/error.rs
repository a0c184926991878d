//! Error types for store access and the HTTP surface.
//!
//! `StoreError` describes what went wrong talking to the document store.
//! `ApiError` is what handlers return; it decides the status code and keeps
//! server-side details out of the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of a single document store call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document '{id}' not found in index '{index}'")]
    NotFound { index: String, id: String },

    /// The addressed index does not exist.
    #[error("index '{0}' not found")]
    IndexNotFound(String),

    /// The store could not be reached (connect failure, timeout).
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected status.
    #[error("document store returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The store answered with a body we could not interpret.
    #[error("failed to decode document store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(index: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            index: index.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::IndexNotFound(_)
        )
    }
}

/// Error returned from route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Store(StoreError::Unavailable(_)) => {
                "The document store is currently unavailable".to_string()
            }
            ApiError::Store(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = json!({
            "statusCode": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.public_message(),
        });

        (status, Json(body)).into_response()
    }
}
