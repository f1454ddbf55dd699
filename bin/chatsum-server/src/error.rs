//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Store failures keep their underlying message in the response body so
//! operators can diagnose them from the client side; they are also logged.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::entities::StoreError;

/// All errors that can occur in the chatsum-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the conversation store.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    /// Wrap a store error with a short description of the failed operation.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> ServerError {
        move |source| match source {
            StoreError::ConversationNotFound(_) => ServerError::NotFound("Conversation not found".to_owned()),
            StoreError::InvalidTimestamp(raw) => {
                ServerError::BadRequest(format!("'{raw}' is not an ISO-8601 timestamp"))
            }
            source => ServerError::Store { context, source },
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        ServerError::store("store operation failed")(e)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Store { .. } => {
                error!(error = %self, "store error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
