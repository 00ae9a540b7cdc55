//! Relay error taxonomy and its HTTP mapping.
//!
//! Upstream failures are logged with their full cause chain; the caller only
//! ever receives the generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const UPSTREAM_FAILED: &str = "Failed to get a response from the AI.";

#[derive(Debug, Error)]
pub enum RelayError {
    /// The caller sent a request the relay cannot forward.
    #[error("{0}")]
    Validation(String),

    /// The provider was unreachable, answered with an error, or sent an
    /// envelope without a reply.
    #[error("upstream error: {0:#}")]
    Upstream(#[source] anyhow::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match self {
            RelayError::Validation(m) => m,
            RelayError::Upstream(e) => {
                error!(error = %format!("{e:#}"), "provider call failed");
                UPSTREAM_FAILED.to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
