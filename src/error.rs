use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the review engine.
///
/// Degraded name resolution is not represented here: lookups that only
/// decorate a response fall back to `None` and are logged by the caller.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    /// Readiness gate: lines still in `unmatched` state.
    #[error("unmatched lines remain")]
    UnmatchedLinesRemain { unmatched: usize },

    /// Readiness gate: no draft payload to approve.
    #[error("no draft payload")]
    DraftMissing,

    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl ReviewError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(msg: impl std::fmt::Display) -> Self {
        Self::Upstream(msg.to_string())
    }
}

impl From<sqlx::Error> for ReviewError {
    fn from(e: sqlx::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::UnmatchedLinesRemain { .. } | Self::DraftMissing => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = match &self {
            // Carry the blocking count so the UI can render an actionable message.
            Self::UnmatchedLinesRemain { unmatched } => json!({
                "ok": false,
                "error": self.to_string(),
                "counts": { "unmatched": unmatched },
            }),
            _ => json!({ "ok": false, "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
