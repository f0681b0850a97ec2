use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::core::ProjectionError;

/// Request failures and the status each one maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    /// The parameters were valid but the recurrence left the finite range.
    #[error("{0}")]
    Computation(ProjectionError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Computation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        if err.is_parameter_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Computation(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Computation(err) => tracing::error!(error = %err, "projection failed"),
            ApiError::BadRequest(msg) => tracing::warn!(error = %msg, "rejected request"),
            ApiError::NotFound => {}
        }
        super::json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}
