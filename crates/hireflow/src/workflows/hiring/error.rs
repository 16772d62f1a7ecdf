use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::domain::RatingRangeError;
use super::identity::IdentityError;
use super::payments::PaymentError;
use super::profile_text::TextGenerationError;
use super::repository::RepositoryError;

/// Failure taxonomy shared by every hiring operation.
#[derive(Debug, thiserror::Error)]
pub enum HiringError {
    #[error("not authorized: {0}")]
    Unauthenticated(#[from] IdentityError),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("rating already submitted for this hire")]
    AlreadyRated,
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("upstream provider failure: {0}")]
    Upstream(String),
    #[error("storage failure: {0}")]
    Storage(RepositoryError),
}

impl HiringError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HiringError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            HiringError::Forbidden(_) => StatusCode::FORBIDDEN,
            HiringError::NotFound(_) => StatusCode::NOT_FOUND,
            HiringError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            HiringError::AlreadyRated | HiringError::Conflict(_) => StatusCode::CONFLICT,
            HiringError::Upstream(_) => StatusCode::BAD_GATEWAY,
            HiringError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for HiringError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::RatingAlreadySet => HiringError::AlreadyRated,
            RepositoryError::Conflict => HiringError::Conflict("email already registered"),
            RepositoryError::NotFound => HiringError::NotFound("record"),
            other => HiringError::Storage(other),
        }
    }
}

impl From<RatingRangeError> for HiringError {
    fn from(value: RatingRangeError) -> Self {
        HiringError::InvalidArgument(value.to_string())
    }
}

impl From<PaymentError> for HiringError {
    fn from(value: PaymentError) -> Self {
        match value {
            PaymentError::InvalidSessionId => {
                HiringError::InvalidArgument("session_id is malformed".to_string())
            }
            other => HiringError::Upstream(other.to_string()),
        }
    }
}

impl From<TextGenerationError> for HiringError {
    fn from(value: TextGenerationError) -> Self {
        HiringError::Upstream(value.to_string())
    }
}

impl IntoResponse for HiringError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            HiringError::Storage(source) => {
                error!(error = %source, "storage failure while serving request");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
