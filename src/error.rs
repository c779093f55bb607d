use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    scoresheet::{ResolutionError, ValidationIssue},
    state::match_lifecycle::InvalidTransition,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable or a write was rolled back.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The sheet breaks league rules and cannot be finalized.
    #[error("validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ResolutionError> for ServiceError {
    fn from(err: ResolutionError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Sheet rejected by the league rules.
    #[error("{message}")]
    Unprocessable {
        /// Summary shown to the reviewer.
        message: String,
        /// Every rule violation found.
        issues: Vec<ValidationIssue>,
    },
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            // Backend details stay in the logs.
            ServiceError::Unavailable(_) => {
                AppError::ServiceUnavailable("the operation could not be saved, retry later".into())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Validation(issues) => AppError::Unprocessable {
                message: format!("the sheet has {} validation issue(s)", issues.len()),
                issues,
            },
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human readable reason.
    pub message: String,
    /// Rule violations, present on 422 responses only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let message = self.to_string();
        let issues = match self {
            AppError::Unprocessable { issues, .. } => issues,
            _ => Vec::new(),
        };

        let payload = Json(ErrorBody {
            success: false,
            message,
            issues,
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::match_lifecycle::{MatchEvent, MatchStatus, next_status};

    #[test]
    fn invalid_transition_maps_to_conflict() {
        let err = next_status(MatchStatus::Finished, MatchEvent::Approve).unwrap_err();
        let app: AppError = ServiceError::from(err).into();
        assert_eq!(app.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let storage = StorageError::unavailable(
            "mongodb://user:pw@db".into(),
            std::io::Error::other("boom"),
        );
        let app: AppError = ServiceError::from(storage).into();
        assert!(!app.to_string().contains("mongodb://"));
        assert_eq!(app.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
