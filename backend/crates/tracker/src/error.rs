//! Tracker error types.
//!
//! Variants carry the public message; database causes are logged and
//! replaced by a generic message before the response is written.

use std::borrow::Cow;

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::{AppError, ErrorKind};
use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// `"<Entity> not found"`.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(Cow<'static, str>),

    /// Uniqueness collision or a parent that still has children.
    #[error("{0}")]
    Conflict(Cow<'static, str>),

    /// Role or ownership failure reported by the auth crate.
    #[error(transparent)]
    Access(#[from] AuthError),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Internal error")]
    Internal(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        TrackerError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        TrackerError::Conflict(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::NotFound(_) => ErrorKind::NotFound,
            TrackerError::Validation(_) => ErrorKind::BadRequest,
            TrackerError::Conflict(_) => ErrorKind::Conflict,
            TrackerError::Access(e) => e.kind(),
            TrackerError::Database(_) | TrackerError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            TrackerError::Access(e) => e.to_app_error(),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            TrackerError::Database(e) => tracing::error!(error = %e, "Tracker database error"),
            TrackerError::Internal(msg) => tracing::error!(message = %msg, "Tracker internal error"),
            TrackerError::Conflict(msg) => tracing::warn!(reason = %msg, "Tracker conflict"),
            TrackerError::Access(e) => e.log(),
            _ => tracing::debug!(error = %self, "Tracker error"),
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Value objects report through `AppError`.
impl From<AppError> for TrackerError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => TrackerError::Validation(err.message().to_owned().into()),
            ErrorKind::Conflict => TrackerError::Conflict(err.message().to_owned().into()),
            _ => TrackerError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = TrackerError::NotFound("Task");
        assert_eq!(err.to_string(), "Task not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_access_keeps_auth_surface() {
        let err: TrackerError = AuthError::forbidden("You can only update your own tasks").into();
        let wire = err.to_app_error();
        assert_eq!(wire.status_code(), 403);
        assert_eq!(wire.message(), "You can only update your own tasks");
    }

    #[test]
    fn test_database_detail_hidden() {
        let err = TrackerError::Database(sqlx::Error::RowNotFound).to_app_error();
        assert_eq!(err.message(), "Database error");
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
    }
}
