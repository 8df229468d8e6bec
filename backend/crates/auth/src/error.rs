//! Auth error types.
//!
//! Every variant maps to a stable public message. Causes (database errors,
//! token decoding details, hashing failures) are logged and dropped before
//! the response is written.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::{AppError, ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Which unique field collided on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Username,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentityField::Email => "email",
            IdentityField::Username => "username",
        })
    }
}

/// Why a bearer token was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    BadSignature,
    /// Header names an algorithm outside the HMAC family.
    WrongAlgorithm,
    WrongIssuerOrAudience,
    Malformed,
    ClaimMissing(Cow<'static, str>),
    UnknownAccount,
    InactiveAccount,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRejection::Expired => f.write_str("token expired"),
            TokenRejection::BadSignature => f.write_str("signature mismatch"),
            TokenRejection::WrongAlgorithm => f.write_str("unexpected signing algorithm"),
            TokenRejection::WrongIssuerOrAudience => f.write_str("issuer or audience mismatch"),
            TokenRejection::Malformed => f.write_str("malformed token"),
            TokenRejection::ClaimMissing(claim) => write!(f, "claim {claim} missing or invalid"),
            TokenRejection::UnknownAccount => f.write_str("account no longer exists"),
            TokenRejection::InactiveAccount => f.write_str("account is deactivated"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Missing authorization header")]
    MissingToken,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken(TokenRejection),

    #[error("{0}")]
    Forbidden(Cow<'static, str>),

    #[error("{} already exists", capitalize(.0))]
    DuplicateIdentity(IdentityField),

    #[error("Account not found")]
    AccountNotFound,

    #[error("{0}")]
    Validation(Cow<'static, str>),

    #[error("{0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    #[error("Password hashing failed")]
    Hashing(#[from] PasswordHashError),

    #[error("Token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Invalid auth configuration: {0}")]
    Configuration(String),

    #[error("Internal error")]
    Internal(String),
}

fn capitalize(field: &IdentityField) -> &'static str {
    match field {
        IdentityField::Email => "Email",
        IdentityField::Username => "Username",
    }
}

impl AuthError {
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        AuthError::Forbidden(message.into())
    }

    pub fn insufficient_permissions() -> Self {
        AuthError::forbidden("Insufficient permissions")
    }

    /// An organisation id that names no stored row.
    pub fn unknown_reference() -> Self {
        AuthError::Validation("Referenced record does not exist".into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::AccountDeactivated
            | AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::InvalidToken(_) => ErrorKind::Unauthorized,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::DuplicateIdentity(_) => ErrorKind::Conflict,
            AuthError::AccountNotFound => ErrorKind::NotFound,
            AuthError::Validation(_) | AuthError::PasswordPolicy(_) => ErrorKind::BadRequest,
            AuthError::Hashing(_)
            | AuthError::Signing(_)
            | AuthError::Database(_)
            | AuthError::Configuration(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The wire error. Server-side failures collapse to a generic message.
    pub fn to_app_error(&self) -> AppError {
        let message: Cow<'static, str> = match self {
            AuthError::Configuration(_) | AuthError::Internal(_) => "Internal error".into(),
            other => other.to_string().into(),
        };
        let err = AppError::new(self.kind(), message);
        match self {
            AuthError::MissingToken | AuthError::MalformedHeader | AuthError::InvalidToken(_) => {
                err.with_action("Send a valid bearer token in the Authorization header")
            }
            AuthError::DuplicateIdentity(_) => err.with_action("Choose a different value"),
            _ => err,
        }
    }

    pub fn log(&self) {
        match self {
            AuthError::Database(e) => tracing::error!(error = %e, "Auth database error"),
            AuthError::Hashing(e) => tracing::error!(error = %e, "Password hashing error"),
            AuthError::Signing(e) => tracing::error!(error = %e, "Token signing error"),
            AuthError::Configuration(msg) | AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error")
            }
            AuthError::InvalidCredentials => tracing::warn!("Invalid login attempt"),
            AuthError::AccountDeactivated => tracing::warn!("Login attempt on deactivated account"),
            AuthError::Forbidden(msg) => tracing::warn!(reason = %msg, "Access denied"),
            AuthError::DuplicateIdentity(field) => {
                tracing::warn!(field = %field, "Registration collision")
            }
            AuthError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Bearer token rejected")
            }
            _ => tracing::debug!(error = %self, "Auth error"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Value objects report through `AppError`; keep their class and message.
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_owned().into()),
            ErrorKind::NotFound => AuthError::AccountNotFound,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}
