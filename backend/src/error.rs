use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// RepoError
///
/// Failures reported by a repository adapter. The service layer wraps these and only
/// reclassifies them where a domain rule asks for it (missing references, unique names).
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::UniqueViolation(db.constraint().unwrap_or_default().to_string())
            }
            other => RepoError::Database(other),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// ServiceError
///
/// The closed error taxonomy of the resource services. Handlers turn it into a transport
/// response with a single exhaustive match (see `IntoResponse` below).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Client-supplied data broke a domain rule.
    #[error("{message}")]
    Validation { message: String },
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// A unique field (username, topic name) collided.
    #[error("{field} already in use")]
    AlreadyInUse { field: &'static str },
    /// The acting identity does not own the resource.
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error")]
    Internal(#[source] RepoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
        }
    }

    /// Lookup helper: a repository `NotFound` becomes a typed `NotFound` for `entity`,
    /// anything else is internal.
    pub fn lookup(entity: &'static str, id: i64) -> impl FnOnce(RepoError) -> Self {
        move |err| match err {
            RepoError::NotFound => ServiceError::NotFound { entity, id },
            other => ServiceError::Internal(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::AlreadyInUse { .. } => StatusCode::CONFLICT,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        ServiceError::Internal(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ServiceError::Internal(source) => {
                // Logged here, never echoed to the client.
                tracing::error!(error = ?source, "internal service failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// ConfigError
///
/// Raised by `AppConfig::load` when the environment is incomplete or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}
