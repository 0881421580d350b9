use axum::http::StatusCode;
use thiserror::Error;

use crate::users::validation::FieldError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("a user cannot follow themselves")]
    SelfFollow,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {}", join_messages(.0))]
    Invalid(Vec<FieldError>),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return ServiceError::ConstraintViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                };
            }
            // a referenced user was deleted while its token was still valid
            if db.is_foreign_key_violation() {
                return ServiceError::NotFound("user");
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return ServiceError::NotFound("row");
        }
        ServiceError::Database(err)
    }
}

/// Handlers answer with `(StatusCode, String)`; this keeps `?` usable there.
impl From<ServiceError> for (StatusCode, String) {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, join_messages(&errors))
            }
            ServiceError::ConstraintViolation { .. } => (StatusCode::CONFLICT, err.to_string()),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            ServiceError::SelfFollow => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ServiceResult<T> = Result<T, ServiceError>;
