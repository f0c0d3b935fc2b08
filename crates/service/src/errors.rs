use models::errors::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The request clashes with current data: stale row version, duplicate
    /// key, dependent records.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A slot's planned allocation or an employee's ceiling would be exceeded.
    #[error("over-allocated: {0}")]
    OverAllocated(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    Db(String),
    /// A bug on our side rather than bad input or a database failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }

    pub fn transition<S: std::fmt::Debug>(entity: &str, from: S, to: S) -> Self {
        Self::InvalidState(format!("{entity} cannot move from {from:?} to {to:?}"))
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Duplicate(msg) => ServiceError::Conflict(format!("duplicate value: {msg}")),
            ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self { ServiceError::Internal(format!("json encoding failed: {e}")) }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(format!("duplicate value: {msg}")),
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => ServiceError::Conflict(format!("referenced record missing or in use: {msg}")),
            _ => ServiceError::Db(e.to_string()),
        }
    }
}
