use axum::http::StatusCode;
use thiserror::Error;

/// Input that cannot become an entry or a filter. Always the caller's fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required (missing {0})")]
    MissingField(&'static str),
    #[error("invalid time: {0:?}")]
    InvalidTime(String),
    #[error("invalid datetime filter: {0:?}")]
    InvalidAnchor(String),
    #[error("invalid direction: {0:?}")]
    InvalidDirection(String),
}

/// The entry store could not be reached or refused the operation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(err.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Migrate(_)
            | AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
