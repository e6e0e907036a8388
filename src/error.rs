use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Coarse classification of an [`AppError`], stable enough for a request
/// layer to map onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Forbidden(_) | AppError::InvalidCredentials => ErrorKind::Forbidden,
            AppError::PasswordHashing(_) | AppError::Database(_) | AppError::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The human-readable reason without the kind prefix.
    pub fn reason(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg)
            | AppError::PasswordHashing(msg)
            | AppError::Database(msg) => msg.clone(),
            AppError::InvalidCredentials => "invalid credentials".to_string(),
            AppError::Io(err) => err.to_string(),
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => AppError::NotFound(msg),
            _ => match err {
                DbErr::RecordNotFound(msg) => AppError::NotFound(msg),
                other => AppError::Database(other.to_string()),
            },
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::PasswordHashing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(AppError::InvalidCredentials.kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::Database("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_record_not_found_becomes_not_found() {
        let err: AppError = DbErr::RecordNotFound("recipe 4".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.reason(), "recipe 4");
    }

    #[test]
    fn test_display_carries_reason() {
        let err = AppError::Validation("favorite already exists".into());
        assert_eq!(err.to_string(), "Invalid input: favorite already exists");
    }
}
