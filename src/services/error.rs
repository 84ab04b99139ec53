use std::fmt;
use thiserror::Error;

use tower_sessions::{session, session_store};

use crate::auth::{PasswordError, TokenError};
use crate::database::DatabaseError;

/// One violated input constraint, keyed by the API field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint an input violated, collected before failing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} {}", sep, e.field, e.message)?;
        }
        Ok(())
    }
}

/// Domain error taxonomy shared by all services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("User already exists with this email")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No file uploaded")]
    NoFile,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File exceeds the {limit} byte limit")]
    FileTooLarge { limit: usize },

    #[error("Could not log out: {0}")]
    SessionTeardown(#[source] session::Error),

    #[error("Session error: {0}")]
    Session(#[from] session::Error),

    #[error("Session store error: {0}")]
    SessionStore(#[from] session_store::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Upload storage error: {0}")]
    UploadStorage(#[source] std::io::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ServiceError::Validation(errors)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "is required");
        errors.add("contentUrl", "is required");

        assert!(errors.has_field("title"));
        assert!(errors.has_field("contentUrl"));
        assert_eq!(
            errors.to_string(),
            "Validation failed: title is required; contentUrl is required"
        );
        assert!(matches!(errors.into_result(), Err(ServiceError::Validation(e)) if e.iter().count() == 2));
    }

    #[test]
    fn empty_errors_pass() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
