//! Unified error handling for images3 core.
//!
//! Wraps domain and application errors behind a single type so adapters and
//! the CLI can report suggestions and categories without knowing the layer
//! the failure came from.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{self, DomainError};

/// Root error type for images3 core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Images3Error {
    /// Business rule violations.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Orchestration or collaborator failures.
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl Images3Error {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your configuration file and IMAGES3_* variables".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in images3".into()],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category().into(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::StoreLockError))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Boundary,
    NotFound,
    Configuration,
    Internal,
}

impl From<domain::ErrorCategory> for ErrorCategory {
    fn from(category: domain::ErrorCategory) -> Self {
        match category {
            domain::ErrorCategory::Validation => Self::Validation,
            domain::ErrorCategory::Conflict => Self::Conflict,
            domain::ErrorCategory::Boundary => Self::Boundary,
            domain::ErrorCategory::Internal => Self::Internal,
        }
    }
}

/// Convenient result type alias.
pub type Images3Result<T> = Result<T, Images3Error>;

/// Extension trait for adding context to foreign errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> Images3Result<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> Images3Result<T> {
        self.map_err(|e| Images3Error::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
