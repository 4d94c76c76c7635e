//! Application layer errors.
//!
//! These errors represent failures in orchestration and in the collaborators
//! behind the ports, not business rules. Business rule violations are
//! `DomainError` from `crate::domain`.

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// The image processor could not decode, inspect or encode content.
    #[error("Image processing failed during {operation}: {reason}")]
    Processing {
        operation: &'static str,
        reason: String,
    },

    /// A storage collaborator rejected a write.
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Image store is unavailable")]
    StoreLockError,

    #[error("Invalid page cursor '{cursor}'")]
    InvalidPageCursor { cursor: String },

    #[error("This sequence can only be fetched page by page")]
    FetchAllUnsupported,

    #[error("Image plant '{id}' not found")]
    PlantNotFound { id: String },

    #[error("Template '{name}' not found in image plant '{plant_id}'")]
    TemplateNotFound { plant_id: String, name: String },

    #[error("Image '{image_id}' not found in image plant '{plant_id}'")]
    ImageNotFound { plant_id: String, image_id: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Processing { .. } => vec![
                "Check that the file is a complete JPEG, PNG or BMP image".into(),
                "Re-export the image and try again".into(),
            ],
            Self::StoreLockError => vec![
                "The image store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::InvalidPageCursor { .. } => vec![
                "Start again from the first page".into(),
            ],
            Self::FetchAllUnsupported => vec![
                "Iterate over pages instead of fetching everything".into(),
            ],
            Self::PlantNotFound { id } => vec![
                format!("No image plant with id '{}'", id),
                "Create the plant first".into(),
            ],
            Self::TemplateNotFound { name, .. } => vec![
                format!("No template named '{}' in this plant", name),
                "Template names are case-sensitive".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Processing { .. } => ErrorCategory::Validation,
            Self::Storage { .. } | Self::StoreLockError => ErrorCategory::Internal,
            Self::InvalidPageCursor { .. } | Self::FetchAllUnsupported => {
                ErrorCategory::Validation
            }
            Self::PlantNotFound { .. }
            | Self::TemplateNotFound { .. }
            | Self::ImageNotFound { .. } => ErrorCategory::NotFound,
        }
    }
}
