// ============================================================================
// domain/error.rs - INVARIANT VIOLATIONS OF THE IMAGE PLANT AGGREGATE
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Synchronous and non-retryable (an invariant was violated)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid {field}: {reason}")]
    InvalidName { field: &'static str, reason: String },

    #[error("Invalid resizing config: {0}")]
    InvalidResizingConfig(String),

    #[error("Invalid time interval: {0}")]
    InvalidTimeInterval(String),

    #[error("Image '{image_id}' has an unsupported format")]
    UnsupportedImageFormat { image_id: String },

    // ========================================================================
    // Conflict Errors (409-level equivalent)
    // ========================================================================
    #[error("Image plant name '{name}' is already taken")]
    DuplicatePlantName { name: String },

    #[error("Template '{name}' already exists in image plant '{plant_id}'")]
    DuplicateTemplateName { plant_id: String, name: String },

    #[error(
        "Image plant '{plant_id}' already has a version of image '{original_image_id}' \
         for template '{template_name}'"
    )]
    DuplicateVersion {
        plant_id: String,
        template_name: String,
        original_image_id: String,
    },

    #[error("Template '{template_id}' cannot be removed")]
    UnremovableTemplate { template_id: String },

    #[error("Template '{template_id}' is the bootstrap template and cannot be archived")]
    InactiveBootstrapTemplate { template_id: String },

    // ========================================================================
    // Aggregate Boundary Violations
    // ========================================================================
    #[error("{entity} belongs to aggregate {owner}, not {root}")]
    ForeignEntity {
        entity: String,
        owner: String,
        root: String,
    },

    #[error("{entity} is void and cannot be modified")]
    VoidEntityMutation { entity: String },

    #[error("{entity} cannot move from {from} to {to}")]
    InvalidLifecycleTransition {
        entity: String,
        from: String,
        to: String,
    },

    // ========================================================================
    // Reconstitution
    // ========================================================================
    #[error("Missing {entity} snapshot at position {index}")]
    MissingSnapshot { entity: &'static str, index: usize },

    #[error("Image '{image_id}' has no content to derive from")]
    MissingImageContent { image_id: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidName { field, .. } => vec![
                format!("Provide a non-blank {}", field),
                "Names may not contain '/' or control characters".into(),
            ],
            Self::InvalidResizingConfig(msg) => vec![
                "Width and height must both be greater than zero".into(),
                format!("Details: {}", msg),
            ],
            Self::DuplicatePlantName { name } => vec![
                format!("An image plant called '{}' already exists", name),
                "Choose a different name or reuse the existing plant".into(),
            ],
            Self::DuplicateTemplateName { name, .. } => vec![
                format!("Template '{}' already exists in this plant", name),
                "Fetch the existing template instead of creating it".into(),
            ],
            Self::DuplicateVersion { template_name, .. } => vec![
                format!("The '{}' version of this image already exists", template_name),
                "Fetch it by version instead of generating it again".into(),
            ],
            Self::UnremovableTemplate { .. } => vec![
                "The bootstrap template of a plant can never be removed".into(),
                "Archive other templates instead".into(),
            ],
            Self::InactiveBootstrapTemplate { .. } => vec![
                "The bootstrap template resizes every upload and must stay active".into(),
            ],
            Self::UnsupportedImageFormat { .. } => vec![
                "Supported formats: JPEG, PNG, BMP".into(),
            ],
            Self::ForeignEntity { .. } => vec![
                "Entities must be changed through the image plant that produced them".into(),
                "Fetch the entity again through this plant".into(),
            ],
            Self::VoidEntityMutation { .. } => vec![
                "The entity has been removed in this unit of work".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. }
            | Self::InvalidResizingConfig(_)
            | Self::InvalidTimeInterval(_)
            | Self::UnsupportedImageFormat { .. } => ErrorCategory::Validation,
            Self::DuplicatePlantName { .. }
            | Self::DuplicateTemplateName { .. }
            | Self::DuplicateVersion { .. }
            | Self::UnremovableTemplate { .. }
            | Self::InactiveBootstrapTemplate { .. } => ErrorCategory::Conflict,
            Self::ForeignEntity { .. }
            | Self::VoidEntityMutation { .. }
            | Self::InvalidLifecycleTransition { .. } => ErrorCategory::Boundary,
            Self::MissingSnapshot { .. } | Self::MissingImageContent { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// `true` for both plant-level and template-level name clashes.
    pub fn is_duplicate_name(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePlantName { .. } | Self::DuplicateTemplateName { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Boundary,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_conflicts() {
        let err = DomainError::DuplicateTemplateName {
            plant_id: "p1".into(),
            name: "Thumb".into(),
        };
        assert!(err.is_duplicate_name());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn void_mutation_is_a_boundary_error() {
        let err = DomainError::VoidEntityMutation {
            entity: "template p1/Thumb".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Boundary);
        assert!(!err.is_duplicate_name());
    }

    #[test]
    fn unremovable_template_suggests_archiving() {
        let err = DomainError::UnremovableTemplate {
            template_id: "p1/Master".into(),
        };
        assert!(err.suggestions().iter().any(|s| s.contains("Archive")));
    }
}
