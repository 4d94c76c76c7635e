use crate::domain::error::DomainError;

const MAX_NAME_LEN: usize = 128;

/// Centralized domain validation.
///
/// Name rules live here, not scattered across entities and factories.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_plant_name(name: &str) -> Result<(), DomainError> {
        Self::validate_name("image plant name", name)
    }

    pub fn validate_template_name(name: &str) -> Result<(), DomainError> {
        Self::validate_name("template name", name)
    }

    fn validate_name(field: &'static str, name: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidName {
            field,
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("must not be blank"));
        }
        if name.trim() != name {
            return Err(invalid("must not start or end with whitespace"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(invalid("is longer than 128 characters"));
        }
        if name.contains('/') || name.chars().any(char::is_control) {
            return Err(invalid("contains '/' or a control character"));
        }
        Ok(())
    }
}
