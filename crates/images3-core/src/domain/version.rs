use std::fmt;

use serde::{Deserialize, Serialize};

/// Lineage of an image: the template that produced it and, for derived
/// images, the original image it was resized from.
///
/// `(template_name, original_image_id)` is unique within an image plant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_image_id: Option<String>,
}

impl Version {
    /// Version of an uploaded image.
    pub fn original(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            original_image_id: None,
        }
    }

    /// Version of an image resized from `original_image_id`.
    pub fn derived(template_name: impl Into<String>, original_image_id: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            original_image_id: Some(original_image_id.into()),
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn original_image_id(&self) -> Option<&str> {
        self.original_image_id.as_deref()
    }

    pub fn is_original(&self) -> bool {
        self.original_image_id.is_none()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original_image_id {
            Some(original) => write!(f, "{}({})", self.template_name, original),
            None => f.write_str(&self.template_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_has_no_lineage() {
        let v = Version::original("Master");
        assert!(v.is_original());
        assert_eq!(v.original_image_id(), None);
        assert_eq!(v.to_string(), "Master");
    }

    #[test]
    fn derived_versions_compare_by_pair() {
        let a = Version::derived("Thumb", "img-1");
        assert!(!a.is_original());
        assert_eq!(a, Version::derived("Thumb", "img-1"));
        assert_ne!(a, Version::derived("Thumb", "img-2"));
        assert_ne!(a, Version::derived("Banner", "img-1"));
        assert_eq!(a.to_string(), "Thumb(img-1)");
    }

    #[test]
    fn original_serialises_without_lineage_field() {
        let json = serde_json::to_string(&Version::original("Master")).unwrap();
        assert_eq!(json, r#"{"template_name":"Master"}"#);
    }
}
