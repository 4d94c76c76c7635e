use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    lifecycle::{Lifecycle, Tracked},
    value_objects::{AggregateRef, ImageContent, ImageId, ImageMetadata},
    version::Version,
};

/// Persisted shape of an image. Content lives next to it, not in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    pub id: ImageId,
    pub created_at: DateTime<Utc>,
    pub metadata: ImageMetadata,
    pub version: Version,
}

/// What an image repository hands back: the snapshot plus stored content, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub snapshot: ImageSnapshot,
    pub content: Option<ImageContent>,
}

/// An image and its lineage. There is no way to change its content;
/// a different rendition is a different image.
#[derive(Debug, Clone)]
pub struct ImageEntity {
    owner: AggregateRef,
    snapshot: ImageSnapshot,
    content: Option<ImageContent>,
    lifecycle: Lifecycle,
}

impl ImageEntity {
    pub(crate) fn new(
        owner: AggregateRef,
        snapshot: ImageSnapshot,
        content: Option<ImageContent>,
    ) -> Self {
        Self {
            owner,
            snapshot,
            content,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn id(&self) -> &ImageId {
        &self.snapshot.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.snapshot.created_at
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.snapshot.metadata
    }

    pub fn version(&self) -> &Version {
        &self.snapshot.version
    }

    pub fn content(&self) -> Option<&ImageContent> {
        self.content.as_ref()
    }

    pub fn owner(&self) -> &AggregateRef {
        &self.owner
    }

    pub fn snapshot(&self) -> &ImageSnapshot {
        &self.snapshot
    }

    pub fn to_record(&self) -> ImageRecord {
        ImageRecord {
            snapshot: self.snapshot.clone(),
            content: self.content.clone(),
        }
    }

    pub(crate) fn mark_as_new(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_new(&label)
    }

    pub fn mark_as_clean(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_clean(&label)
    }
}

impl Tracked for ImageEntity {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl fmt::Display for ImageEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image {}", self.snapshot.id)
    }
}
