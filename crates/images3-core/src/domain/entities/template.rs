//! Template entity: a named resizing configuration inside an image plant.
//!
//! ```text
//! TemplateEntity
//! ├── owner: AggregateRef        root instance that produced it
//! ├── snapshot: TemplateSnapshot persisted shape
//! │   ├── id (plant id + name)   immutable
//! │   ├── archived               toggled by archive()/unarchive()
//! │   ├── removable              fixed by the factory
//! │   └── resizing_config
//! └── lifecycle                  NEW / CLEAN / DIRTY / VOID
//! ```
//!
//! Entities only track their own life-cycle. Ownership, removability and
//! naming rules are enforced by [`ImagePlantRoot`](super::ImagePlantRoot).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    lifecycle::{Lifecycle, Tracked},
    value_objects::{AggregateRef, ResizingConfig, TemplateId},
};

/// Persisted shape of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    pub id: TemplateId,
    pub archived: bool,
    pub removable: bool,
    pub resizing_config: ResizingConfig,
}

#[derive(Debug, Clone)]
pub struct TemplateEntity {
    owner: AggregateRef,
    snapshot: TemplateSnapshot,
    lifecycle: Lifecycle,
}

impl TemplateEntity {
    pub(crate) fn new(owner: AggregateRef, snapshot: TemplateSnapshot) -> Self {
        Self {
            owner,
            snapshot,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn id(&self) -> &TemplateId {
        &self.snapshot.id
    }

    pub fn name(&self) -> &str {
        self.snapshot.id.name()
    }

    pub fn is_archived(&self) -> bool {
        self.snapshot.archived
    }

    pub fn is_removable(&self) -> bool {
        self.snapshot.removable
    }

    pub fn resizing_config(&self) -> &ResizingConfig {
        &self.snapshot.resizing_config
    }

    pub fn owner(&self) -> &AggregateRef {
        &self.owner
    }

    pub fn snapshot(&self) -> &TemplateSnapshot {
        &self.snapshot
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        self.set_archived(true)
    }

    pub fn unarchive(&mut self) -> Result<(), DomainError> {
        self.set_archived(false)
    }

    fn set_archived(&mut self, archived: bool) -> Result<(), DomainError> {
        self.lifecycle.ensure_not_void(self)?;
        if self.snapshot.archived == archived {
            return Ok(());
        }
        self.snapshot.archived = archived;
        let label = self.to_string();
        self.lifecycle.mark_as_dirty(&label)
    }

    /// Flags the template for an update without changing it.
    pub(crate) fn touch(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_dirty(&label)
    }

    pub(crate) fn mark_as_new(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_new(&label)
    }

    pub(crate) fn mark_as_void(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_void(&label)
    }

    /// Persistence hook: the stored row now matches this instance.
    pub fn mark_as_clean(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_clean(&label)
    }
}

impl Tracked for TemplateEntity {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl fmt::Display for TemplateEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template {}", self.snapshot.id)
    }
}
