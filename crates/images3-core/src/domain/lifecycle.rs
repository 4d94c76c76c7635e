//! Persistence intent of aggregate members.
//!
//! ```text
//!   constructed ──mark_as_new──▶ NEW ─┐
//!        │                            │ mark_as_clean
//!        └──────── CLEAN ◀────────────┘
//!                  │   ▲
//!       mutation   ▼   │ mark_as_clean
//!                  DIRTY
//!
//!   NEW | CLEAN | DIRTY ──mark_as_void──▶ VOID (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    New,
    #[default]
    Clean,
    Dirty,
    Void,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Clean => "CLEAN",
            Self::Dirty => "DIRTY",
            Self::Void => "VOID",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Life-cycle tracker embedded in every aggregate member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lifecycle {
    state: LifecycleState,
    transitioned: bool,
}

impl Lifecycle {
    /// A freshly constructed member: CLEAN, no transition yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == LifecycleState::New
    }

    pub fn is_dirty(&self) -> bool {
        self.state == LifecycleState::Dirty
    }

    pub fn is_void(&self) -> bool {
        self.state == LifecycleState::Void
    }

    /// Only valid straight after construction.
    pub(crate) fn mark_as_new(&mut self, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        if self.transitioned || self.state != LifecycleState::Clean {
            return Err(self.rejected(entity, LifecycleState::New));
        }
        self.set(entity, LifecycleState::New);
        Ok(())
    }

    /// Records a state-changing operation.
    ///
    /// CLEAN becomes DIRTY; NEW and DIRTY are left as they are.
    pub(crate) fn mark_as_dirty(&mut self, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        self.ensure_not_void(entity)?;
        if self.state == LifecycleState::Clean {
            self.set(entity, LifecycleState::Dirty);
        }
        Ok(())
    }

    pub(crate) fn mark_as_void(&mut self, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        self.ensure_not_void(entity)?;
        self.set(entity, LifecycleState::Void);
        Ok(())
    }

    /// Called by persistence once an insert or update went through.
    pub fn mark_as_clean(&mut self, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        if self.is_void() {
            return Err(self.rejected(entity, LifecycleState::Clean));
        }
        self.set(entity, LifecycleState::Clean);
        Ok(())
    }

    pub fn ensure_not_void(&self, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        if self.is_void() {
            return Err(DomainError::VoidEntityMutation {
                entity: entity.to_string(),
            });
        }
        Ok(())
    }

    fn set(&mut self, entity: &dyn fmt::Display, to: LifecycleState) {
        if self.state != to {
            debug!(entity = %entity, from = %self.state, to = %to, "Life-cycle transition");
        }
        self.state = to;
        self.transitioned = true;
    }

    fn rejected(&self, entity: &dyn fmt::Display, to: LifecycleState) -> DomainError {
        DomainError::InvalidLifecycleTransition {
            entity: entity.to_string(),
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}

/// Anything whose persistence intent is tracked.
pub trait Tracked {
    fn lifecycle(&self) -> &Lifecycle;

    fn state(&self) -> LifecycleState {
        self.lifecycle().state()
    }

    fn is_new(&self) -> bool {
        self.lifecycle().is_new()
    }

    fn is_dirty(&self) -> bool {
        self.lifecycle().is_dirty()
    }

    fn is_void(&self) -> bool {
        self.lifecycle().is_void()
    }
}
