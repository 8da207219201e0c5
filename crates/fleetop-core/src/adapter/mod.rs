//! Adapter model: a named bundle of executable routines.
//!
//! An adapter packages everything needed to realize a sensor or actuator
//! on a device: a set of named routines (install/start/stop scripts), a
//! dedicated service routine used to probe running status, and the
//! deployment parameters the operator accepts at start time.

pub mod parameters;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::AdapterId;
use parameters::Parameter;

/// A named executable routine belonging to an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    /// File name of the routine, unique within its adapter.
    pub name: String,

    /// Script content.
    pub content: String,
}

impl Routine {
    /// Create a routine from a name and its script content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Errors raised by adapter routine management.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdapterError {
    /// A routine with the same file name already exists on the adapter.
    #[error("duplicate routine name: {name}")]
    DuplicateRoutine {
        /// The colliding file name.
        name: String,
    },

    /// No routine with the given file name exists on the adapter.
    #[error("no such routine: {name}")]
    RoutineNotFound {
        /// The missing file name.
        name: String,
    },
}

/// An operator package deployable onto a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adapter {
    /// Adapter id.
    pub id: AdapterId,

    /// Globally unique display name. New operator instances take this
    /// name at creation time.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// Routine used to query whether the operator is running.
    pub service: Routine,

    /// Deployment routines (install/start/stop and friends), ordered,
    /// with names unique within the adapter.
    routines: Vec<Routine>,

    /// Deployment parameters the operator accepts when started.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Adapter {
    /// Create an adapter with no routines or parameters.
    pub fn new(
        id: impl Into<AdapterId>,
        name: impl Into<String>,
        description: impl Into<String>,
        service: Routine,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            service,
            routines: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Add a routine to the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateRoutine`] if a routine with the
    /// same file name is already present. Never a silent no-op.
    pub fn add_routine(&mut self, routine: Routine) -> Result<(), AdapterError> {
        if self.routines.iter().any(|r| r.name == routine.name) {
            return Err(AdapterError::DuplicateRoutine { name: routine.name });
        }
        self.routines.push(routine);
        Ok(())
    }

    /// Look up a routine by file name.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::RoutineNotFound`] if no routine has the
    /// given name.
    pub fn routine(&self, name: &str) -> Result<&Routine, AdapterError> {
        self.routines
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| AdapterError::RoutineNotFound {
                name: name.to_string(),
            })
    }

    /// Remove a routine by file name, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::RoutineNotFound`] if no routine has the
    /// given name. Never a silent no-op.
    pub fn remove_routine(&mut self, name: &str) -> Result<Routine, AdapterError> {
        let position = self.routines.iter().position(|r| r.name == name).ok_or_else(|| {
            AdapterError::RoutineNotFound {
                name: name.to_string(),
            }
        })?;
        Ok(self.routines.remove(position))
    }

    /// Whether the adapter carries any deployment routines.
    #[must_use]
    pub fn has_routines(&self) -> bool {
        !self.routines.is_empty()
    }

    /// The deployment routines in insertion order.
    #[must_use]
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }
}
