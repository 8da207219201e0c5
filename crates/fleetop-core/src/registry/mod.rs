//! Operator-instance registry: the persistence contract for deployment
//! records.
//!
//! One [`OperatorInstance`] tracks one deployment of an adapter on a
//! device. Records exist exactly as long as the deployment does: they
//! are created by a successful deploy, mutated by start/stop/probe
//! outcomes, and deleted by a successful undeploy — all driven by the
//! [reconciliation engine](crate::reconcile). The registry itself holds
//! no business logic and enforces no uniqueness beyond the record id;
//! deduplication policy belongs to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{AdapterId, DeviceId, InstanceId};

/// Availability state of an operator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    /// State has not been probed yet.
    Unknown,
    /// The operator is not running.
    Stopped,
    /// The operator is running.
    Running,
}

impl InstanceState {
    /// String form of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

/// The runtime record of one adapter deployment on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorInstance {
    /// Registry-assigned id, immutable after creation.
    pub id: InstanceId,

    /// Display label, taken from the adapter name at creation time.
    pub name: String,

    /// Current availability state.
    pub state: InstanceState,

    /// The adapter deployed. Referenced, not owned.
    pub adapter: AdapterId,

    /// The device deployed onto. Referenced, not owned.
    pub device: DeviceId,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl OperatorInstance {
    /// Create a record with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        state: InstanceState,
        adapter: AdapterId,
        device: DeviceId,
    ) -> Self {
        Self {
            id: InstanceId::generate(),
            name: name.into(),
            state,
            adapter,
            device,
            created_at: Utc::now(),
        }
    }
}

/// Errors raised by registry operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// `save` was called for an id the registry has never seen.
    #[error("unknown instance id: {id}")]
    UnknownInstance {
        /// The unknown id.
        id: InstanceId,
    },
}

/// Storage contract for operator-instance records.
///
/// Implementations must keep a stable iteration order: the engine's
/// first-match lookup and the state query both take the first record
/// `find_by_device` yields.
pub trait InstanceRegistry: Send + Sync {
    /// Ids of all instances on the given device, in registry iteration
    /// order.
    fn find_by_device(&self, device: &DeviceId) -> Vec<InstanceId>;

    /// Fetch a record by id.
    fn get(&self, id: &InstanceId) -> Option<OperatorInstance>;

    /// Store a new record under its id, returning the assigned id.
    fn insert(&mut self, instance: OperatorInstance) -> InstanceId;

    /// Update an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownInstance`] if no record with the
    /// instance's id exists. Logical update only, never an upsert.
    fn save(&mut self, instance: OperatorInstance) -> Result<(), RegistryError>;

    /// Remove a record, returning it if it existed.
    fn delete(&mut self, id: &InstanceId) -> Option<OperatorInstance>;
}

/// In-memory registry backed by a map plus an insertion-order index.
///
/// The index makes "first match" deterministic: `find_by_device` yields
/// ids in the order the records were inserted.
#[derive(Debug, Default)]
pub struct InMemoryInstanceRegistry {
    records: std::collections::HashMap<InstanceId, OperatorInstance>,
    order: Vec<InstanceId>,
}

impl InMemoryInstanceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorInstance> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }
}

impl InstanceRegistry for InMemoryInstanceRegistry {
    fn find_by_device(&self, device: &DeviceId) -> Vec<InstanceId> {
        self.iter()
            .filter(|instance| &instance.device == device)
            .map(|instance| instance.id.clone())
            .collect()
    }

    fn get(&self, id: &InstanceId) -> Option<OperatorInstance> {
        self.records.get(id).cloned()
    }

    fn insert(&mut self, instance: OperatorInstance) -> InstanceId {
        let id = instance.id.clone();
        if self.records.insert(id.clone(), instance).is_none() {
            self.order.push(id.clone());
        }
        id
    }

    fn save(&mut self, instance: OperatorInstance) -> Result<(), RegistryError> {
        let slot = self
            .records
            .get_mut(&instance.id)
            .ok_or_else(|| RegistryError::UnknownInstance {
                id: instance.id.clone(),
            })?;
        *slot = instance;
        Ok(())
    }

    fn delete(&mut self, id: &InstanceId) -> Option<OperatorInstance> {
        let removed = self.records.remove(id);
        if removed.is_some() {
            self.order.retain(|ordered| ordered != id);
        }
        removed
    }
}
