//! Reconciliation engine: maps remote outcomes onto registry mutations.
//!
//! Given a component and the gateway's outcome for one operation, the
//! engine decides how the operator-instance registry changes:
//!
//! ```text
//! deploy   Created  -> insert new record, state = stopped
//! undeploy Ok       -> delete first matching record
//! start    Created  -> first matching record, state = running
//! stop     Ok       -> first matching record, state = stopped
//! probe    Ok(b)    -> first matching record, state = running/stopped
//! ```
//!
//! A failed outcome mutates nothing. A lookup that matches no record is
//! a silent skip, not an error: state updates are best-effort when no
//! instance record exists. Deploy never checks for an existing record,
//! so repeated successful deploys produce duplicate records.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::Adapter;
use crate::component::Component;
use crate::gateway::{DeployOutcome, ProbeOutcome, StartOutcome, StopOutcome, UndeployOutcome};
use crate::id::InstanceId;
use crate::registry::{InstanceRegistry, InstanceState, OperatorInstance};

/// How the engine locates the instance record for a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Legacy behavior: the first record on the component's device,
    /// regardless of which adapter it belongs to. With several operator
    /// instances on one device this can pick a record of a different
    /// adapter.
    #[default]
    FirstMatch,

    /// Corrected behavior: the first record matching both the device
    /// and the component's adapter.
    DeviceAndAdapter,
}

/// The reconciliation engine.
///
/// Stateless apart from its lookup policy; all record state lives in
/// the [`InstanceRegistry`] passed to each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine {
    policy: LookupPolicy,
}

impl ReconciliationEngine {
    /// Create an engine with the given lookup policy.
    #[must_use]
    pub const fn new(policy: LookupPolicy) -> Self {
        Self { policy }
    }

    /// The configured lookup policy.
    #[must_use]
    pub const fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Record the outcome of a deploy.
    ///
    /// On success, inserts a fresh record in state
    /// [`InstanceState::Stopped`] named after the adapter and returns
    /// its id. No existence check is made first: a repeated successful
    /// deploy inserts a second record.
    pub fn record_deploy(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        adapter: &Adapter,
        outcome: &DeployOutcome,
    ) -> Option<InstanceId> {
        if !outcome.is_success() {
            return None;
        }

        let instance = OperatorInstance::new(
            adapter.name.clone(),
            InstanceState::Stopped,
            adapter.id.clone(),
            component.device_id().clone(),
        );
        let id = registry.insert(instance);
        debug!(
            instance = %id,
            device = %component.device_id(),
            adapter = %adapter.id,
            "instance record created"
        );
        Some(id)
    }

    /// Record the outcome of an undeploy.
    ///
    /// On success, deletes the first matching record and returns its
    /// id. With no matching record the registry is left unchanged and
    /// no error is raised.
    pub fn record_undeploy(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        outcome: &UndeployOutcome,
    ) -> Option<InstanceId> {
        if !outcome.is_success() {
            return None;
        }

        let Some(instance) = self.first_match(registry, component) else {
            debug!(device = %component.device_id(), "undeploy matched no instance record");
            return None;
        };
        let id = instance.id.clone();
        registry.delete(&id);
        debug!(instance = %id, device = %component.device_id(), "instance record deleted");
        Some(id)
    }

    /// Record the outcome of a start.
    ///
    /// On success, transitions the first matching record to
    /// [`InstanceState::Running`]. Silent skip when nothing matches.
    pub fn record_start(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        outcome: &StartOutcome,
    ) -> Option<InstanceId> {
        if !outcome.is_success() {
            return None;
        }
        self.set_first_match_state(registry, component, InstanceState::Running)
    }

    /// Record the outcome of a stop.
    ///
    /// On success, transitions the first matching record to
    /// [`InstanceState::Stopped`]. Silent skip when nothing matches.
    pub fn record_stop(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        outcome: &StopOutcome,
    ) -> Option<InstanceId> {
        if !outcome.is_success() {
            return None;
        }
        self.set_first_match_state(registry, component, InstanceState::Stopped)
    }

    /// Record the outcome of a running-state probe.
    ///
    /// On success, synchronizes the first matching record with the
    /// probed state. Silent skip when nothing matches.
    pub fn record_probe(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        outcome: &ProbeOutcome,
    ) -> Option<InstanceId> {
        let ProbeOutcome::Ok(running) = outcome else {
            return None;
        };
        let state = if *running {
            InstanceState::Running
        } else {
            InstanceState::Stopped
        };
        self.set_first_match_state(registry, component, state)
    }

    /// Scan the component's device for instance records and return the
    /// first one admitted by the lookup policy. Scanning stops at the
    /// first match.
    fn first_match(
        &self,
        registry: &dyn InstanceRegistry,
        component: &Component,
    ) -> Option<OperatorInstance> {
        registry
            .find_by_device(component.device_id())
            .iter()
            .filter_map(|id| registry.get(id))
            .find(|instance| match self.policy {
                LookupPolicy::FirstMatch => true,
                LookupPolicy::DeviceAndAdapter => &instance.adapter == component.adapter_id(),
            })
    }

    fn set_first_match_state(
        &self,
        registry: &mut dyn InstanceRegistry,
        component: &Component,
        state: InstanceState,
    ) -> Option<InstanceId> {
        let Some(mut instance) = self.first_match(registry, component) else {
            debug!(
                device = %component.device_id(),
                target_state = state.as_str(),
                "state update matched no instance record"
            );
            return None;
        };

        let id = instance.id.clone();
        instance.state = state;
        if let Err(error) = registry.save(instance) {
            // The record was just fetched under the same borrow, so a
            // failed save means the registry contract is broken.
            warn!(instance = %id, %error, "instance record vanished during state update");
            return None;
        }
        debug!(instance = %id, state = state.as_str(), "instance state updated");
        Some(id)
    }
}
