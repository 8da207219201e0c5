//! Deployment service: the logical operation surface.
//!
//! One call of each operation is a synchronous unit of work end-to-end:
//! resolve the component and its adapter and device, invoke the remote
//! gateway, and on success let the [`ReconciliationEngine`] mutate the
//! instance registry. Transport concerns (HTTP, auth) live outside this
//! crate.
//!
//! The registry sits behind a `tokio` read-write lock, but the gateway
//! call runs outside of it. Two concurrent operations on the same
//! device can therefore interleave between the remote call and the
//! registry mutation; enable
//! [`serialize_per_device`](crate::config::ReconcileConfig::serialize_per_device)
//! to hold a per-device mutex across whole operations instead.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::info;

use crate::adapter::parameters::{self, ParameterInstance, ParameterType};
use crate::adapter::Adapter;
use crate::component::Component;
use crate::config::FleetopConfig;
use crate::device::Device;
use crate::gateway::{
    DeployOutcome, ProbeOutcome, RemoteGateway, RemoteTarget, StartOutcome, StopOutcome,
    UndeployOutcome,
};
use crate::id::{AdapterId, ComponentId, DeviceId};
use crate::reconcile::ReconciliationEngine;
use crate::registry::{InMemoryInstanceRegistry, InstanceRegistry, InstanceState};

/// Error kinds surfaced to callers of the deployment operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OperationError {
    /// The component, a referenced entity, or the remote target is
    /// absent.
    #[error("not found: {what}")]
    NotFound {
        /// What was missing.
        what: String,
    },

    /// An external policy layer denied the operation.
    #[error("operation forbidden by remote policy")]
    Forbidden,

    /// The supplied deployment parameters were rejected.
    #[error("invalid deployment parameters: {reason}")]
    InvalidParameters {
        /// Why the parameters were rejected.
        reason: String,
    },

    /// Remote I/O failed.
    #[error("remote i/o error: {message}")]
    RemoteIo {
        /// The underlying failure.
        message: String,
    },

    /// An unclassified failure.
    #[error("unknown deployment error")]
    Unknown,
}

/// Resolver for the entities deployment operations act on.
///
/// Entity CRUD is out of scope for this crate; the catalog is the
/// boundary it is consumed through. The in-memory implementation below
/// is populated up front and read-only afterwards.
#[derive(Debug, Default)]
pub struct Catalog {
    components: HashMap<ComponentId, Component>,
    adapters: HashMap<AdapterId, Adapter>,
    devices: HashMap<DeviceId, Device>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    pub fn add_component(&mut self, component: Component) {
        self.components.insert(component.id().clone(), component);
    }

    /// Register an adapter.
    pub fn add_adapter(&mut self, adapter: Adapter) {
        self.adapters.insert(adapter.id.clone(), adapter);
    }

    /// Register a device.
    pub fn add_device(&mut self, device: Device) {
        self.devices.insert(device.id.clone(), device);
    }

    /// Look up a component.
    #[must_use]
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Look up an adapter.
    #[must_use]
    pub fn adapter(&self, id: &AdapterId) -> Option<&Adapter> {
        self.adapters.get(id)
    }

    /// Look up a device.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }
}

/// The deployment API surface over a gateway and an instance registry.
pub struct DeploymentService<G, R = InMemoryInstanceRegistry> {
    catalog: Catalog,
    gateway: G,
    engine: ReconciliationEngine,
    registry: Arc<RwLock<R>>,
    serialize_per_device: bool,
    device_locks: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl<G: RemoteGateway> DeploymentService<G> {
    /// Create a service over a fresh in-memory registry.
    #[must_use]
    pub fn new(catalog: Catalog, gateway: G, config: &FleetopConfig) -> Self {
        Self::with_registry(catalog, gateway, config, InMemoryInstanceRegistry::new())
    }
}

impl<G: RemoteGateway, R: InstanceRegistry> DeploymentService<G, R> {
    /// Create a service over an existing registry.
    #[must_use]
    pub fn with_registry(catalog: Catalog, gateway: G, config: &FleetopConfig, registry: R) -> Self {
        Self {
            catalog,
            gateway,
            engine: ReconciliationEngine::new(config.reconcile.lookup_policy),
            registry: Arc::new(RwLock::new(registry)),
            serialize_per_device: config.reconcile.serialize_per_device,
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the underlying registry.
    #[must_use]
    pub fn registry(&self) -> Arc<RwLock<R>> {
        Arc::clone(&self.registry)
    }

    /// The remote gateway in use.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Deploy a component onto its device.
    ///
    /// Success implies a new instance record exists in state
    /// [`InstanceState::Stopped`]. No existence check is made first;
    /// deploying an already-deployed component creates a second record.
    ///
    /// # Errors
    ///
    /// Returns the gateway's failure mapped onto [`OperationError`], or
    /// [`OperationError::NotFound`] if the component cannot be resolved.
    pub async fn deploy_component(&self, id: &ComponentId) -> Result<(), OperationError> {
        let (component, adapter, device) = self.resolve(id)?;
        let _guard = self.device_guard(component.device_id()).await;

        let outcome = self
            .gateway
            .deploy(RemoteTarget {
                component,
                adapter,
                device,
            })
            .await;

        {
            let mut registry = self.registry.write().await;
            self.engine
                .record_deploy(&mut *registry, component, adapter, &outcome);
        }

        match outcome {
            DeployOutcome::Created => {
                info!(component = %id, device = %device.id, "component deployed");
                Ok(())
            },
            DeployOutcome::Forbidden => Err(OperationError::Forbidden),
            DeployOutcome::NotFound => Err(remote_not_found()),
            DeployOutcome::IoError(message) => Err(OperationError::RemoteIo { message }),
        }
    }

    /// Undeploy a component from its device.
    ///
    /// Success implies the first matching instance record was removed.
    /// If no record exists the registry is left unchanged and the call
    /// still succeeds.
    ///
    /// # Errors
    ///
    /// Returns the gateway's failure mapped onto [`OperationError`], or
    /// [`OperationError::NotFound`] if the component cannot be resolved.
    pub async fn undeploy_component(&self, id: &ComponentId) -> Result<(), OperationError> {
        let (component, adapter, device) = self.resolve(id)?;
        let _guard = self.device_guard(component.device_id()).await;

        let outcome = self
            .gateway
            .undeploy(RemoteTarget {
                component,
                adapter,
                device,
            })
            .await;

        {
            let mut registry = self.registry.write().await;
            self.engine.record_undeploy(&mut *registry, component, &outcome);
        }

        match outcome {
            UndeployOutcome::Ok => {
                info!(component = %id, device = %device.id, "component undeployed");
                Ok(())
            },
            UndeployOutcome::Forbidden => Err(OperationError::Forbidden),
            UndeployOutcome::NotFound => Err(remote_not_found()),
            UndeployOutcome::IoError(message) => Err(OperationError::RemoteIo { message }),
        }
    }

    /// Start a component with the given deployment parameters.
    ///
    /// An absent parameter list is normalized to empty before the
    /// supplied values are validated against the adapter's declared
    /// parameters; nothing reaches the gateway on a validation failure.
    /// Success implies the first matching instance record is in state
    /// [`InstanceState::Running`] (best-effort: with no record the
    /// update is skipped).
    ///
    /// # Errors
    ///
    /// [`OperationError::InvalidParameters`] on local validation failure
    /// or gateway rejection; otherwise the gateway's failure mapped onto
    /// [`OperationError`].
    pub async fn start_component(
        &self,
        id: &ComponentId,
        parameters: Option<Vec<ParameterInstance>>,
    ) -> Result<(), OperationError> {
        let (component, adapter, device) = self.resolve(id)?;

        let parameters = parameters.unwrap_or_default();
        parameters::validate(&adapter.parameters, &parameters).map_err(|error| {
            OperationError::InvalidParameters {
                reason: error.to_string(),
            }
        })?;

        let _guard = self.device_guard(component.device_id()).await;

        let outcome = self
            .gateway
            .start(
                RemoteTarget {
                    component,
                    adapter,
                    device,
                },
                &parameters,
            )
            .await;

        {
            let mut registry = self.registry.write().await;
            self.engine.record_start(&mut *registry, component, &outcome);
        }

        match outcome {
            StartOutcome::Created => {
                info!(component = %id, device = %device.id, "component started");
                Ok(())
            },
            StartOutcome::BadRequest => Err(OperationError::InvalidParameters {
                reason: "rejected by remote gateway".to_string(),
            }),
            StartOutcome::Forbidden => Err(OperationError::Forbidden),
            StartOutcome::NotFound => Err(remote_not_found()),
            StartOutcome::IoError(message) => Err(OperationError::RemoteIo { message }),
        }
    }

    /// Stop a component.
    ///
    /// Success implies the first matching instance record is in state
    /// [`InstanceState::Stopped`] (best-effort, as for start).
    ///
    /// # Errors
    ///
    /// Returns the gateway's failure mapped onto [`OperationError`], or
    /// [`OperationError::NotFound`] if the component cannot be resolved.
    pub async fn stop_component(&self, id: &ComponentId) -> Result<(), OperationError> {
        let (component, adapter, device) = self.resolve(id)?;
        let _guard = self.device_guard(component.device_id()).await;

        let outcome = self
            .gateway
            .stop(RemoteTarget {
                component,
                adapter,
                device,
            })
            .await;

        {
            let mut registry = self.registry.write().await;
            self.engine.record_stop(&mut *registry, component, &outcome);
        }

        match outcome {
            StopOutcome::Ok => {
                info!(component = %id, device = %device.id, "component stopped");
                Ok(())
            },
            StopOutcome::Forbidden => Err(OperationError::Forbidden),
            StopOutcome::NotFound => Err(remote_not_found()),
            StopOutcome::IoError(message) => Err(OperationError::RemoteIo { message }),
        }
    }

    /// Probe whether a component's operator is running, synchronizing
    /// the first matching instance record with the probed state as a
    /// side effect.
    ///
    /// # Errors
    ///
    /// Returns the gateway's failure mapped onto [`OperationError`], or
    /// [`OperationError::NotFound`] if the component cannot be resolved.
    pub async fn is_running(&self, id: &ComponentId) -> Result<bool, OperationError> {
        let (component, adapter, device) = self.resolve(id)?;
        let _guard = self.device_guard(component.device_id()).await;

        let outcome = self
            .gateway
            .is_running(RemoteTarget {
                component,
                adapter,
                device,
            })
            .await;

        {
            let mut registry = self.registry.write().await;
            self.engine.record_probe(&mut *registry, component, &outcome);
        }

        match outcome {
            ProbeOutcome::Ok(running) => Ok(running),
            ProbeOutcome::Forbidden => Err(OperationError::Forbidden),
            ProbeOutcome::NotFound => Err(remote_not_found()),
            ProbeOutcome::IoError(message) => Err(OperationError::RemoteIo { message }),
        }
    }

    /// The recorded state of the operator for the given device and
    /// adapter pairing: the state of the first instance record on the
    /// device whose adapter id equals the given one (value equality).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] if no matching record
    /// exists.
    pub async fn operator_state(
        &self,
        device: &DeviceId,
        adapter: &AdapterId,
    ) -> Result<InstanceState, OperationError> {
        let registry = self.registry.read().await;
        registry
            .find_by_device(device)
            .iter()
            .filter_map(|id| registry.get(id))
            .find(|instance| &instance.adapter == adapter)
            .map(|instance| instance.state)
            .ok_or_else(|| OperationError::NotFound {
                what: format!("operator instance for device {device} and adapter {adapter}"),
            })
    }

    /// The static catalog of deployment parameter types.
    #[must_use]
    pub fn parameter_types(&self) -> &'static [ParameterType] {
        ParameterType::all()
    }

    fn resolve(&self, id: &ComponentId) -> Result<(&Component, &Adapter, &Device), OperationError> {
        let component = self
            .catalog
            .component(id)
            .ok_or_else(|| OperationError::NotFound {
                what: format!("component {id}"),
            })?;
        let adapter =
            self.catalog
                .adapter(component.adapter_id())
                .ok_or_else(|| OperationError::NotFound {
                    what: format!("adapter {}", component.adapter_id()),
                })?;
        let device =
            self.catalog
                .device(component.device_id())
                .ok_or_else(|| OperationError::NotFound {
                    what: format!("device {}", component.device_id()),
                })?;
        Ok((component, adapter, device))
    }

    /// Acquire the per-device guard when strict serialization is on.
    async fn device_guard(&self, device: &DeviceId) -> Option<OwnedMutexGuard<()>> {
        if !self.serialize_per_device {
            return None;
        }
        let lock = {
            let mut locks = self.device_locks.lock().await;
            Arc::clone(
                locks
                    .entry(device.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        Some(lock.lock_owned().await)
    }
}

fn remote_not_found() -> OperationError {
    OperationError::NotFound {
        what: "remote target".to_string(),
    }
}
