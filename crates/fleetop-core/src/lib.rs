//! Core library for fleetop: operator deployment orchestration and
//! instance state reconciliation.
//!
//! Fleetop deploys "operators" (bundles of executable adapter routines)
//! onto remote devices and keeps a registry of [`OperatorInstance`]
//! records synchronized with the actual runtime state on each device.
//! The crate is organized around three seams:
//!
//! - [`registry::InstanceRegistry`] — the persistence contract for
//!   operator-instance records.
//! - [`gateway::RemoteGateway`] — the external subsystem that performs
//!   real deploy/start/stop/probe operations against a device. Only the
//!   interface lives here; transports (SSH, agents) are provided by
//!   callers.
//! - [`reconcile::ReconciliationEngine`] — maps gateway outcomes onto
//!   registry mutations.
//!
//! [`service::DeploymentService`] ties the three together behind the
//! logical operation surface (deploy/undeploy/start/stop/probe/state
//! query), decoupled from any transport.
//!
//! [`OperatorInstance`]: registry::OperatorInstance

pub mod adapter;
pub mod component;
pub mod config;
pub mod device;
pub mod gateway;
pub mod id;
pub mod reconcile;
pub mod registry;
pub mod service;

pub use adapter::{Adapter, Routine};
pub use component::{Actuator, Component, ComponentKind, Sensor};
pub use config::FleetopConfig;
pub use device::Device;
pub use gateway::RemoteGateway;
pub use id::{AdapterId, ComponentId, DeviceId, InstanceId};
pub use reconcile::{LookupPolicy, ReconciliationEngine};
pub use registry::{InMemoryInstanceRegistry, InstanceRegistry, InstanceState, OperatorInstance};
pub use service::{DeploymentService, OperationError};
