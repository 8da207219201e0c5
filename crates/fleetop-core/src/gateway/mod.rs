//! Remote execution gateway interface.
//!
//! The gateway is the external subsystem that actually copies, starts,
//! stops, and probes operator routines on a device (over SSH, an agent
//! protocol, or anything else). Only the interface lives in this crate;
//! the core consumes outcomes and never performs remote I/O itself.
//!
//! The core imposes no timeout and performs no retries on gateway calls:
//! cancellation and deadlines are the caller's policy, and a failed call
//! is reported once, verbatim.

use async_trait::async_trait;

use crate::adapter::parameters::ParameterInstance;
use crate::adapter::Adapter;
use crate::component::Component;
use crate::device::Device;

/// A component resolved together with the adapter and device it refers
/// to, ready to be acted on remotely.
#[derive(Debug, Clone, Copy)]
pub struct RemoteTarget<'a> {
    /// The component being operated on.
    pub component: &'a Component,
    /// The component's adapter.
    pub adapter: &'a Adapter,
    /// The component's device.
    pub device: &'a Device,
}

/// Outcome of a deploy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The operator was copied onto the device.
    Created,
    /// The device refused the operation.
    Forbidden,
    /// The device or operator files could not be found remotely.
    NotFound,
    /// Remote I/O failed.
    IoError(String),
}

/// Outcome of an undeploy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndeployOutcome {
    /// The operator was removed from the device.
    Ok,
    /// The device refused the operation.
    Forbidden,
    /// The device or operator files could not be found remotely.
    NotFound,
    /// Remote I/O failed.
    IoError(String),
}

/// Outcome of a start operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The operator was started.
    Created,
    /// The gateway rejected the supplied deployment parameters.
    BadRequest,
    /// The device refused the operation.
    Forbidden,
    /// The device or operator files could not be found remotely.
    NotFound,
    /// Remote I/O failed.
    IoError(String),
}

/// Outcome of a stop operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The operator was stopped.
    Ok,
    /// The device refused the operation.
    Forbidden,
    /// The device or operator files could not be found remotely.
    NotFound,
    /// Remote I/O failed.
    IoError(String),
}

/// Outcome of a running-state probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The probe ran; the payload says whether the operator is running.
    Ok(bool),
    /// The device refused the operation.
    Forbidden,
    /// The device or operator files could not be found remotely.
    NotFound,
    /// Remote I/O failed.
    IoError(String),
}

impl DeployOutcome {
    /// Whether the outcome permits a registry mutation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Created)
    }
}

impl UndeployOutcome {
    /// Whether the outcome permits a registry mutation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl StartOutcome {
    /// Whether the outcome permits a registry mutation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Created)
    }
}

impl StopOutcome {
    /// Whether the outcome permits a registry mutation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl ProbeOutcome {
    /// Whether the outcome permits a registry mutation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// The remote execution subsystem, as consumed by the core.
///
/// Implementations perform the actual operations against the target
/// device. Each call blocks on external I/O and should be made
/// timeout-bound by the caller when that matters.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Copy the operator's routines onto the target device.
    async fn deploy(&self, target: RemoteTarget<'_>) -> DeployOutcome;

    /// Remove the operator's routines from the target device.
    async fn undeploy(&self, target: RemoteTarget<'_>) -> UndeployOutcome;

    /// Start the operator on the target device with the given
    /// deployment parameters. The parameter list is always concrete;
    /// callers normalize an absent list to empty before invoking.
    async fn start(&self, target: RemoteTarget<'_>, parameters: &[ParameterInstance]) -> StartOutcome;

    /// Stop the operator on the target device.
    async fn stop(&self, target: RemoteTarget<'_>) -> StopOutcome;

    /// Probe whether the operator is currently running.
    async fn is_running(&self, target: RemoteTarget<'_>) -> ProbeOutcome;
}
