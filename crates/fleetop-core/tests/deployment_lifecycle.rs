//! End-to-end tests for the deployment operation surface: resolve,
//! gateway call, reconciliation, and error passthrough.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use fleetop_core::adapter::parameters::{Parameter, ParameterInstance, ParameterType, ParameterValue};
use fleetop_core::adapter::{Adapter, Routine};
use fleetop_core::component::{Actuator, Component, Sensor};
use fleetop_core::config::FleetopConfig;
use fleetop_core::device::{Device, DeviceCredentials};
use fleetop_core::gateway::{
    DeployOutcome, ProbeOutcome, RemoteGateway, RemoteTarget, StartOutcome, StopOutcome,
    UndeployOutcome,
};
use fleetop_core::id::{AdapterId, ComponentId, DeviceId};
use fleetop_core::registry::{InstanceRegistry, InstanceState};
use fleetop_core::service::{Catalog, DeploymentService, OperationError};

/// Gateway double: scripted outcomes per operation, defaulting to
/// success, with a record of the parameter lists passed to start.
#[derive(Default)]
struct ScriptedGateway {
    deploy: Mutex<VecDeque<DeployOutcome>>,
    undeploy: Mutex<VecDeque<UndeployOutcome>>,
    start: Mutex<VecDeque<StartOutcome>>,
    stop: Mutex<VecDeque<StopOutcome>>,
    probe: Mutex<VecDeque<ProbeOutcome>>,
    seen_start_parameters: Mutex<Vec<Vec<ParameterInstance>>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        Self::default()
    }

    fn script_deploy(&self, outcome: DeployOutcome) {
        self.deploy.lock().unwrap().push_back(outcome);
    }

    fn script_start(&self, outcome: StartOutcome) {
        self.start.lock().unwrap().push_back(outcome);
    }

    fn script_stop(&self, outcome: StopOutcome) {
        self.stop.lock().unwrap().push_back(outcome);
    }

    fn script_undeploy(&self, outcome: UndeployOutcome) {
        self.undeploy.lock().unwrap().push_back(outcome);
    }

    fn script_probe(&self, outcome: ProbeOutcome) {
        self.probe.lock().unwrap().push_back(outcome);
    }

    fn start_calls(&self) -> Vec<Vec<ParameterInstance>> {
        self.seen_start_parameters.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn deploy(&self, _target: RemoteTarget<'_>) -> DeployOutcome {
        self.deploy
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeployOutcome::Created)
    }

    async fn undeploy(&self, _target: RemoteTarget<'_>) -> UndeployOutcome {
        self.undeploy
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(UndeployOutcome::Ok)
    }

    async fn start(
        &self,
        _target: RemoteTarget<'_>,
        parameters: &[ParameterInstance],
    ) -> StartOutcome {
        self.seen_start_parameters
            .lock()
            .unwrap()
            .push(parameters.to_vec());
        self.start
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StartOutcome::Created)
    }

    async fn stop(&self, _target: RemoteTarget<'_>) -> StopOutcome {
        self.stop
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StopOutcome::Ok)
    }

    async fn is_running(&self, _target: RemoteTarget<'_>) -> ProbeOutcome {
        self.probe
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProbeOutcome::Ok(false))
    }
}

fn device(id: &str) -> Device {
    Device {
        id: DeviceId::new(id),
        name: format!("device {id}"),
        component_type: "Raspberry Pi".to_string(),
        ip_address: "192.168.0.10".to_string(),
        mac_address: None,
        credentials: DeviceCredentials {
            username: "pi".to_string(),
            password: Some("secret".to_string()),
            private_key: None,
        },
    }
}

fn adapter(id: &str, name: &str) -> Adapter {
    Adapter::new(id, name, "test operator", Routine::new("status.sh", "pgrep operator"))
}

fn sensor(id: &str, adapter: &str, device: &str) -> Component {
    Component::Sensor(Sensor {
        id: ComponentId::new(id),
        name: format!("sensor {id}"),
        adapter: AdapterId::new(adapter),
        device: DeviceId::new(device),
        unit: Some("°C".to_string()),
    })
}

fn actuator(id: &str, adapter: &str, device: &str) -> Component {
    Component::Actuator(Actuator {
        id: ComponentId::new(id),
        name: format!("actuator {id}"),
        adapter: AdapterId::new(adapter),
        device: DeviceId::new(device),
    })
}

/// One sensor "c-1" (adapter a-1) on device d-1.
fn single_component_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_device(device("d-1"));
    catalog.add_adapter(adapter("a-1", "temperature"));
    catalog.add_component(sensor("c-1", "a-1", "d-1"));
    catalog
}

fn service(catalog: Catalog, gateway: ScriptedGateway) -> DeploymentService<ScriptedGateway> {
    DeploymentService::new(catalog, gateway, &FleetopConfig::default())
}

#[tokio::test]
async fn full_lifecycle_deploy_start_stop_undeploy() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    let c1 = ComponentId::new("c-1");
    let d1 = DeviceId::new("d-1");
    let a1 = AdapterId::new("a-1");

    svc.deploy_component(&c1).await.unwrap();
    assert_eq!(svc.operator_state(&d1, &a1).await.unwrap(), InstanceState::Stopped);

    svc.start_component(&c1, None).await.unwrap();
    assert_eq!(svc.operator_state(&d1, &a1).await.unwrap(), InstanceState::Running);

    svc.stop_component(&c1).await.unwrap();
    assert_eq!(svc.operator_state(&d1, &a1).await.unwrap(), InstanceState::Stopped);

    svc.undeploy_component(&c1).await.unwrap();
    let err = svc.operator_state(&d1, &a1).await.unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));

    let registry = svc.registry();
    assert!(registry.read().await.is_empty());
}

#[tokio::test]
async fn repeated_deploys_create_duplicate_records() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    let c1 = ComponentId::new("c-1");

    svc.deploy_component(&c1).await.unwrap();
    svc.deploy_component(&c1).await.unwrap();

    let registry = svc.registry();
    let registry = registry.read().await;
    assert_eq!(registry.find_by_device(&DeviceId::new("d-1")).len(), 2);
}

#[tokio::test]
async fn unknown_component_is_not_found() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    let err = svc
        .deploy_component(&ComponentId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));
}

#[tokio::test]
async fn gateway_failures_pass_through_without_registry_changes() {
    let gateway = ScriptedGateway::new();
    gateway.script_deploy(DeployOutcome::Forbidden);
    let svc = service(single_component_catalog(), gateway);
    let c1 = ComponentId::new("c-1");

    let err = svc.deploy_component(&c1).await.unwrap_err();
    assert!(matches!(err, OperationError::Forbidden));
    assert!(svc.registry().read().await.is_empty());

    // Deploy successfully, then fail a stop: state must not change.
    svc.deploy_component(&c1).await.unwrap();
    svc.start_component(&c1, None).await.unwrap();

    let registry = svc.registry();
    let id = registry.read().await.find_by_device(&DeviceId::new("d-1"))[0].clone();
    assert_eq!(
        registry.read().await.get(&id).unwrap().state,
        InstanceState::Running
    );

    // A stop that fails remotely leaves the running state in place.
    svc.gateway()
        .script_stop(StopOutcome::IoError("broken pipe".to_string()));
    let err = svc.stop_component(&c1).await.unwrap_err();
    assert!(matches!(err, OperationError::RemoteIo { .. }));
    assert_eq!(
        registry.read().await.get(&id).unwrap().state,
        InstanceState::Running
    );
}

#[tokio::test]
async fn absent_parameter_list_is_normalized_to_empty() {
    let gateway = ScriptedGateway::new();
    let svc = service(single_component_catalog(), gateway);
    let c1 = ComponentId::new("c-1");

    svc.deploy_component(&c1).await.unwrap();
    svc.start_component(&c1, None).await.unwrap();

    let calls = svc.gateway().start_calls();
    assert_eq!(calls, vec![Vec::new()]);
}

#[tokio::test]
async fn invalid_parameters_never_reach_the_gateway() {
    let mut catalog = Catalog::new();
    catalog.add_device(device("d-1"));
    let mut a = adapter("a-1", "temperature");
    a.parameters.push(Parameter {
        name: "interval".to_string(),
        kind: ParameterType::Number,
        unit: Some("seconds".to_string()),
        mandatory: true,
    });
    catalog.add_adapter(a);
    catalog.add_component(sensor("c-1", "a-1", "d-1"));

    let svc = service(catalog, ScriptedGateway::new());
    let c1 = ComponentId::new("c-1");
    svc.deploy_component(&c1).await.unwrap();

    let err = svc.start_component(&c1, None).await.unwrap_err();
    assert!(matches!(err, OperationError::InvalidParameters { .. }));
    assert!(svc.gateway().start_calls().is_empty());

    // A valid list goes through.
    let parameters = vec![ParameterInstance::new("interval", ParameterValue::Number(30.0))];
    svc.start_component(&c1, Some(parameters.clone())).await.unwrap();
    assert_eq!(svc.gateway().start_calls(), vec![parameters]);
}

#[tokio::test]
async fn gateway_bad_request_maps_to_invalid_parameters() {
    let gateway = ScriptedGateway::new();
    let svc = service(single_component_catalog(), gateway);
    let c1 = ComponentId::new("c-1");
    svc.deploy_component(&c1).await.unwrap();

    svc.gateway().script_start(StartOutcome::BadRequest);
    let err = svc.start_component(&c1, None).await.unwrap_err();
    assert!(matches!(err, OperationError::InvalidParameters { .. }));

    // The failed start left the record stopped.
    assert_eq!(
        svc.operator_state(&DeviceId::new("d-1"), &AdapterId::new("a-1"))
            .await
            .unwrap(),
        InstanceState::Stopped
    );
}

#[tokio::test]
async fn probe_synchronizes_recorded_state() {
    let gateway = ScriptedGateway::new();
    gateway.script_probe(ProbeOutcome::Ok(true));
    gateway.script_probe(ProbeOutcome::Ok(false));
    let svc = service(single_component_catalog(), gateway);
    let c1 = ComponentId::new("c-1");
    let d1 = DeviceId::new("d-1");
    let a1 = AdapterId::new("a-1");

    svc.deploy_component(&c1).await.unwrap();

    assert!(svc.is_running(&c1).await.unwrap());
    assert_eq!(svc.operator_state(&d1, &a1).await.unwrap(), InstanceState::Running);

    assert!(!svc.is_running(&c1).await.unwrap());
    assert_eq!(svc.operator_state(&d1, &a1).await.unwrap(), InstanceState::Stopped);
}

#[tokio::test]
async fn probe_without_record_mutates_nothing() {
    let gateway = ScriptedGateway::new();
    gateway.script_probe(ProbeOutcome::Ok(true));
    let svc = service(single_component_catalog(), gateway);

    // No deploy happened; the probe result is still returned.
    assert!(svc.is_running(&ComponentId::new("c-1")).await.unwrap());
    assert!(svc.registry().read().await.is_empty());
}

#[tokio::test]
async fn failed_undeploy_keeps_the_record() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    let c1 = ComponentId::new("c-1");
    svc.deploy_component(&c1).await.unwrap();

    svc.gateway().script_undeploy(UndeployOutcome::NotFound);
    let err = svc.undeploy_component(&c1).await.unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));
    assert_eq!(svc.registry().read().await.find_by_device(&DeviceId::new("d-1")).len(), 1);
}

#[tokio::test]
async fn undeploy_with_no_record_still_succeeds() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    svc.undeploy_component(&ComponentId::new("c-1")).await.unwrap();
    assert!(svc.registry().read().await.is_empty());
}

#[tokio::test]
async fn first_match_policy_touches_foreign_adapter_records() {
    // Two components of different adapters share device d-1. Under the
    // legacy policy, starting the actuator flips whichever record was
    // inserted first.
    let mut catalog = Catalog::new();
    catalog.add_device(device("d-1"));
    catalog.add_adapter(adapter("a-1", "temperature"));
    catalog.add_adapter(adapter("a-2", "relay"));
    catalog.add_component(sensor("c-1", "a-1", "d-1"));
    catalog.add_component(actuator("c-2", "a-2", "d-1"));

    let svc = service(catalog, ScriptedGateway::new());
    svc.deploy_component(&ComponentId::new("c-1")).await.unwrap();
    svc.deploy_component(&ComponentId::new("c-2")).await.unwrap();

    svc.start_component(&ComponentId::new("c-2"), None).await.unwrap();

    let d1 = DeviceId::new("d-1");
    assert_eq!(
        svc.operator_state(&d1, &AdapterId::new("a-1")).await.unwrap(),
        InstanceState::Running
    );
    assert_eq!(
        svc.operator_state(&d1, &AdapterId::new("a-2")).await.unwrap(),
        InstanceState::Stopped
    );
}

#[tokio::test]
async fn device_and_adapter_policy_touches_the_matching_record() {
    let mut catalog = Catalog::new();
    catalog.add_device(device("d-1"));
    catalog.add_adapter(adapter("a-1", "temperature"));
    catalog.add_adapter(adapter("a-2", "relay"));
    catalog.add_component(sensor("c-1", "a-1", "d-1"));
    catalog.add_component(actuator("c-2", "a-2", "d-1"));

    let config = FleetopConfig::from_toml("[reconcile]\nlookup_policy = \"device_and_adapter\"\n")
        .unwrap();
    let svc = DeploymentService::new(catalog, ScriptedGateway::new(), &config);

    svc.deploy_component(&ComponentId::new("c-1")).await.unwrap();
    svc.deploy_component(&ComponentId::new("c-2")).await.unwrap();

    svc.start_component(&ComponentId::new("c-2"), None).await.unwrap();

    let d1 = DeviceId::new("d-1");
    assert_eq!(
        svc.operator_state(&d1, &AdapterId::new("a-1")).await.unwrap(),
        InstanceState::Stopped
    );
    assert_eq!(
        svc.operator_state(&d1, &AdapterId::new("a-2")).await.unwrap(),
        InstanceState::Running
    );
}

#[tokio::test]
async fn parameter_type_listing_is_static() {
    let svc = service(single_component_catalog(), ScriptedGateway::new());
    assert_eq!(
        svc.parameter_types(),
        &[ParameterType::Text, ParameterType::Number, ParameterType::Switch]
    );
}

#[tokio::test]
async fn per_device_serialization_completes_concurrent_operations() {
    let config = FleetopConfig::from_toml("[reconcile]\nserialize_per_device = true\n").unwrap();
    let svc = DeploymentService::new(single_component_catalog(), ScriptedGateway::new(), &config);
    let c1 = ComponentId::new("c-1");

    let (first, second) = tokio::join!(svc.deploy_component(&c1), svc.deploy_component(&c1));
    first.unwrap();
    second.unwrap();

    // Both deploys still insert: duplication is policy, serialization
    // only orders the operations.
    let registry = svc.registry();
    assert_eq!(registry.read().await.find_by_device(&DeviceId::new("d-1")).len(), 2);
}
