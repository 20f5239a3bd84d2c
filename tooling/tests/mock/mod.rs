/*!

This test module provides mock implementations of the [`NamespaceClient`] and
[`WorkspaceVolumesStrategy`] so that broker runs can be tested without Kubernetes.

The [`MockNamespaceClient`] also plays the part of the plugin broker: when the broker pod is
created it publishes the configured [`BrokerReply`] on the event bus, the way a real broker
reports back once it is scheduled.

!*/

#![allow(dead_code)]

use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Service};
use kube::ResourceExt;
use sidecar_tooling::clients::{
    ClientError, ClientResult, NamespaceClient, WorkspaceVolumesStrategy,
};
use sidecar_tooling::BrokerEventBus;
use std::sync::Mutex;
use tooling_model::constants::CHE_WORKSPACE_ID_LABEL;
use tooling_model::{
    BrokerEvent, CheContainer, CheContainerPort, ChePlugin, ChePluginEndpoint,
    KubernetesEnvironment, RuntimeIdentity,
};

pub(crate) const NAMESPACE: &str = "che-ns";
pub(crate) const WORKSPACE_ID: &str = "workspace1";

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn identity() -> RuntimeIdentity {
    RuntimeIdentity::new(WORKSPACE_ID, "default", "owner1", NAMESPACE)
}

/// A plugin with one sidecar that serves one endpoint per port.
pub(crate) fn plugin(id: &str, container: &str, endpoints: &[(&str, i32)]) -> ChePlugin {
    ChePlugin {
        id: id.to_string(),
        containers: vec![CheContainer {
            name: container.to_string(),
            image: format!("quay.io/eclipse/{}:next", container),
            ports: endpoints
                .iter()
                .map(|(_, port)| CheContainerPort {
                    exposed_port: *port,
                })
                .collect(),
            ..CheContainer::default()
        }],
        endpoints: endpoints
            .iter()
            .map(|(name, port)| ChePluginEndpoint {
                name: name.to_string(),
                target_port: *port,
                public: true,
                ..ChePluginEndpoint::default()
            })
            .collect(),
        ..ChePlugin::default()
    }
}

/// What the pretend broker reports once its pod has been created.
#[derive(Debug, Clone)]
pub(crate) enum BrokerReply {
    Plugins(Vec<ChePlugin>),
    Failure(String),
    /// The broker never reports.
    Silence,
}

/// Records every object it is asked to create and answers broker pods with a [`BrokerReply`].
pub(crate) struct MockNamespaceClient {
    event_bus: BrokerEventBus,
    reply: BrokerReply,
    /// Creating an object of this kind fails.
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
    pods: Mutex<Vec<Pod>>,
}

impl MockNamespaceClient {
    pub(crate) fn new(event_bus: BrokerEventBus, reply: BrokerReply) -> Self {
        Self {
            event_bus,
            reply,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
            pods: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(event_bus: BrokerEventBus, what: &'static str) -> Self {
        Self {
            fail_on: Some(what),
            ..Self::new(event_bus, BrokerReply::Silence)
        }
    }

    /// The calls made so far, as `<kind> <name>`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn pods(&self) -> Vec<Pod> {
        self.pods.lock().unwrap().clone()
    }

    fn record(&self, kind: &'static str, name: String) -> ClientResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", kind, name));
        if self.fail_on == Some(kind) {
            return Err(ClientError::from("the mock cluster refused the object"));
        }
        Ok(())
    }

    fn reply(&self, pod: &Pod) {
        let runtime_id = pod
            .labels()
            .get(CHE_WORKSPACE_ID_LABEL)
            .cloned()
            .unwrap_or_default();
        self.event_bus.publish(BrokerEvent::started(&runtime_id));
        match &self.reply {
            BrokerReply::Plugins(plugins) => self
                .event_bus
                .publish(BrokerEvent::done(&runtime_id, plugins.clone())),
            BrokerReply::Failure(message) => self
                .event_bus
                .publish(BrokerEvent::failed(&runtime_id, message)),
            BrokerReply::Silence => {}
        }
    }
}

#[async_trait::async_trait]
impl NamespaceClient for MockNamespaceClient {
    async fn create_config_map(
        &self,
        _namespace: &str,
        config_map: &ConfigMap,
    ) -> ClientResult<()> {
        self.record("config_map", config_map.name_any())
    }

    async fn create_pod(&self, _namespace: &str, pod: &Pod) -> ClientResult<()> {
        self.record("pod", pod.name_any())?;
        self.pods.lock().unwrap().push(pod.clone());
        self.reply(pod);
        Ok(())
    }

    async fn create_service(&self, _namespace: &str, service: &Service) -> ClientResult<()> {
        self.record("service", service.name_any())
    }

    async fn ensure_persistent_volume_claim(
        &self,
        _namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClientResult<()> {
        self.record("claim", claim.name_any())
    }
}

/// Remembers the workspaces it prepared storage for.
#[derive(Default)]
pub(crate) struct MockVolumesStrategy {
    prepared: Mutex<Vec<String>>,
}

impl MockVolumesStrategy {
    pub(crate) fn prepared(&self) -> Vec<String> {
        self.prepared.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WorkspaceVolumesStrategy for MockVolumesStrategy {
    async fn prepare(
        &self,
        identity: &RuntimeIdentity,
        _environment: &KubernetesEnvironment,
    ) -> ClientResult<()> {
        self.prepared
            .lock()
            .unwrap()
            .push(identity.workspace_id.clone());
        Ok(())
    }
}
