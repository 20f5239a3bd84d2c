use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EmptyDirVolumeSource, Pod, PodSpec,
    ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use log::debug;
use maplit::btreemap;
use snafu::ResultExt;
use tooling_model::constants::{
    CHE_ORIGINAL_NAME_LABEL, CHE_WORKSPACE_ID_LABEL, MEMORY_LIMIT_ATTRIBUTE, PLUGINS_VOLUME_NAME,
};
use tooling_model::{
    names, size, InternalMachineConfig, KubernetesEnvironment, MachineVolume, PluginFQN,
    RuntimeIdentity,
};

const BROKER_CONFIG_VOLUME: &str = "broker-config-volume";
const BROKER_CONFIG_PATH: &str = "/broker-config";
const BROKER_CONFIG_FILE: &str = "config.json";
const PLUGINS_PATH: &str = "/plugins";
const NAME_SUFFIX_LENGTH: usize = 6;

/// How broker pods are built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BrokerSettings {
    pub metadata_image: String,
    pub artifacts_image: String,
    pub image_pull_policy: Option<String>,
    pub memory_limit: String,
    pub push_endpoint: String,
    pub registry_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum BrokerKind {
    /// Resolves plugin metadata and reports it over the event bus.
    Metadata,
    /// Downloads plugin artifacts into the `plugins` volume before the workspace starts.
    Artifacts,
}

impl BrokerKind {
    fn container_name(self) -> &'static str {
        match self {
            BrokerKind::Metadata => "che-plugin-metadata-broker",
            BrokerKind::Artifacts => "che-plugin-artifacts-broker",
        }
    }
}

/// Builds the single-pod environments that plugin brokers run in.
#[derive(Debug, Clone)]
pub struct BrokerEnvironmentFactory {
    settings: BrokerSettings,
}

impl BrokerEnvironmentFactory {
    pub fn new(settings: BrokerSettings) -> Self {
        Self { settings }
    }

    /// The environment of the broker that resolves the metadata of `plugins`.
    pub fn metadata_broker(
        &self,
        identity: &RuntimeIdentity,
        plugins: &[PluginFQN],
        merge_plugins: bool,
    ) -> Result<KubernetesEnvironment> {
        self.build(BrokerKind::Metadata, identity, plugins, merge_plugins)
    }

    /// The environment of the broker that downloads the artifacts of `plugins`. Its pod is meant
    /// to be merged into the workspace pod as an init container.
    pub fn artifacts_broker(
        &self,
        identity: &RuntimeIdentity,
        plugins: &[PluginFQN],
        merge_plugins: bool,
    ) -> Result<KubernetesEnvironment> {
        self.build(BrokerKind::Artifacts, identity, plugins, merge_plugins)
    }

    fn build(
        &self,
        kind: BrokerKind,
        identity: &RuntimeIdentity,
        plugins: &[PluginFQN],
        merge_plugins: bool,
    ) -> Result<KubernetesEnvironment> {
        let image = match kind {
            BrokerKind::Metadata => &self.settings.metadata_image,
            BrokerKind::Artifacts => &self.settings.artifacts_image,
        };
        let pod_name = names::generate("che-plugin-broker-", NAME_SUFFIX_LENGTH);
        let config_map_name = names::generate("che-plugin-broker-config-", NAME_SUFFIX_LENGTH);
        let container_name = kind.container_name();
        debug!(
            "Building {} for workspace '{}' in pod '{}'",
            container_name, identity.workspace_id, pod_name
        );

        let config = serde_json::to_string(plugins).context(error::SerializationSnafu {
            what: "plugin references",
        })?;
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(config_map_name.clone()),
                labels: Some(btreemap! {
                    CHE_WORKSPACE_ID_LABEL.to_string() => identity.workspace_id.clone(),
                }),
                ..ObjectMeta::default()
            },
            data: Some(btreemap! { BROKER_CONFIG_FILE.to_string() => config }),
            ..ConfigMap::default()
        };

        let mut volumes = vec![Volume {
            name: BROKER_CONFIG_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(config_map_name.clone()),
                ..ConfigMapVolumeSource::default()
            }),
            ..Volume::default()
        }];
        let mut mounts = vec![VolumeMount {
            name: BROKER_CONFIG_VOLUME.to_string(),
            mount_path: BROKER_CONFIG_PATH.to_string(),
            ..VolumeMount::default()
        }];
        let mut machine = InternalMachineConfig::default();
        let memory_limit = size::to_bytes(&self.settings.memory_limit).context(
            error::ConfigValueSnafu {
                field: "brokerMemoryLimit",
                value: &self.settings.memory_limit,
            },
        )?;
        machine
            .attributes
            .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), memory_limit.to_string());
        if let BrokerKind::Artifacts = kind {
            volumes.push(Volume {
                name: PLUGINS_VOLUME_NAME.to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Volume::default()
            });
            mounts.push(VolumeMount {
                name: PLUGINS_VOLUME_NAME.to_string(),
                mount_path: PLUGINS_PATH.to_string(),
                ..VolumeMount::default()
            });
            machine.volumes.insert(
                PLUGINS_VOLUME_NAME.to_string(),
                MachineVolume::new(PLUGINS_PATH),
            );
        }

        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(pod_name.clone()),
                labels: Some(btreemap! {
                    CHE_WORKSPACE_ID_LABEL.to_string() => identity.workspace_id.clone(),
                    CHE_ORIGINAL_NAME_LABEL.to_string() => pod_name.clone(),
                }),
                ..ObjectMeta::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: container_name.to_string(),
                    image: Some(image.clone()),
                    image_pull_policy: self.settings.image_pull_policy.clone(),
                    args: Some(self.args(identity, merge_plugins)),
                    volume_mounts: Some(mounts),
                    resources: Some(ResourceRequirements {
                        limits: Some(btreemap! {
                            "memory".to_string() => Quantity(self.settings.memory_limit.clone()),
                        }),
                        ..ResourceRequirements::default()
                    }),
                    ..Container::default()
                }],
                restart_policy: Some(String::from("Never")),
                volumes: Some(volumes),
                ..PodSpec::default()
            }),
            ..Pod::default()
        };

        let mut environment = KubernetesEnvironment::default();
        environment
            .machines
            .insert(names::machine_name(&pod_name, container_name), machine);
        environment.pods.insert(pod_name, pod);
        environment.config_maps.insert(config_map_name, config_map);
        Ok(environment)
    }

    fn args(&self, identity: &RuntimeIdentity, merge_plugins: bool) -> Vec<String> {
        let mut args = vec![
            "--push-endpoint".to_string(),
            self.settings.push_endpoint.clone(),
            "--runtime-id".to_string(),
            format!(
                "{}:{}:{}",
                identity.workspace_id, identity.env_name, identity.owner_id
            ),
        ];
        if let Some(registry) = &self.settings.registry_url {
            args.push("--registry-address".to_string());
            args.push(registry.clone());
        }
        args.push("--metas".to_string());
        args.push(format!("{}/{}", BROKER_CONFIG_PATH, BROKER_CONFIG_FILE));
        if merge_plugins {
            args.push("--merge-plugins".to_string());
        }
        args
    }
}
