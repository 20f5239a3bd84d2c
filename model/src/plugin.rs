/*!

Descriptors of resolved plugins as they are reported by the plugin broker. These are plain data,
the resolvers in the provisioning crate turn them into Kubernetes object fragments.

!*/

use crate::serde_utils::null_to_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully qualified reference to a plugin, either by registry id or by a direct `reference` to
/// its meta file.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PluginFQN {
    /// The registry that holds the plugin, when it is not the default registry.
    pub registry: Option<String>,
    /// The `publisher/name/version` id of the plugin.
    pub id: String,
    /// A URL of the plugin's meta file, used instead of a registry lookup.
    pub reference: Option<String>,
}

/// A plugin after the broker has resolved its metadata.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChePlugin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub containers: Vec<CheContainer>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub init_containers: Vec<CheContainer>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub endpoints: Vec<ChePluginEndpoint>,
    /// Environment variables that are added to every container of the workspace.
    #[serde(default, deserialize_with = "null_to_default")]
    pub workspace_env: Vec<EnvVar>,
}

impl ChePlugin {
    /// Pairs each sidecar container with the plugin endpoints that target one of its exposed
    /// ports. An endpoint whose target port is exposed by several containers belongs to the first
    /// of them only, so every endpoint is served by exactly one container.
    pub fn container_endpoints(&self) -> Vec<(&CheContainer, Vec<ChePluginEndpoint>)> {
        let mut assigned = vec![false; self.endpoints.len()];
        self.containers
            .iter()
            .map(|container| {
                let endpoints = self
                    .endpoints
                    .iter()
                    .enumerate()
                    .filter(|(index, endpoint)| {
                        !assigned[*index]
                            && container
                                .ports
                                .iter()
                                .any(|port| port.exposed_port == endpoint.target_port)
                    })
                    .map(|(index, endpoint)| (index, endpoint.clone()))
                    .collect::<Vec<_>>();
                for (index, _) in &endpoints {
                    assigned[*index] = true;
                }
                (
                    container,
                    endpoints.into_iter().map(|(_, endpoint)| endpoint).collect(),
                )
            })
            .collect()
    }
}

/// An abstract description of a single plugin container.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheContainer {
    pub name: String,
    pub image: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub command: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub env: Vec<EnvVar>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub ports: Vec<CheContainerPort>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub volumes: Vec<Volume>,
    /// Commands that should be runnable in this container from the IDE.
    #[serde(default, deserialize_with = "null_to_default")]
    pub commands: Vec<Command>,
    /// Whether the workspace projects should be mounted into this container.
    #[serde(default)]
    pub mount_sources: bool,
    pub memory_limit: Option<String>,
    pub memory_request: Option<String>,
    pub cpu_limit: Option<String>,
    pub cpu_request: Option<String>,
    pub lifecycle: Option<Lifecycle>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct CheContainerPort {
    pub exposed_port: i32,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChePluginEndpoint {
    pub name: String,
    pub target_port: i32,
    #[serde(default)]
    pub public: bool,
    /// Free-form attributes such as `protocol` and `path`.
    #[serde(default, deserialize_with = "null_to_default")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub mount_path: String,
    /// Ephemeral volumes live as long as the pod does, the others are backed by a claim.
    #[serde(default)]
    pub ephemeral: bool,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new<S1, S2>(name: S1, value: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A command declared by a plugin container.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub working_dir: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub command: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    pub post_start: Option<Handler>,
    pub pre_stop: Option<Handler>,
}

/// A lifecycle hook. Only `exec` hooks are supported.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    pub exec: Option<ExecAction>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExecAction {
    #[serde(default, deserialize_with = "null_to_default")]
    pub command: Vec<String>,
}
