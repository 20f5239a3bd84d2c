use crate::constants::{EDITOR_COMPONENT_TYPE, PLUGIN_COMPONENT_TYPE};
use crate::plugin::EnvVar;
use crate::serde_utils::null_to_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A devfile component, as authored by the workspace owner. Plugin and editor components carry
/// overrides for the sidecars that their plugin contributes.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DevfileComponent {
    /// The plugin id, for `cheEditor` and `chePlugin` components.
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub component_type: String,
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub env: Vec<EnvVar>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub volumes: Vec<ComponentVolume>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub endpoints: Vec<ComponentEndpoint>,
    pub memory_limit: Option<String>,
    pub memory_request: Option<String>,
    pub cpu_limit: Option<String>,
    pub cpu_request: Option<String>,
}

impl DevfileComponent {
    /// Whether this component is backed by a plugin, i.e. it is an editor or a plugin component.
    pub fn is_plugin_backed(&self) -> bool {
        self.component_type == EDITOR_COMPONENT_TYPE || self.component_type == PLUGIN_COMPONENT_TYPE
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVolume {
    pub name: String,
    pub container_path: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEndpoint {
    pub name: String,
    pub port: i32,
    #[serde(default, deserialize_with = "null_to_default")]
    pub attributes: BTreeMap<String, String>,
}

/// A command of the workspace environment, as shown to the user by the IDE.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCommand {
    pub name: String,
    pub command_line: String,
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub attributes: BTreeMap<String, String>,
}

impl WorkspaceCommand {
    pub fn new<S1, S2, S3>(name: S1, command_line: S2, command_type: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            name: name.into(),
            command_line: command_line.into(),
            command_type: command_type.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// A non-fatal problem found while provisioning a workspace.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
pub struct Warning {
    pub code: i32,
    pub message: String,
}

impl Warning {
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
