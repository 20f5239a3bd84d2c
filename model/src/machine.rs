use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The runtime-facing description of one container: how to reach it, what it mounts and how much
/// memory and cpu it may use.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InternalMachineConfig {
    pub servers: BTreeMap<String, ServerConfig>,
    pub installers: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    /// Workspace-level logical volumes keyed by name.
    pub volumes: BTreeMap<String, MachineVolume>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// The port in `<port>/tcp` form.
    pub port: String,
    pub protocol: Option<String>,
    pub path: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MachineVolume {
    pub path: String,
}

impl MachineVolume {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into() }
    }
}
