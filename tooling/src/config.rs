/*!

Operator configuration of sidecar tooling. Every field has a default, so an empty document is a
valid configuration.

!*/

use crate::broker::BrokerSettings;
use crate::error::{self, Result};
use crate::provision::ClaimSettings;
use crate::resolver::{ProjectsRoot, ResourceDefaults};
use log::warn;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::time::Duration;
use tooling_model::size;

/// The image pull policies that Kubernetes accepts.
const PULL_POLICIES: [&str; 3] = ["Always", "Never", "IfNotPresent"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolingConfig {
    /// Pull policy of sidecar and broker images. Values other than `Always`, `Never` and
    /// `IfNotPresent` leave the policy unset.
    pub sidecar_image_pull_policy: Option<String>,
    pub default_sidecar_memory_limit: Option<String>,
    pub default_sidecar_memory_request: Option<String>,
    pub default_sidecar_cpu_limit: Option<String>,
    pub default_sidecar_cpu_request: Option<String>,
    /// How long to wait for the plugin broker to report.
    pub broker_wait_timeout_min: u64,
    /// Whether plugin brokers merge plugins that share a sidecar image, when the workspace does
    /// not say.
    pub default_merge_plugins: bool,
    /// When enabled, sidecar servers are secured by the JWT proxy.
    pub auth_enabled: bool,
    pub projects_root_path: String,
    pub projects_root_env_var: String,
    /// Name of the claim that the volumes strategy prepares for every workspace.
    pub workspace_claim_name: String,
    pub pvc_quantity: String,
    pub pvc_access_mode: String,
    pub pvc_storage_class: Option<String>,
    pub metadata_broker_image: String,
    pub artifacts_broker_image: String,
    pub broker_memory_limit: String,
    /// The endpoint that brokers publish their events to.
    pub push_endpoint: String,
    pub plugin_registry_url: Option<String>,
}

impl Default for ToolingConfig {
    fn default() -> Self {
        Self {
            sidecar_image_pull_policy: None,
            default_sidecar_memory_limit: Some("128Mi".to_string()),
            default_sidecar_memory_request: Some("64Mi".to_string()),
            default_sidecar_cpu_limit: None,
            default_sidecar_cpu_request: None,
            broker_wait_timeout_min: 3,
            default_merge_plugins: false,
            auth_enabled: false,
            projects_root_path: "/projects".to_string(),
            projects_root_env_var: "CHE_PROJECTS_ROOT".to_string(),
            workspace_claim_name: "claim-che-workspace".to_string(),
            pvc_quantity: "10Gi".to_string(),
            pvc_access_mode: "ReadWriteOnce".to_string(),
            pvc_storage_class: None,
            metadata_broker_image: "quay.io/eclipse/che-plugin-metadata-broker:v3.4.0"
                .to_string(),
            artifacts_broker_image: "quay.io/eclipse/che-plugin-artifacts-broker:v3.4.0"
                .to_string(),
            broker_memory_limit: "250Mi".to_string(),
            push_endpoint: "http://che-host:8080/api".to_string(),
            plugin_registry_url: None,
        }
    }
}

impl ToolingConfig {
    pub fn from_yaml<S: AsRef<str>>(yaml: S) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml.as_ref()).context(error::ConfigParseSnafu)?)
    }

    /// The sidecar pull policy, if it is one that Kubernetes accepts.
    pub fn image_pull_policy(&self) -> Option<String> {
        let policy = self.sidecar_image_pull_policy.as_ref()?;
        if PULL_POLICIES.contains(&policy.as_str()) {
            Some(policy.clone())
        } else {
            warn!(
                "Ignoring sidecar image pull policy '{}', it must be one of {:?}",
                policy, PULL_POLICIES
            );
            None
        }
    }

    pub fn broker_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.broker_wait_timeout_min * 60)
    }

    pub fn resource_defaults(&self) -> Result<ResourceDefaults> {
        Ok(ResourceDefaults {
            memory_limit: memory(
                "defaultSidecarMemoryLimit",
                &self.default_sidecar_memory_limit,
            )?,
            memory_request: memory(
                "defaultSidecarMemoryRequest",
                &self.default_sidecar_memory_request,
            )?,
            cpu_limit: cpu("defaultSidecarCpuLimit", &self.default_sidecar_cpu_limit)?,
            cpu_request: cpu("defaultSidecarCpuRequest", &self.default_sidecar_cpu_request)?,
        })
    }

    pub fn projects_root(&self) -> ProjectsRoot {
        ProjectsRoot {
            path: self.projects_root_path.clone(),
            env_var: self.projects_root_env_var.clone(),
        }
    }

    pub fn claim_settings(&self) -> ClaimSettings {
        ClaimSettings {
            quantity: self.pvc_quantity.clone(),
            access_mode: self.pvc_access_mode.clone(),
            storage_class: self.pvc_storage_class.clone(),
        }
    }

    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            metadata_image: self.metadata_broker_image.clone(),
            artifacts_image: self.artifacts_broker_image.clone(),
            image_pull_policy: self.image_pull_policy(),
            memory_limit: self.broker_memory_limit.clone(),
            push_endpoint: self.push_endpoint.clone(),
            registry_url: self.plugin_registry_url.clone(),
        }
    }
}

fn memory(field: &str, value: &Option<String>) -> Result<Option<u64>> {
    value
        .as_ref()
        .map(|value| {
            size::to_bytes(value)
                .context(error::ConfigValueSnafu { field, value })
                .map_err(Into::into)
        })
        .transpose()
}

fn cpu(field: &str, value: &Option<String>) -> Result<Option<f32>> {
    value
        .as_ref()
        .map(|value| {
            size::to_cores(value)
                .context(error::ConfigValueSnafu { field, value })
                .map_err(Into::into)
        })
        .transpose()
}
