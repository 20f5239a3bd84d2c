/*!

The in-memory object graph of a workspace before it is submitted to the cluster. Everything that
provisions tooling mutates a `WorkspaceEnvironment` in place.

!*/

use crate::constants::KUBERNETES_ENVIRONMENT_TYPE;
use crate::devfile::{DevfileComponent, Warning, WorkspaceCommand};
use crate::machine::InternalMachineConfig;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Service};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies one start of one workspace.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeIdentity {
    pub workspace_id: String,
    pub env_name: String,
    pub owner_id: String,
    pub infrastructure_namespace: String,
}

impl RuntimeIdentity {
    pub fn new<S1, S2, S3, S4>(workspace_id: S1, env_name: S2, owner_id: S3, namespace: S4) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self {
            workspace_id: workspace_id.into(),
            env_name: env_name.into(),
            owner_id: owner_id.into(),
            infrastructure_namespace: namespace.into(),
        }
    }
}

/// The objects of a Kubernetes-based workspace. Maps are keyed by object name, machines by
/// `<pod>/<container>`.
#[derive(Debug, Clone, PartialEq)]
pub struct KubernetesEnvironment {
    pub environment_type: String,
    pub pods: BTreeMap<String, Pod>,
    pub services: BTreeMap<String, Service>,
    pub persistent_volume_claims: BTreeMap<String, PersistentVolumeClaim>,
    pub config_maps: BTreeMap<String, ConfigMap>,
    pub machines: BTreeMap<String, InternalMachineConfig>,
    pub commands: Vec<WorkspaceCommand>,
    pub warnings: Vec<Warning>,
    pub attributes: BTreeMap<String, String>,
    pub devfile_components: Vec<DevfileComponent>,
}

impl Default for KubernetesEnvironment {
    fn default() -> Self {
        Self::new(KUBERNETES_ENVIRONMENT_TYPE)
    }
}

impl KubernetesEnvironment {
    pub fn new<S: Into<String>>(environment_type: S) -> Self {
        Self {
            environment_type: environment_type.into(),
            pods: Default::default(),
            services: Default::default(),
            persistent_volume_claims: Default::default(),
            config_maps: Default::default(),
            machines: Default::default(),
            commands: Default::default(),
            warnings: Default::default(),
            attributes: Default::default(),
            devfile_components: Default::default(),
        }
    }
}

/// The mutation surface that tooling appliers work against. Implementors only provide access to
/// their Kubernetes objects, the remaining methods are derived from it.
pub trait WorkspaceEnvironment: Send {
    fn kubernetes(&self) -> &KubernetesEnvironment;

    fn kubernetes_mut(&mut self) -> &mut KubernetesEnvironment;

    fn environment_type(&self) -> &str {
        &self.kubernetes().environment_type
    }

    fn pods(&self) -> &BTreeMap<String, Pod> {
        &self.kubernetes().pods
    }

    fn pods_mut(&mut self) -> &mut BTreeMap<String, Pod> {
        &mut self.kubernetes_mut().pods
    }

    fn services_mut(&mut self) -> &mut BTreeMap<String, Service> {
        &mut self.kubernetes_mut().services
    }

    fn persistent_volume_claims_mut(&mut self) -> &mut BTreeMap<String, PersistentVolumeClaim> {
        &mut self.kubernetes_mut().persistent_volume_claims
    }

    fn config_maps_mut(&mut self) -> &mut BTreeMap<String, ConfigMap> {
        &mut self.kubernetes_mut().config_maps
    }

    fn machines_mut(&mut self) -> &mut BTreeMap<String, InternalMachineConfig> {
        &mut self.kubernetes_mut().machines
    }

    fn commands_mut(&mut self) -> &mut Vec<WorkspaceCommand> {
        &mut self.kubernetes_mut().commands
    }

    fn add_warning(&mut self, warning: Warning) {
        self.kubernetes_mut().warnings.push(warning)
    }

    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.kubernetes().attributes
    }

    fn attributes_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.kubernetes_mut().attributes
    }

    fn devfile_components(&self) -> &[DevfileComponent] {
        &self.kubernetes().devfile_components
    }
}

impl WorkspaceEnvironment for KubernetesEnvironment {
    fn kubernetes(&self) -> &KubernetesEnvironment {
        self
    }

    fn kubernetes_mut(&mut self) -> &mut KubernetesEnvironment {
        self
    }
}

/// An OpenShift workspace. Tooling provisioning touches the same objects as in a Kubernetes
/// workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenShiftEnvironment {
    pub kubernetes: KubernetesEnvironment,
}

impl Default for OpenShiftEnvironment {
    fn default() -> Self {
        Self {
            kubernetes: KubernetesEnvironment::new(crate::constants::OPENSHIFT_ENVIRONMENT_TYPE),
        }
    }
}

impl WorkspaceEnvironment for OpenShiftEnvironment {
    fn kubernetes(&self) -> &KubernetesEnvironment {
        &self.kubernetes
    }

    fn kubernetes_mut(&mut self) -> &mut KubernetesEnvironment {
        &mut self.kubernetes
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::OPENSHIFT_ENVIRONMENT_TYPE;

    #[test]
    fn trait_delegates_to_kubernetes_objects() {
        let mut environment = OpenShiftEnvironment::default();
        assert_eq!(environment.environment_type(), OPENSHIFT_ENVIRONMENT_TYPE);
        environment
            .attributes_mut()
            .insert("persistVolumes".into(), "false".into());
        environment.add_warning(Warning::new(1, "careful"));
        assert_eq!(environment.kubernetes.attributes.len(), 1);
        assert_eq!(environment.kubernetes.warnings, vec![Warning::new(1, "careful")]);
        assert_eq!(
            KubernetesEnvironment::default().environment_type(),
            KUBERNETES_ENVIRONMENT_TYPE
        );
    }
}
