use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, ResourceRequirements, Volume as PodVolume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use log::trace;
use maplit::btreemap;
use snafu::OptionExt;
use tooling_model::constants::{CHE_VOLUME_NAME_LABEL, CHE_WORKSPACE_ID_LABEL};
use tooling_model::{Volume, WorkspaceEnvironment};

/// How persistent volume claims for plugin volumes are requested.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClaimSettings {
    pub quantity: String,
    pub access_mode: String,
    pub storage_class: Option<String>,
}

impl ClaimSettings {
    /// Builds a claim named `name` that is labeled with the workspace and the logical volume name.
    pub fn claim(&self, name: &str, workspace_id: &str) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(btreemap! {
                    CHE_WORKSPACE_ID_LABEL.to_string() => workspace_id.to_string(),
                    CHE_VOLUME_NAME_LABEL.to_string() => name.to_string(),
                }),
                ..ObjectMeta::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![self.access_mode.clone()]),
                storage_class_name: self.storage_class.clone(),
                resources: Some(ResourceRequirements {
                    requests: Some(btreemap! {
                        "storage".to_string() => Quantity(self.quantity.clone()),
                    }),
                    ..ResourceRequirements::default()
                }),
                ..PersistentVolumeClaimSpec::default()
            }),
            ..PersistentVolumeClaim::default()
        }
    }
}

/// Provisions the volumes that a plugin container declares and mounts them into the container.
/// Ephemeral volumes become `emptyDir` pod volumes, the others are backed by a claim of the same
/// name. Pod volumes are shared by name, so containers that declare the same volume get one pod
/// volume and a mount each.
#[derive(Debug, Clone)]
pub(crate) struct PluginVolumesApplier {
    pub(crate) claims: ClaimSettings,
}

impl PluginVolumesApplier {
    pub(crate) fn apply(
        &self,
        environment: &mut dyn WorkspaceEnvironment,
        workspace_id: &str,
        pod_name: &str,
        container: &mut Container,
        volumes: &[Volume],
    ) -> Result<()> {
        for volume in volumes {
            let pod_volume_name = if volume.ephemeral {
                self.ephemeral_volume(environment, pod_name, volume)?
            } else {
                self.persistent_volume(environment, workspace_id, pod_name, volume)?
            };
            trace!(
                "Mounting volume '{}' at '{}' in container '{}'",
                pod_volume_name,
                volume.mount_path,
                container.name
            );
            container
                .volume_mounts
                .get_or_insert_with(Vec::new)
                .push(VolumeMount {
                    name: pod_volume_name,
                    mount_path: volume.mount_path.clone(),
                    ..VolumeMount::default()
                });
        }
        Ok(())
    }

    fn ephemeral_volume(
        &self,
        environment: &mut dyn WorkspaceEnvironment,
        pod_name: &str,
        volume: &Volume,
    ) -> Result<String> {
        let pod_volumes = pod_volumes(environment, pod_name)?;
        if !pod_volumes.iter().any(|existing| existing.name == volume.name) {
            pod_volumes.push(PodVolume {
                name: volume.name.clone(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..PodVolume::default()
            });
        }
        Ok(volume.name.clone())
    }

    fn persistent_volume(
        &self,
        environment: &mut dyn WorkspaceEnvironment,
        workspace_id: &str,
        pod_name: &str,
        volume: &Volume,
    ) -> Result<String> {
        environment
            .persistent_volume_claims_mut()
            .entry(volume.name.clone())
            .or_insert_with(|| self.claims.claim(&volume.name, workspace_id));

        let pod_volumes = pod_volumes(environment, pod_name)?;
        let bound = pod_volumes.iter().find(|existing| {
            existing
                .persistent_volume_claim
                .as_ref()
                .map(|source| source.claim_name == volume.name)
                .unwrap_or(false)
        });
        if let Some(existing) = bound {
            return Ok(existing.name.clone());
        }
        if !pod_volumes.iter().any(|existing| existing.name == volume.name) {
            pod_volumes.push(PodVolume {
                name: volume.name.clone(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: volume.name.clone(),
                    read_only: None,
                }),
                ..PodVolume::default()
            });
        }
        Ok(volume.name.clone())
    }
}

fn pod_volumes<'a>(
    environment: &'a mut dyn WorkspaceEnvironment,
    pod_name: &str,
) -> Result<&'a mut Vec<PodVolume>> {
    let pod = environment
        .pods_mut()
        .get_mut(pod_name)
        .context(error::PodMissingSnafu { pod_name })?;
    Ok(pod
        .spec
        .get_or_insert_with(Default::default)
        .volumes
        .get_or_insert_with(Vec::new))
}
