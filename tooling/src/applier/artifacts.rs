use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{PodSpec, Volume};
use log::debug;
use snafu::{ensure, OptionExt};
use tooling_model::{names, KubernetesEnvironment, WorkspaceEnvironment};

/// Merges the pod of an artifacts broker into the workspace pod, so that plugin artifacts are
/// downloaded by init containers before any sidecar starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactsBrokerApplier;

impl ArtifactsBrokerApplier {
    pub fn apply(
        &self,
        environment: &mut dyn WorkspaceEnvironment,
        broker: KubernetesEnvironment,
    ) -> Result<()> {
        let count = environment.pods().len();
        ensure!(
            count == 1,
            error::ArtifactsBrokerPodsSnafu {
                what: "the workspace environment",
                count
            }
        );
        let count = broker.pods.len();
        ensure!(
            count == 1,
            error::ArtifactsBrokerPodsSnafu {
                what: "the broker environment",
                count
            }
        );
        let KubernetesEnvironment {
            pods,
            mut machines,
            config_maps,
            ..
        } = broker;
        let (broker_pod_name, broker_pod) = pods
            .into_iter()
            .next()
            .context(error::PodMissingSnafu {
                pod_name: "artifacts broker",
            })?;
        let broker_spec = broker_pod.spec.unwrap_or_default();
        let pod_name = environment
            .pods()
            .keys()
            .next()
            .cloned()
            .context(error::PodMissingSnafu {
                pod_name: "workspace",
            })?;

        for container in &broker_spec.containers {
            let broker_machine = names::machine_name(&broker_pod_name, &container.name);
            if let Some(machine) = machines.remove(&broker_machine) {
                environment
                    .machines_mut()
                    .insert(names::machine_name(&pod_name, &container.name), machine);
            }
        }
        environment.config_maps_mut().extend(config_maps);

        let spec = environment
            .pods_mut()
            .get_mut(&pod_name)
            .context(error::PodMissingSnafu {
                pod_name: &pod_name,
            })?
            .spec
            .get_or_insert_with(Default::default);
        merge_volumes(spec, broker_spec.volumes.unwrap_or_default());
        debug!(
            "Adding {} artifacts broker containers to pod '{}'",
            broker_spec.containers.len(),
            pod_name
        );
        spec.init_containers
            .get_or_insert_with(Vec::new)
            .extend(broker_spec.containers);
        Ok(())
    }
}

/// Adds the volumes that `spec` does not declare yet. Volumes are matched by name.
fn merge_volumes(spec: &mut PodSpec, volumes: Vec<Volume>) {
    let existing = spec.volumes.get_or_insert_with(Vec::new);
    for volume in volumes {
        if !existing.iter().any(|present| present.name == volume.name) {
            existing.push(volume);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use k8s_openapi::api::core::v1::{ConfigMap, Container, EmptyDirVolumeSource, Pod};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use tooling_model::InternalMachineConfig;

    fn pod(containers: &[&str], volumes: &[&str]) -> Pod {
        Pod {
            spec: Some(PodSpec {
                containers: containers
                    .iter()
                    .map(|name| Container {
                        name: name.to_string(),
                        ..Container::default()
                    })
                    .collect(),
                volumes: Some(
                    volumes
                        .iter()
                        .map(|name| Volume {
                            name: name.to_string(),
                            empty_dir: Some(EmptyDirVolumeSource::default()),
                            ..Volume::default()
                        })
                        .collect(),
                ),
                ..PodSpec::default()
            }),
            ..Pod::default()
        }
    }

    fn broker() -> KubernetesEnvironment {
        let mut broker = KubernetesEnvironment::default();
        broker
            .pods
            .insert("broker".to_string(), pod(&["artifacts"], &["plugins", "config"]));
        broker.machines.insert(
            "broker/artifacts".to_string(),
            InternalMachineConfig::default(),
        );
        broker.config_maps.insert(
            "config".to_string(),
            ConfigMap {
                metadata: ObjectMeta {
                    name: Some("config".to_string()),
                    ..ObjectMeta::default()
                },
                ..ConfigMap::default()
            },
        );
        broker
    }

    #[test]
    fn broker_pod_is_merged() {
        let mut environment = KubernetesEnvironment::default();
        environment
            .pods
            .insert("workspace".to_string(), pod(&["theia"], &["plugins"]));
        ArtifactsBrokerApplier
            .apply(&mut environment, broker())
            .unwrap();

        let spec = environment.pods["workspace"].spec.as_ref().unwrap();
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.init_containers.as_ref().unwrap()[0].name, "artifacts");
        let volumes: Vec<_> = spec
            .volumes
            .as_ref()
            .unwrap()
            .iter()
            .map(|volume| volume.name.as_str())
            .collect();
        assert_eq!(volumes, vec!["plugins", "config"]);
        assert!(environment.machines.contains_key("workspace/artifacts"));
        assert!(environment.config_maps.contains_key("config"));
    }

    #[test]
    fn pod_counts_are_checked() {
        let mut environment = KubernetesEnvironment::default();
        let error = ArtifactsBrokerApplier
            .apply(&mut environment, broker())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Infrastructure);

        environment
            .pods
            .insert("workspace".to_string(), pod(&["theia"], &[]));
        let mut broker = broker();
        broker
            .pods
            .insert("second".to_string(), pod(&["artifacts"], &[]));
        let error = ArtifactsBrokerApplier
            .apply(&mut environment, broker)
            .unwrap_err();
        assert!(error.to_string().contains("2 pods"));
    }
}
