use crate::error::{self, Result};
use k8s_openapi::api::core::v1::Container;
use snafu::{ensure, ResultExt};
use std::collections::BTreeMap;
use tooling_model::constants::{
    CPU_LIMIT_ATTRIBUTE, CPU_REQUEST_ATTRIBUTE, DEVFILE_COMPONENT_ALIAS_ATTRIBUTE,
    ENDPOINT_PATH_ATTRIBUTE, ENDPOINT_PROTOCOL_ATTRIBUTE, ENDPOINT_PUBLIC_ATTRIBUTE,
    MEMORY_LIMIT_ATTRIBUTE, MEMORY_REQUEST_ATTRIBUTE, PROJECTS_VOLUME_NAME,
    SERVER_INTERNAL_ATTRIBUTE,
};
use tooling_model::{
    size, CheContainer, ChePluginEndpoint, DevfileComponent, InternalMachineConfig,
    MachineVolume, ServerConfig,
};

/// Memory and cpu values that sidecars get when neither the plugin nor the devfile sets them.
/// Memory is in bytes, cpu in cores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDefaults {
    pub memory_limit: Option<u64>,
    pub memory_request: Option<u64>,
    pub cpu_limit: Option<f32>,
    pub cpu_request: Option<f32>,
}

/// Where the workspace projects are mounted and the env var that tells sidecars about it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProjectsRoot {
    pub path: String,
    pub env_var: String,
}

/// Describes one resolved sidecar as a machine: its servers, volumes and resource attributes.
#[derive(Debug, Clone)]
pub(crate) struct MachineResolver<'a> {
    pub(crate) plugin_id: &'a str,
    pub(crate) container: &'a Container,
    pub(crate) che_container: &'a CheContainer,
    pub(crate) endpoints: &'a [ChePluginEndpoint],
    pub(crate) component: &'a DevfileComponent,
    pub(crate) defaults: &'a ResourceDefaults,
    pub(crate) projects_root: &'a ProjectsRoot,
}

impl MachineResolver<'_> {
    pub(crate) fn resolve(self) -> Result<InternalMachineConfig> {
        let mut machine = InternalMachineConfig::default();
        self.add_servers(&mut machine)?;
        self.add_volumes(&mut machine)?;
        self.add_resources(&mut machine)?;
        if let Some(alias) = &self.component.alias {
            machine
                .attributes
                .insert(DEVFILE_COMPONENT_ALIAS_ATTRIBUTE.to_string(), alias.clone());
        }
        Ok(machine)
    }

    fn add_servers(&self, machine: &mut InternalMachineConfig) -> Result<()> {
        for endpoint in self.endpoints {
            machine.servers.insert(
                endpoint.name.clone(),
                server(endpoint.target_port, endpoint.public, &endpoint.attributes),
            );
        }
        for endpoint in &self.component.endpoints {
            ensure!(
                !machine.servers.contains_key(&endpoint.name),
                error::EndpointCollisionSnafu {
                    component: self.component_name(),
                    machine: &self.container.name,
                    name: &endpoint.name,
                }
            );
            let mut attributes = endpoint.attributes.clone();
            let public = attributes
                .remove(ENDPOINT_PUBLIC_ATTRIBUTE)
                .map(|public| public != "false")
                .unwrap_or(true);
            machine.servers.insert(
                endpoint.name.clone(),
                server(endpoint.port, public, &attributes),
            );
        }
        Ok(())
    }

    fn add_volumes(&self, machine: &mut InternalMachineConfig) -> Result<()> {
        for volume in &self.che_container.volumes {
            machine
                .volumes
                .insert(volume.name.clone(), MachineVolume::new(&volume.mount_path));
        }
        for volume in &self.component.volumes {
            machine
                .volumes
                .insert(volume.name.clone(), MachineVolume::new(&volume.container_path));
        }
        if self.che_container.mount_sources {
            let path = &self.projects_root.path;
            if let Some(reserved) = self
                .che_container
                .volumes
                .iter()
                .find(|volume| volume.name == PROJECTS_VOLUME_NAME && &volume.mount_path != path)
            {
                return error::ReservedVolumeSnafu {
                    plugin_id: self.plugin_id,
                    container: &self.che_container.name,
                    volume: PROJECTS_VOLUME_NAME,
                    path: &reserved.mount_path,
                    expected: path,
                }
                .fail()
                .map_err(Into::into);
            }
            machine
                .volumes
                .insert(PROJECTS_VOLUME_NAME.to_string(), MachineVolume::new(path));
            machine
                .env
                .insert(self.projects_root.env_var.clone(), path.clone());
        }
        Ok(())
    }

    /// A devfile override wins over the value the container declares, which wins over the
    /// configured default.
    fn add_resources(&self, machine: &mut InternalMachineConfig) -> Result<()> {
        let (limits, requests) = match &self.container.resources {
            Some(resources) => (resources.limits.as_ref(), resources.requests.as_ref()),
            None => (None, None),
        };
        let memory = [
            (
                MEMORY_LIMIT_ATTRIBUTE,
                "memoryLimit",
                &self.component.memory_limit,
                limits.and_then(|limits| limits.get("memory")),
                self.defaults.memory_limit,
            ),
            (
                MEMORY_REQUEST_ATTRIBUTE,
                "memoryRequest",
                &self.component.memory_request,
                requests.and_then(|requests| requests.get("memory")),
                self.defaults.memory_request,
            ),
        ];
        for (attribute, field, component_value, declared, default) in memory {
            let bytes = match (component_value, declared) {
                (Some(value), _) => Some(size::to_bytes(value).context(
                    error::InvalidComponentOverrideSnafu {
                        component: self.component_name(),
                        field,
                        value,
                    },
                )?),
                (None, Some(quantity)) => Some(size::to_bytes(&quantity.0).context(
                    error::IllegalResourceValueSnafu {
                        field,
                        value: &quantity.0,
                        container: &self.container.name,
                    },
                )?),
                (None, None) => default,
            };
            if let Some(bytes) = bytes {
                machine
                    .attributes
                    .insert(attribute.to_string(), bytes.to_string());
            }
        }

        let cpu = [
            (
                CPU_LIMIT_ATTRIBUTE,
                "cpuLimit",
                &self.component.cpu_limit,
                limits.and_then(|limits| limits.get("cpu")),
                self.defaults.cpu_limit,
            ),
            (
                CPU_REQUEST_ATTRIBUTE,
                "cpuRequest",
                &self.component.cpu_request,
                requests.and_then(|requests| requests.get("cpu")),
                self.defaults.cpu_request,
            ),
        ];
        for (attribute, field, component_value, declared, default) in cpu {
            let cores = match (component_value, declared) {
                (Some(value), _) => Some(size::to_cores(value).context(
                    error::InvalidComponentOverrideSnafu {
                        component: self.component_name(),
                        field,
                        value,
                    },
                )?),
                (None, Some(quantity)) => Some(size::to_cores(&quantity.0).context(
                    error::IllegalResourceValueSnafu {
                        field,
                        value: &quantity.0,
                        container: &self.container.name,
                    },
                )?),
                (None, None) => default,
            };
            if let Some(cores) = cores {
                machine
                    .attributes
                    .insert(attribute.to_string(), cores_string(cores));
            }
        }
        Ok(())
    }

    fn component_name(&self) -> String {
        self.component
            .alias
            .clone()
            .or_else(|| self.component.id.clone())
            .unwrap_or_else(|| self.component.component_type.clone())
    }
}

/// Cores are written as a float, so one core is `1.0` rather than `1`.
fn cores_string(cores: f32) -> String {
    format!("{:?}", cores)
}

fn server(port: i32, public: bool, attributes: &BTreeMap<String, String>) -> ServerConfig {
    let mut attributes = attributes.clone();
    let protocol = attributes.remove(ENDPOINT_PROTOCOL_ATTRIBUTE);
    let path = attributes.remove(ENDPOINT_PATH_ATTRIBUTE);
    attributes.insert(SERVER_INTERNAL_ATTRIBUTE.to_string(), (!public).to_string());
    ServerConfig {
        port: format!("{}/tcp", port),
        protocol,
        path,
        attributes,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use k8s_openapi::api::core::v1::ResourceRequirements;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use maplit::btreemap;
    use tooling_model::{ComponentEndpoint, ComponentVolume, Volume};

    fn defaults() -> ResourceDefaults {
        ResourceDefaults {
            memory_limit: Some(128 * 1024 * 1024),
            memory_request: Some(64 * 1024 * 1024),
            cpu_limit: Some(1.0),
            cpu_request: Some(0.1),
        }
    }

    fn projects_root() -> ProjectsRoot {
        ProjectsRoot {
            path: "/projects".to_string(),
            env_var: "CHE_PROJECTS_ROOT".to_string(),
        }
    }

    fn endpoint(name: &str, target_port: i32, public: bool) -> ChePluginEndpoint {
        ChePluginEndpoint {
            name: name.to_string(),
            target_port,
            public,
            attributes: BTreeMap::new(),
        }
    }

    fn component() -> DevfileComponent {
        DevfileComponent {
            id: Some("eclipse/theia/next".to_string()),
            component_type: "cheEditor".to_string(),
            ..DevfileComponent::default()
        }
    }

    fn resolve(
        container: &Container,
        che_container: &CheContainer,
        endpoints: &[ChePluginEndpoint],
        component: &DevfileComponent,
    ) -> Result<InternalMachineConfig> {
        MachineResolver {
            plugin_id: "eclipse/theia/next",
            container,
            che_container,
            endpoints,
            component,
            defaults: &defaults(),
            projects_root: &projects_root(),
        }
        .resolve()
    }

    fn container_with_limits(limits: BTreeMap<String, Quantity>) -> Container {
        Container {
            name: "theia-abc".to_string(),
            resources: Some(ResourceRequirements {
                limits: Some(limits),
                ..ResourceRequirements::default()
            }),
            ..Container::default()
        }
    }

    #[test]
    fn two_endpoints_become_two_servers() {
        let container = Container {
            name: "theia-abc".to_string(),
            ..Container::default()
        };
        let machine = resolve(
            &container,
            &CheContainer::default(),
            &[endpoint("a", 4000, true), endpoint("b", 4001, false)],
            &component(),
        )
        .unwrap();
        assert_eq!(machine.servers.len(), 2);
        assert_eq!(machine.servers["a"].port, "4000/tcp");
        assert_eq!(machine.servers["b"].port, "4001/tcp");
        assert_eq!(machine.servers["a"].attributes[SERVER_INTERNAL_ATTRIBUTE], "false");
        assert_eq!(machine.servers["b"].attributes[SERVER_INTERNAL_ATTRIBUTE], "true");
    }

    #[test]
    fn protocol_and_path_become_server_fields() {
        let mut endpoint = endpoint("ide", 443, true);
        endpoint.attributes = btreemap! {
            "protocol".to_string() => "https".to_string(),
            "path".to_string() => "/path/1".to_string(),
            "attr1".to_string() => "value1".to_string(),
        };
        let machine = resolve(
            &Container::default(),
            &CheContainer::default(),
            &[endpoint],
            &component(),
        )
        .unwrap();
        let server = &machine.servers["ide"];
        assert_eq!(server.protocol.as_deref(), Some("https"));
        assert_eq!(server.path.as_deref(), Some("/path/1"));
        assert_eq!(
            server.attributes,
            btreemap! {
                "attr1".to_string() => "value1".to_string(),
                "internal".to_string() => "false".to_string(),
            }
        );
    }

    #[test]
    fn devfile_endpoint_cannot_override_plugin_endpoint() {
        let component = DevfileComponent {
            endpoints: vec![ComponentEndpoint {
                name: "ide".to_string(),
                port: 8080,
                attributes: BTreeMap::new(),
            }],
            ..component()
        };
        let error = resolve(
            &Container::default(),
            &CheContainer::default(),
            &[endpoint("ide", 3100, true)],
            &component,
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn devfile_endpoints_and_volumes_are_added() {
        let component = DevfileComponent {
            alias: Some("editor".to_string()),
            endpoints: vec![ComponentEndpoint {
                name: "debug".to_string(),
                port: 5005,
                attributes: btreemap! { "public".to_string() => "false".to_string() },
            }],
            volumes: vec![ComponentVolume {
                name: "m2".to_string(),
                container_path: "/home/user/.m2".to_string(),
            }],
            ..component()
        };
        let machine = resolve(
            &Container::default(),
            &CheContainer::default(),
            &[],
            &component,
        )
        .unwrap();
        assert_eq!(machine.servers["debug"].port, "5005/tcp");
        assert_eq!(machine.servers["debug"].attributes["internal"], "true");
        assert_eq!(machine.volumes["m2"].path, "/home/user/.m2");
        assert_eq!(machine.attributes[DEVFILE_COMPONENT_ALIAS_ATTRIBUTE], "editor");
    }

    #[test]
    fn defaults_apply_when_nothing_is_declared() {
        let machine = resolve(
            &Container::default(),
            &CheContainer::default(),
            &[],
            &component(),
        )
        .unwrap();
        assert_eq!(machine.attributes[MEMORY_LIMIT_ATTRIBUTE], "134217728");
        assert_eq!(machine.attributes[MEMORY_REQUEST_ATTRIBUTE], "67108864");
        assert_eq!(machine.attributes[CPU_LIMIT_ATTRIBUTE], "1.0");
        assert_eq!(machine.attributes[CPU_REQUEST_ATTRIBUTE], "0.1");
    }

    #[test]
    fn declared_limit_beats_default_and_component_beats_both() {
        let container = container_with_limits(btreemap! {
            "memory".to_string() => Quantity("512Mi".to_string()),
            "cpu".to_string() => Quantity("500m".to_string()),
        });
        let machine = resolve(&container, &CheContainer::default(), &[], &component()).unwrap();
        assert_eq!(machine.attributes[MEMORY_LIMIT_ATTRIBUTE], "536870912");
        assert_eq!(machine.attributes[CPU_LIMIT_ATTRIBUTE], "0.5");

        let component = DevfileComponent {
            memory_limit: Some("1G".to_string()),
            cpu_limit: Some("2".to_string()),
            ..component()
        };
        let machine = resolve(&container, &CheContainer::default(), &[], &component).unwrap();
        assert_eq!(machine.attributes[MEMORY_LIMIT_ATTRIBUTE], "1000000000");
        assert_eq!(machine.attributes[CPU_LIMIT_ATTRIBUTE], "2.0");
    }

    #[test]
    fn mount_sources_adds_projects_volume() {
        let che_container = CheContainer {
            mount_sources: true,
            volumes: vec![Volume {
                name: "plugins".to_string(),
                mount_path: "/plugins".to_string(),
                ephemeral: false,
            }],
            ..CheContainer::default()
        };
        let machine = resolve(&Container::default(), &che_container, &[], &component()).unwrap();
        assert_eq!(machine.volumes.len(), 2);
        assert_eq!(machine.volumes[PROJECTS_VOLUME_NAME].path, "/projects");
        assert_eq!(machine.volumes["plugins"].path, "/plugins");
        assert_eq!(machine.env["CHE_PROJECTS_ROOT"], "/projects");
    }

    #[test]
    fn reserved_volume_at_other_path_is_rejected() {
        let che_container = CheContainer {
            name: "theia".to_string(),
            mount_sources: true,
            volumes: vec![Volume {
                name: PROJECTS_VOLUME_NAME.to_string(),
                mount_path: "/src".to_string(),
                ephemeral: false,
            }],
            ..CheContainer::default()
        };
        let error =
            resolve(&Container::default(), &che_container, &[], &component()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(error.to_string().contains("mountSources"));
    }

    #[test]
    fn reserved_volume_at_projects_root_is_accepted() {
        let che_container = CheContainer {
            name: "theia".to_string(),
            mount_sources: true,
            volumes: vec![Volume {
                name: PROJECTS_VOLUME_NAME.to_string(),
                mount_path: "/projects".to_string(),
                ephemeral: false,
            }],
            ..CheContainer::default()
        };
        let machine = resolve(&Container::default(), &che_container, &[], &component()).unwrap();
        assert_eq!(machine.volumes.len(), 1);
        assert_eq!(machine.volumes[PROJECTS_VOLUME_NAME].path, "/projects");
        assert_eq!(machine.env["CHE_PROJECTS_ROOT"], "/projects");
    }
}
