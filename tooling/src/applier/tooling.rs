use super::ChePluginsApplier;
use crate::config::ToolingConfig;
use crate::error::{self, Result};
use crate::provision::{provision_services, PluginVolumesApplier};
use crate::resolver::{
    k8s_env, resolve_container, MachineResolver, ProjectsRoot, ResourceDefaults,
};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use log::{debug, info, warn};
use maplit::btreemap;
use snafu::{ensure, OptionExt};
use std::collections::{BTreeMap, BTreeSet};
use tooling_model::constants::{
    CHE_ORIGINAL_NAME_LABEL, COMMAND_IN_PLUGIN_WITHOUT_CONTAINERS_WARNING_CODE,
    COMMAND_IN_PLUGIN_WITH_MULTIPLE_CONTAINERS_WARNING_CODE, COMMAND_MACHINE_NAME_ATTRIBUTE,
    COMMAND_PLUGIN_ATTRIBUTE, COMMAND_WORKING_DIRECTORY_ATTRIBUTE, CONTAINER_SOURCE_ATTRIBUTE,
    CUSTOM_COMMAND_TYPE, JWT_PROXY_SECURE_EXPOSER, PLUGIN_MACHINE_ATTRIBUTE,
    SECURE_EXPOSER_IMPL_PROPERTY, TOOL_CONTAINER_SOURCE,
};
use tooling_model::{
    names, CheContainer, ChePlugin, ChePluginEndpoint, Command, DevfileComponent,
    RuntimeIdentity, Warning, WorkspaceCommand, WorkspaceEnvironment,
};

/// The pod that hosts tooling when the workspace itself declares none.
const TOOLING_POD_NAME: &str = "workspace";

/// Adds plugin sidecars to the single pod of a Kubernetes or OpenShift workspace.
pub struct KubernetesPluginsToolingApplier {
    image_pull_policy: Option<String>,
    defaults: ResourceDefaults,
    projects_root: ProjectsRoot,
    volumes: PluginVolumesApplier,
    auth_enabled: bool,
}

impl KubernetesPluginsToolingApplier {
    pub fn new(config: &ToolingConfig) -> Result<Self> {
        Ok(Self {
            image_pull_policy: config.image_pull_policy(),
            defaults: config.resource_defaults()?,
            projects_root: config.projects_root(),
            volumes: PluginVolumesApplier {
                claims: config.claim_settings(),
            },
            auth_enabled: config.auth_enabled,
        })
    }

    /// Resolves `che_container` and adds the env that the devfile component declares.
    fn resolve(
        &self,
        che_container: &CheContainer,
        endpoints: &[ChePluginEndpoint],
        component: &DevfileComponent,
    ) -> Result<Container> {
        let mut container =
            resolve_container(che_container, self.image_pull_policy.as_deref(), endpoints)?;
        if !component.env.is_empty() {
            container
                .env
                .get_or_insert_with(Vec::new)
                .extend(k8s_env(&component.env));
        }
        Ok(container)
    }

    fn apply_init_containers(
        &self,
        identity: &RuntimeIdentity,
        environment: &mut dyn WorkspaceEnvironment,
        pod_name: &str,
        plugin: &ChePlugin,
        component: &DevfileComponent,
    ) -> Result<()> {
        for che_container in &plugin.init_containers {
            let mut container = self.resolve(che_container, &[], component)?;
            self.volumes.apply(
                environment,
                &identity.workspace_id,
                pod_name,
                &mut container,
                &che_container.volumes,
            )?;
            debug!(
                "Adding init container '{}' of plugin '{}'",
                container.name, plugin.id
            );
            pod_spec(environment, pod_name)?
                .init_containers
                .get_or_insert_with(Vec::new)
                .push(container);
        }
        Ok(())
    }

    /// Returns the machine names of the sidecars in the order the plugin declares them.
    fn apply_sidecars(
        &self,
        identity: &RuntimeIdentity,
        environment: &mut dyn WorkspaceEnvironment,
        pod_name: &str,
        plugin: &ChePlugin,
        component: &DevfileComponent,
    ) -> Result<Vec<String>> {
        let mut machine_names = Vec::new();
        for (che_container, endpoints) in plugin.container_endpoints() {
            let mut container = self.resolve(che_container, &endpoints, component)?;
            self.volumes.apply(
                environment,
                &identity.workspace_id,
                pod_name,
                &mut container,
                &che_container.volumes,
            )?;
            let mut machine = MachineResolver {
                plugin_id: &plugin.id,
                container: &container,
                che_container,
                endpoints: &endpoints,
                component,
                defaults: &self.defaults,
                projects_root: &self.projects_root,
            }
            .resolve()?;
            machine.attributes.insert(
                CONTAINER_SOURCE_ATTRIBUTE.to_string(),
                TOOL_CONTAINER_SOURCE.to_string(),
            );
            machine
                .attributes
                .insert(PLUGIN_MACHINE_ATTRIBUTE.to_string(), plugin.id.clone());

            let machine_name = names::machine_name(pod_name, &container.name);
            for command in &che_container.commands {
                environment
                    .commands_mut()
                    .push(plugin_command(command, &machine_name));
            }
            info!(
                "Adding sidecar '{}' of plugin '{}' to pod '{}'",
                container.name, plugin.id, pod_name
            );
            pod_spec(environment, pod_name)?.containers.push(container);
            environment
                .machines_mut()
                .insert(machine_name.clone(), machine);
            provision_services(environment, pod_name, &endpoints)?;
            machine_names.push(machine_name);
        }
        Ok(machine_names)
    }
}

impl ChePluginsApplier for KubernetesPluginsToolingApplier {
    fn apply(
        &self,
        identity: &RuntimeIdentity,
        environment: &mut dyn WorkspaceEnvironment,
        plugins: &[ChePlugin],
    ) -> Result<()> {
        if plugins.is_empty() {
            debug!(
                "No plugins to apply to workspace '{}'",
                identity.workspace_id
            );
            return Ok(());
        }
        let pod_name = tooling_pod(environment)?;
        let components: Vec<DevfileComponent> = environment
            .devfile_components()
            .iter()
            .filter(|component| component.is_plugin_backed())
            .cloned()
            .collect();
        let command_index = plugin_commands(&environment.kubernetes().commands);
        let mut consumed = BTreeSet::new();

        for plugin in plugins {
            let component = plugin_component(&components, &plugin.id)?;
            self.apply_init_containers(identity, environment, &pod_name, plugin, component)?;
            let machine_names =
                self.apply_sidecars(identity, environment, &pod_name, plugin, component)?;
            if !consumed.insert(plugin.id.as_str()) {
                continue;
            }
            if let Some(positions) = command_index.get(&plugin.id) {
                bind_commands(environment, &plugin.id, positions, &machine_names);
            }
        }

        apply_workspace_env(environment, plugins);
        if self.auth_enabled {
            environment
                .attributes_mut()
                .entry(SECURE_EXPOSER_IMPL_PROPERTY.to_string())
                .or_insert_with(|| JWT_PROXY_SECURE_EXPOSER.to_string());
        }
        Ok(())
    }
}

/// The name of the pod that tooling goes to, creating it if the environment has no pod yet.
fn tooling_pod(environment: &mut dyn WorkspaceEnvironment) -> Result<String> {
    let count = environment.pods().len();
    ensure!(count <= 1, error::MultiplePodsSnafu { count });
    if let Some(name) = environment.pods().keys().next() {
        return Ok(name.clone());
    }
    debug!("Creating pod '{}' to host the plugins", TOOLING_POD_NAME);
    environment.pods_mut().insert(
        TOOLING_POD_NAME.to_string(),
        Pod {
            metadata: ObjectMeta {
                name: Some(TOOLING_POD_NAME.to_string()),
                labels: Some(btreemap! {
                    CHE_ORIGINAL_NAME_LABEL.to_string() => TOOLING_POD_NAME.to_string(),
                }),
                ..ObjectMeta::default()
            },
            spec: Some(PodSpec::default()),
            ..Pod::default()
        },
    );
    Ok(TOOLING_POD_NAME.to_string())
}

fn pod_spec<'a>(
    environment: &'a mut dyn WorkspaceEnvironment,
    pod_name: &str,
) -> Result<&'a mut PodSpec> {
    let pod = environment
        .pods_mut()
        .get_mut(pod_name)
        .context(error::PodMissingSnafu { pod_name })?;
    Ok(pod.spec.get_or_insert_with(Default::default))
}

fn plugin_component<'a>(
    components: &'a [DevfileComponent],
    plugin_id: &str,
) -> Result<&'a DevfileComponent> {
    Ok(components
        .iter()
        .find(|component| component.id.as_deref() == Some(plugin_id))
        .with_context(|| error::MissingDevfileComponentSnafu {
            plugin_id,
            available: components
                .iter()
                .filter_map(|component| component.id.as_deref())
                .collect::<Vec<_>>()
                .join(", "),
        })?)
}

/// Positions of the environment's commands grouped by the plugin that they reference.
fn plugin_commands(commands: &[WorkspaceCommand]) -> BTreeMap<String, Vec<usize>> {
    let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, command) in commands.iter().enumerate() {
        if let Some(plugin) = command.attributes.get(COMMAND_PLUGIN_ATTRIBUTE) {
            index.entry(plugin.clone()).or_default().push(position);
        }
    }
    index
}

/// Points the commands at `positions` to the machine of the plugin. A plugin without sidecars
/// leaves them unbound, a plugin with several binds them to the first one.
fn bind_commands(
    environment: &mut dyn WorkspaceEnvironment,
    plugin_id: &str,
    positions: &[usize],
    machine_names: &[String],
) {
    let machine_name = match machine_names {
        [] => {
            let message = format!(
                "There are configured commands for plugin '{}' that doesn't have any containers",
                plugin_id
            );
            warn!("{}", message);
            environment.add_warning(Warning::new(
                COMMAND_IN_PLUGIN_WITHOUT_CONTAINERS_WARNING_CODE,
                message,
            ));
            return;
        }
        [only] => only,
        [first, ..] => {
            let message = format!(
                "There are configured commands for plugin '{}' that has multiply containers. \
                Commands will be configured to be run in first container",
                plugin_id
            );
            warn!("{}", message);
            environment.add_warning(Warning::new(
                COMMAND_IN_PLUGIN_WITH_MULTIPLE_CONTAINERS_WARNING_CODE,
                message,
            ));
            first
        }
    };
    let commands = environment.commands_mut();
    for position in positions {
        if let Some(command) = commands.get_mut(*position) {
            command.attributes.insert(
                COMMAND_MACHINE_NAME_ATTRIBUTE.to_string(),
                machine_name.clone(),
            );
        }
    }
}

fn plugin_command(command: &Command, machine_name: &str) -> WorkspaceCommand {
    let mut workspace_command = WorkspaceCommand::new(
        &command.name,
        command.command.join(" "),
        CUSTOM_COMMAND_TYPE,
    );
    workspace_command.attributes.insert(
        COMMAND_WORKING_DIRECTORY_ATTRIBUTE.to_string(),
        command.working_dir.clone(),
    );
    workspace_command.attributes.insert(
        COMMAND_MACHINE_NAME_ATTRIBUTE.to_string(),
        machine_name.to_string(),
    );
    workspace_command
}

/// Workspace-wide env of every plugin goes to every container of every pod.
fn apply_workspace_env(environment: &mut dyn WorkspaceEnvironment, plugins: &[ChePlugin]) {
    let env: Vec<_> = plugins
        .iter()
        .flat_map(|plugin| k8s_env(&plugin.workspace_env))
        .collect();
    if env.is_empty() {
        return;
    }
    for pod in environment.pods_mut().values_mut() {
        let spec = pod.spec.get_or_insert_with(Default::default);
        for container in &mut spec.containers {
            container
                .env
                .get_or_insert_with(Vec::new)
                .extend(env.iter().cloned());
        }
    }
}
