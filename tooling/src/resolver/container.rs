use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar as K8sEnvVar, ExecAction as K8sExecAction,
    Lifecycle as K8sLifecycle, LifecycleHandler, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use snafu::ResultExt;
use std::collections::BTreeMap;
use tooling_model::constants::MAX_CONTAINER_NAME_LENGTH;
use tooling_model::{names, size, CheContainer, ChePluginEndpoint, EnvVar, Handler};

/// The number of random characters appended to sidecar container names.
const NAME_SUFFIX_LENGTH: usize = 3;

/// Turns a plugin container descriptor into a Kubernetes container. `endpoints` are the plugin
/// endpoints that target one of the container's exposed ports, each of them is exposed as a TCP
/// container port.
pub(crate) fn resolve_container(
    che_container: &CheContainer,
    image_pull_policy: Option<&str>,
    endpoints: &[ChePluginEndpoint],
) -> Result<Container> {
    Ok(Container {
        name: container_name(&che_container.name),
        image: Some(che_container.image.clone()),
        image_pull_policy: image_pull_policy.map(str::to_string),
        command: non_empty(&che_container.command),
        args: non_empty(&che_container.args),
        env: non_empty(&k8s_env(&che_container.env)),
        ports: non_empty(&container_ports(endpoints)),
        resources: resources(che_container)?,
        lifecycle: lifecycle(che_container),
        ..Container::default()
    })
}

pub(crate) fn k8s_env(env: &[EnvVar]) -> Vec<K8sEnvVar> {
    env.iter()
        .map(|var| K8sEnvVar {
            name: var.name.clone(),
            value: Some(var.value.clone()),
            value_from: None,
        })
        .collect()
}

/// A random suffix keeps sidecars of different plugins apart even if they declare the same name.
fn container_name(name: &str) -> String {
    let base: String = name
        .chars()
        .take(MAX_CONTAINER_NAME_LENGTH - NAME_SUFFIX_LENGTH)
        .collect();
    names::generate(base, NAME_SUFFIX_LENGTH).to_lowercase()
}

fn container_ports(endpoints: &[ChePluginEndpoint]) -> Vec<ContainerPort> {
    endpoints
        .iter()
        .map(|endpoint| ContainerPort {
            container_port: endpoint.target_port,
            protocol: Some("TCP".to_string()),
            ..ContainerPort::default()
        })
        .collect()
}

fn resources(che_container: &CheContainer) -> Result<Option<ResourceRequirements>> {
    let mut limits = BTreeMap::new();
    let mut requests = BTreeMap::new();
    let container = &che_container.name;
    if let Some(value) = &che_container.memory_limit {
        size::to_bytes(value).context(error::IllegalResourceValueSnafu {
            field: "memoryLimit",
            value,
            container,
        })?;
        limits.insert("memory".to_string(), Quantity(value.clone()));
    }
    if let Some(value) = &che_container.memory_request {
        size::to_bytes(value).context(error::IllegalResourceValueSnafu {
            field: "memoryRequest",
            value,
            container,
        })?;
        requests.insert("memory".to_string(), Quantity(value.clone()));
    }
    if let Some(value) = &che_container.cpu_limit {
        size::to_cores(value).context(error::IllegalResourceValueSnafu {
            field: "cpuLimit",
            value,
            container,
        })?;
        limits.insert("cpu".to_string(), Quantity(value.clone()));
    }
    if let Some(value) = &che_container.cpu_request {
        size::to_cores(value).context(error::IllegalResourceValueSnafu {
            field: "cpuRequest",
            value,
            container,
        })?;
        requests.insert("cpu".to_string(), Quantity(value.clone()));
    }
    if limits.is_empty() && requests.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResourceRequirements {
        limits: if limits.is_empty() { None } else { Some(limits) },
        requests: if requests.is_empty() {
            None
        } else {
            Some(requests)
        },
        ..ResourceRequirements::default()
    }))
}

fn lifecycle(che_container: &CheContainer) -> Option<K8sLifecycle> {
    let hooks = che_container.lifecycle.as_ref()?;
    let post_start = exec_handler(hooks.post_start.as_ref());
    let pre_stop = exec_handler(hooks.pre_stop.as_ref());
    if post_start.is_none() && pre_stop.is_none() {
        return None;
    }
    Some(K8sLifecycle {
        post_start,
        pre_stop,
    })
}

/// Only `exec` hooks are supported. Other hook types and hooks without a command are dropped.
fn exec_handler(handler: Option<&Handler>) -> Option<LifecycleHandler> {
    let command = &handler?.exec.as_ref()?.command;
    if command.is_empty() {
        return None;
    }
    Some(LifecycleHandler {
        exec: Some(K8sExecAction {
            command: Some(command.clone()),
        }),
        ..LifecycleHandler::default()
    })
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}
