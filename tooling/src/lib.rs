/*!

This library provisions plugin sidecars into a workspace environment. A short-lived broker pod
resolves the plugins that the workspace asks for, its result is handed from the broker event
listener to the waiting pipeline through a [`BrokersResult`], and the resolved plugins are then
merged into the workspace pod as sidecar containers, machines, volumes, services and commands.

The entry point is the [`SidecarToolingProvisioner`]. Cluster access goes through the
[`clients::NamespaceClient`] and [`clients::WorkspaceVolumesStrategy`] traits so that the
provisioner can be tested without Kubernetes.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use applier::{ArtifactsBrokerApplier, ChePluginsApplier, KubernetesPluginsToolingApplier};
pub use broker::{BrokerEnvironmentFactory, BrokerEventBus, BrokerManager, BrokerSettings};
pub use brokers_result::BrokersResult;
pub use config::ToolingConfig;
pub use error::{Error, ErrorKind, Result};
pub use provision::ClaimSettings;
pub use provisioner::SidecarToolingProvisioner;
pub use resolver::{ProjectsRoot, ResourceDefaults};

mod applier;
mod broker;
mod brokers_result;
pub mod clients;
mod config;
mod error;
mod fqn_parser;
mod provision;
mod provisioner;
mod resolver;
