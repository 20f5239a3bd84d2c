/*!

This library provides the data model of workspace tooling: resolved plugin descriptors, devfile
components, machine configurations and the in-memory workspace environment that tooling is
provisioned into.

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

pub use devfile::{ComponentEndpoint, ComponentVolume, DevfileComponent, Warning, WorkspaceCommand};
pub use environment::{
    KubernetesEnvironment, OpenShiftEnvironment, RuntimeIdentity, WorkspaceEnvironment,
};
pub use error::{Error, Result};
pub use event::{BrokerEvent, BrokerStatus};
pub use machine::{InternalMachineConfig, MachineVolume, ServerConfig};
pub use plugin::{
    CheContainer, CheContainerPort, ChePlugin, ChePluginEndpoint, Command, EnvVar, ExecAction,
    Handler, Lifecycle, PluginFQN, Volume,
};

pub mod constants;
mod devfile;
mod environment;
mod error;
mod event;
mod machine;
pub mod names;
mod plugin;
mod serde_utils;
pub mod size;
