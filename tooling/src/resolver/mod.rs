/*!

Resolvers translate abstract plugin containers into Kubernetes containers and the machine
configurations that describe them to the workspace runtime.

!*/

mod container;
mod machine;

pub(crate) use container::{k8s_env, resolve_container};
pub(crate) use machine::MachineResolver;
pub use machine::{ProjectsRoot, ResourceDefaults};
