/*!

Provisioners that add the cluster objects a sidecar depends on to the workspace environment.

!*/

mod services;
mod volumes;

pub(crate) use services::provision_services;
pub use volumes::ClaimSettings;
pub(crate) use volumes::PluginVolumesApplier;
