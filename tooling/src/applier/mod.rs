/*!

Appliers merge resolved plugins into a workspace environment. Which [`ChePluginsApplier`] is used
depends on the environment type, the artifacts broker is merged by the [`ArtifactsBrokerApplier`]
regardless of the type.

!*/

mod artifacts;
mod tooling;

pub use artifacts::ArtifactsBrokerApplier;
pub use tooling::KubernetesPluginsToolingApplier;

use crate::error::Result;
use tooling_model::{ChePlugin, RuntimeIdentity, WorkspaceEnvironment};

/// Adds the containers, volumes, services and commands of `plugins` to `environment`.
pub trait ChePluginsApplier: Send + Sync {
    fn apply(
        &self,
        identity: &RuntimeIdentity,
        environment: &mut dyn WorkspaceEnvironment,
        plugins: &[ChePlugin],
    ) -> Result<()>;
}
