/*!

Seams to the cluster. The broker pipeline only builds objects, submitting them is delegated to a
[`NamespaceClient`] and storage provisioning to a [`WorkspaceVolumesStrategy`]. Both are traits so
that tests can inject mocks.

!*/

mod error;
mod namespace_client;
mod volumes_strategy;

pub use error::{ClientError, ClientResult};
pub use namespace_client::{KubeNamespaceClient, NamespaceClient};
pub use volumes_strategy::{CommonClaimStrategy, WorkspaceVolumesStrategy};
