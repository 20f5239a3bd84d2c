use super::error::ClientResult;
use super::namespace_client::NamespaceClient;
use crate::provision::ClaimSettings;
use log::{debug, info};
use std::sync::Arc;
use tooling_model::{KubernetesEnvironment, RuntimeIdentity};

/// `WorkspaceVolumesStrategy` provisions the storage that a workspace (and the plugin broker that
/// runs for it) needs before anything is scheduled in the workspace namespace.
#[async_trait::async_trait]
pub trait WorkspaceVolumesStrategy: Send + Sync {
    async fn prepare(
        &self,
        identity: &RuntimeIdentity,
        environment: &KubernetesEnvironment,
    ) -> ClientResult<()>;
}

/// Backs every workspace by one common claim plus the claims that its environment declares.
pub struct CommonClaimStrategy {
    client: Arc<dyn NamespaceClient>,
    claim_name: String,
    settings: ClaimSettings,
}

impl CommonClaimStrategy {
    pub fn new<S: Into<String>>(
        client: Arc<dyn NamespaceClient>,
        claim_name: S,
        settings: ClaimSettings,
    ) -> Self {
        Self {
            client,
            claim_name: claim_name.into(),
            settings,
        }
    }
}

#[async_trait::async_trait]
impl WorkspaceVolumesStrategy for CommonClaimStrategy {
    async fn prepare(
        &self,
        identity: &RuntimeIdentity,
        environment: &KubernetesEnvironment,
    ) -> ClientResult<()> {
        let namespace = &identity.infrastructure_namespace;
        info!(
            "Preparing claim '{}' for workspace '{}' in namespace '{}'",
            self.claim_name, identity.workspace_id, namespace
        );
        let common = self
            .settings
            .claim(&self.claim_name, &identity.workspace_id);
        self.client
            .ensure_persistent_volume_claim(namespace, &common)
            .await?;
        for (name, claim) in &environment.persistent_volume_claims {
            if name == &self.claim_name {
                continue;
            }
            debug!("Preparing claim '{}' in namespace '{}'", name, namespace);
            self.client
                .ensure_persistent_volume_claim(namespace, claim)
                .await?;
        }
        Ok(())
    }
}
