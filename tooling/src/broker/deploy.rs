use super::phase::{BrokerContext, BrokerPhase};
use crate::clients::{ClientResult, NamespaceClient};
use crate::error::{self, Result};
use log::info;
use snafu::ResultExt;
use std::sync::Arc;
use tooling_model::KubernetesEnvironment;

/// Submits the broker's config maps, pod and services into the workspace namespace. Objects that
/// were created before a failure are left for the workspace stop to clean up.
pub(crate) struct DeployBroker {
    pub(crate) client: Arc<dyn NamespaceClient>,
}

impl DeployBroker {
    async fn submit(
        &self,
        namespace: &str,
        environment: &KubernetesEnvironment,
    ) -> ClientResult<()> {
        for config_map in environment.config_maps.values() {
            self.client.create_config_map(namespace, config_map).await?;
        }
        for pod in environment.pods.values() {
            self.client.create_pod(namespace, pod).await?;
        }
        for service in environment.services.values() {
            self.client.create_service(namespace, service).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BrokerPhase for DeployBroker {
    fn name(&self) -> &'static str {
        "deploy broker"
    }

    async fn execute(&self, context: &mut BrokerContext) -> Result<()> {
        let namespace = &context.identity.infrastructure_namespace;
        info!(
            "Deploying plugin broker of workspace '{}' to namespace '{}'",
            context.identity.workspace_id, namespace
        );
        self.submit(namespace, &context.broker_environment)
            .await
            .context(error::ClientSnafu {
                operation: "deploy plugin broker",
                workspace_id: &context.identity.workspace_id,
            })?;
        Ok(())
    }
}
