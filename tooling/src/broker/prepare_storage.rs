use super::phase::{BrokerContext, BrokerPhase};
use crate::clients::WorkspaceVolumesStrategy;
use crate::error::{self, Result};
use log::debug;
use snafu::ResultExt;
use std::sync::Arc;

/// Provisions the workspace storage before the broker pod is scheduled, so the broker never
/// starts against a missing claim.
pub(crate) struct PrepareStorage {
    pub(crate) strategy: Arc<dyn WorkspaceVolumesStrategy>,
}

#[async_trait::async_trait]
impl BrokerPhase for PrepareStorage {
    fn name(&self) -> &'static str {
        "prepare storage"
    }

    async fn execute(&self, context: &mut BrokerContext) -> Result<()> {
        if context.ephemeral {
            debug!(
                "Workspace '{}' is ephemeral, no storage to prepare",
                context.identity.workspace_id
            );
            return Ok(());
        }
        self.strategy
            .prepare(&context.identity, &context.broker_environment)
            .await
            .context(error::ClientSnafu {
                operation: "prepare plugin storage",
                workspace_id: &context.identity.workspace_id,
            })?;
        Ok(())
    }
}
