use super::phase::{BrokerContext, BrokerPhase};
use crate::error::{self, ErrorKind, Result};
use log::{info, warn};
use std::time::Duration;

/// Blocks until the listener delivers the broker's outcome or `timeout` has passed.
pub(crate) struct WaitBrokerResult {
    pub(crate) timeout: Duration,
}

#[async_trait::async_trait]
impl BrokerPhase for WaitBrokerResult {
    fn name(&self) -> &'static str {
        "wait broker result"
    }

    async fn execute(&self, context: &mut BrokerContext) -> Result<()> {
        let workspace_id = context.identity.workspace_id.clone();
        let plugins = match context.brokers_result.get(self.timeout).await {
            Ok(plugins) => plugins,
            Err(e) if e.kind() == ErrorKind::Timeout => {
                let minutes = self.timeout.as_secs() / 60;
                warn!(
                    "Plugin broker of workspace '{}' did not report within {} minutes",
                    workspace_id, minutes
                );
                return error::BrokerTimeoutSnafu {
                    workspace_id,
                    minutes,
                }
                .fail()
                .map_err(Into::into);
            }
            Err(e) => return Err(e),
        };
        info!(
            "Plugin broker of workspace '{}' resolved {} plugins",
            workspace_id,
            plugins.len()
        );
        context.plugins = Some(plugins);
        Ok(())
    }
}
