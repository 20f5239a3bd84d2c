use super::events::BrokerEventBus;
use super::phase::{BrokerContext, BrokerPhase};
use crate::brokers_result::BrokersResult;
use crate::error::{self, Result};
use log::{debug, error, info, warn};
use snafu::{ensure, OptionExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tooling_model::{names, BrokerEvent, BrokerStatus, ChePlugin};

/// Subscribes to broker events before anything is deployed, so that no event of the broker can be
/// missed, and feeds the outcome of the broker into the run's `BrokersResult`.
pub(crate) struct ListenBrokerEvents {
    pub(crate) event_bus: BrokerEventBus,
}

#[async_trait::async_trait]
impl BrokerPhase for ListenBrokerEvents {
    fn name(&self) -> &'static str {
        "listen broker events"
    }

    async fn execute(&self, context: &mut BrokerContext) -> Result<()> {
        let receiver = self.event_bus.subscribe();
        let workspace_id = context.identity.workspace_id.clone();
        let brokers_result = context.brokers_result.clone();
        context.listener = Some(tokio::spawn(listen(
            receiver,
            workspace_id,
            brokers_result,
        )));
        Ok(())
    }
}

async fn listen(
    mut receiver: Receiver<BrokerEvent>,
    workspace_id: String,
    brokers_result: Arc<BrokersResult>,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(
                    "Broker event listener of workspace '{}' skipped {} events, a lost final \
                    event ends the run with a timeout",
                    workspace_id, skipped
                );
                continue;
            }
            Err(RecvError::Closed) => return,
        };
        if event.runtime_id != workspace_id {
            continue;
        }
        let outcome = match event.status {
            BrokerStatus::Started => {
                info!("Plugin broker of workspace '{}' started", workspace_id);
                continue;
            }
            BrokerStatus::Failed => Err(error::BrokerFailedSnafu {
                workspace_id: &workspace_id,
                message: event.error.unwrap_or_default(),
            }
            .build()
            .into()),
            BrokerStatus::Done => validate(&workspace_id, event.tooling),
        };
        brokers_result.awaiting().await;
        let delivered = match outcome {
            Ok(plugins) => {
                debug!(
                    "Plugin broker of workspace '{}' resolved {} plugins",
                    workspace_id,
                    plugins.len()
                );
                brokers_result.set_result(&plugins)
            }
            Err(e) => brokers_result.error(e),
        };
        if let Err(e) = delivered {
            error!(
                "Unable to deliver the broker result of workspace '{}': {}",
                workspace_id, e
            );
        }
    }
}

/// Checks that the broker reported plugins at all and that every container name it reported can
/// be used in a pod.
fn validate(workspace_id: &str, tooling: Option<Vec<ChePlugin>>) -> Result<Vec<ChePlugin>> {
    let plugins = tooling.context(error::MissingToolingSnafu { workspace_id })?;
    for plugin in &plugins {
        for container in plugin.containers.iter().chain(&plugin.init_containers) {
            ensure!(
                names::is_valid_container_name(&container.name),
                error::InvalidContainerNameSnafu {
                    plugin_id: &plugin.id,
                    name: &container.name,
                }
            );
        }
    }
    Ok(plugins)
}
