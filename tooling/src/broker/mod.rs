/*!

The plugin broker pipeline. A broker is a short-lived pod that resolves plugin metadata and
reports it back over the [`BrokerEventBus`]. [`BrokerManager::get_tooling`] runs it in four
phases: listen for events, prepare storage, deploy the broker and wait for its result. A phase
runs only if the previous one succeeded, and the listener is always subscribed before the broker
is deployed.

!*/

mod deploy;
mod environment;
mod events;
mod listen;
mod phase;
mod prepare_storage;
mod wait;

pub use environment::{BrokerEnvironmentFactory, BrokerSettings};
pub use events::BrokerEventBus;

use crate::clients::{NamespaceClient, WorkspaceVolumesStrategy};
use crate::error::Result;
use deploy::DeployBroker;
use listen::ListenBrokerEvents;
use log::info;
use phase::{run_phases, BrokerContext, BrokerPhase};
use prepare_storage::PrepareStorage;
use std::sync::Arc;
use std::time::Duration;
use tooling_model::{ChePlugin, PluginFQN, RuntimeIdentity};
use wait::WaitBrokerResult;

/// Runs plugin brokers and returns the plugins that they resolve.
pub struct BrokerManager {
    namespace_client: Arc<dyn NamespaceClient>,
    volumes_strategy: Arc<dyn WorkspaceVolumesStrategy>,
    event_bus: BrokerEventBus,
    environment_factory: BrokerEnvironmentFactory,
    wait_timeout: Duration,
}

impl BrokerManager {
    pub fn new(
        namespace_client: Arc<dyn NamespaceClient>,
        volumes_strategy: Arc<dyn WorkspaceVolumesStrategy>,
        event_bus: BrokerEventBus,
        environment_factory: BrokerEnvironmentFactory,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            namespace_client,
            volumes_strategy,
            event_bus,
            environment_factory,
            wait_timeout,
        }
    }

    /// Deploys a metadata broker for `plugins` and waits for the plugins it resolves.
    pub async fn get_tooling(
        &self,
        identity: &RuntimeIdentity,
        plugins: &[PluginFQN],
        ephemeral: bool,
        merge_plugins: bool,
    ) -> Result<Vec<ChePlugin>> {
        info!(
            "Resolving {} plugins for workspace '{}'",
            plugins.len(),
            identity.workspace_id
        );
        let broker_environment = self
            .environment_factory
            .metadata_broker(identity, plugins, merge_plugins)?;
        let mut context = BrokerContext::new(identity.clone(), ephemeral, broker_environment);
        run_phases(&self.phases(), &mut context).await?;
        Ok(context.plugins.take().unwrap_or_default())
    }

    /// The artifacts broker is not run by the manager, it is merged into the workspace instead.
    pub fn environment_factory(&self) -> &BrokerEnvironmentFactory {
        &self.environment_factory
    }

    fn phases(&self) -> Vec<Box<dyn BrokerPhase>> {
        vec![
            Box::new(ListenBrokerEvents {
                event_bus: self.event_bus.clone(),
            }),
            Box::new(PrepareStorage {
                strategy: self.volumes_strategy.clone(),
            }),
            Box::new(DeployBroker {
                client: self.namespace_client.clone(),
            }),
            Box::new(WaitBrokerResult {
                timeout: self.wait_timeout,
            }),
        ]
    }
}
