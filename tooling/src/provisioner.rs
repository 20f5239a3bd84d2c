/*!

`SidecarToolingProvisioner` is what a workspace start calls. It reads the plugins that the
workspace asks for, has a broker resolve them and merges the result into the environment.

!*/

use crate::applier::{ArtifactsBrokerApplier, ChePluginsApplier, KubernetesPluginsToolingApplier};
use crate::broker::{BrokerEnvironmentFactory, BrokerEventBus, BrokerManager};
use crate::clients::{CommonClaimStrategy, NamespaceClient};
use crate::config::ToolingConfig;
use crate::error::{self, Result};
use crate::fqn_parser::parse_plugins;
use log::{debug, info};
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tooling_model::constants::{
    KUBERNETES_ENVIRONMENT_TYPE, MERGE_PLUGINS_ATTRIBUTE, OPENSHIFT_ENVIRONMENT_TYPE,
    PERSIST_VOLUMES_ATTRIBUTE,
};
use tooling_model::{RuntimeIdentity, WorkspaceEnvironment};

pub struct SidecarToolingProvisioner {
    appliers: BTreeMap<String, Arc<dyn ChePluginsApplier>>,
    broker_manager: BrokerManager,
    artifacts_applier: ArtifactsBrokerApplier,
    default_merge_plugins: bool,
}

impl SidecarToolingProvisioner {
    /// A provisioner without appliers. Register one per supported environment type with
    /// [`SidecarToolingProvisioner::with_applier`].
    pub fn new(broker_manager: BrokerManager, default_merge_plugins: bool) -> Self {
        Self {
            appliers: BTreeMap::new(),
            broker_manager,
            artifacts_applier: ArtifactsBrokerApplier,
            default_merge_plugins,
        }
    }

    /// Wires up a provisioner for Kubernetes and OpenShift workspaces from `config`.
    pub fn from_config(
        config: &ToolingConfig,
        namespace_client: Arc<dyn NamespaceClient>,
        event_bus: BrokerEventBus,
    ) -> Result<Self> {
        let volumes_strategy = Arc::new(CommonClaimStrategy::new(
            namespace_client.clone(),
            &config.workspace_claim_name,
            config.claim_settings(),
        ));
        let broker_manager = BrokerManager::new(
            namespace_client,
            volumes_strategy,
            event_bus,
            BrokerEnvironmentFactory::new(config.broker_settings()),
            config.broker_wait_timeout(),
        );
        let applier: Arc<dyn ChePluginsApplier> =
            Arc::new(KubernetesPluginsToolingApplier::new(config)?);
        Ok(Self::new(broker_manager, config.default_merge_plugins)
            .with_applier(KUBERNETES_ENVIRONMENT_TYPE, applier.clone())
            .with_applier(OPENSHIFT_ENVIRONMENT_TYPE, applier))
    }

    pub fn with_applier<S: Into<String>>(
        mut self,
        environment_type: S,
        applier: Arc<dyn ChePluginsApplier>,
    ) -> Self {
        self.appliers.insert(environment_type.into(), applier);
        self
    }

    /// Adds the tooling that the workspace attributes ask for to `environment`. Does nothing if
    /// the workspace asks for no plugins.
    pub async fn provision(
        &self,
        identity: &RuntimeIdentity,
        environment: &mut dyn WorkspaceEnvironment,
    ) -> Result<()> {
        let plugins = parse_plugins(environment.attributes())?;
        if plugins.is_empty() {
            debug!(
                "Workspace '{}' has no plugins to provision",
                identity.workspace_id
            );
            return Ok(());
        }
        let environment_type = environment.environment_type().to_string();
        let applier = self
            .appliers
            .get(&environment_type)
            .context(error::UnsupportedEnvironmentSnafu {
                environment_type: &environment_type,
            })?;
        let ephemeral = environment
            .attributes()
            .get(PERSIST_VOLUMES_ATTRIBUTE)
            .map(|persist| persist == "false")
            .unwrap_or(false);
        let merge_plugins = environment
            .attributes()
            .get(MERGE_PLUGINS_ATTRIBUTE)
            .and_then(|merge| merge.parse::<bool>().ok())
            .unwrap_or(self.default_merge_plugins);
        info!(
            "Provisioning {} plugins for {} workspace '{}'",
            plugins.len(),
            environment_type,
            identity.workspace_id
        );

        let tooling = self
            .broker_manager
            .get_tooling(identity, &plugins, ephemeral, merge_plugins)
            .await?;
        applier.apply(identity, environment, &tooling)?;
        let artifacts_broker = self
            .broker_manager
            .environment_factory()
            .artifacts_broker(identity, &plugins, merge_plugins)?;
        self.artifacts_applier
            .apply(environment, artifacts_broker)?;
        Ok(())
    }
}
