pub(crate) mod mock;

use mock::{
    identity, init_logger, plugin, BrokerReply, MockNamespaceClient, MockVolumesStrategy,
    WORKSPACE_ID,
};
use sidecar_tooling::{
    BrokerEnvironmentFactory, BrokerEventBus, BrokerManager, ErrorKind, ToolingConfig,
};
use std::sync::Arc;
use tooling_model::PluginFQN;

fn references() -> Vec<PluginFQN> {
    vec![PluginFQN {
        id: "eclipse/che-theia/next".to_string(),
        ..PluginFQN::default()
    }]
}

fn manager(
    client: Arc<MockNamespaceClient>,
    strategy: Arc<MockVolumesStrategy>,
    event_bus: BrokerEventBus,
) -> BrokerManager {
    let config = ToolingConfig::default();
    BrokerManager::new(
        client,
        strategy,
        event_bus,
        BrokerEnvironmentFactory::new(config.broker_settings()),
        config.broker_wait_timeout(),
    )
}

#[tokio::test]
async fn broker_reports_plugins() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::new(
        event_bus.clone(),
        BrokerReply::Plugins(vec![plugin(
            "eclipse/che-theia/next",
            "theia-ide",
            &[("theia", 3100)],
        )]),
    ));
    let strategy = Arc::new(MockVolumesStrategy::default());
    let manager = manager(client.clone(), strategy.clone(), event_bus);

    let plugins = manager
        .get_tooling(&identity(), &references(), false, false)
        .await
        .unwrap();

    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].id, "eclipse/che-theia/next");
    assert_eq!(strategy.prepared(), vec![WORKSPACE_ID.to_string()]);
    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("config_map che-plugin-broker-config-"));
    assert!(calls[1].starts_with("pod che-plugin-broker-"));
}

#[tokio::test]
async fn ephemeral_workspace_skips_storage() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::new(
        event_bus.clone(),
        BrokerReply::Plugins(vec![]),
    ));
    let strategy = Arc::new(MockVolumesStrategy::default());
    let manager = manager(client, strategy.clone(), event_bus);

    let plugins = manager
        .get_tooling(&identity(), &references(), true, false)
        .await
        .unwrap();

    assert!(plugins.is_empty());
    assert!(strategy.prepared().is_empty());
}

#[tokio::test]
async fn broker_failure_is_reported() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::new(
        event_bus.clone(),
        BrokerReply::Failure("plugin registry is unreachable".to_string()),
    ));
    let manager = manager(client, Arc::new(MockVolumesStrategy::default()), event_bus);

    let error = manager
        .get_tooling(&identity(), &references(), false, false)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Infrastructure);
    assert!(error.to_string().contains("plugin registry is unreachable"));
    assert!(error.to_string().contains(WORKSPACE_ID));
}

#[tokio::test]
async fn deploy_failure_stops_the_run() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::failing(event_bus.clone(), "pod"));
    let manager = manager(
        client.clone(),
        Arc::new(MockVolumesStrategy::default()),
        event_bus,
    );

    let error = manager
        .get_tooling(&identity(), &references(), false, false)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Infrastructure);
    assert!(error.to_string().contains("deploy plugin broker"));
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn silent_broker_times_out() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::new(
        event_bus.clone(),
        BrokerReply::Silence,
    ));
    let manager = manager(client, Arc::new(MockVolumesStrategy::default()), event_bus);

    let error = manager
        .get_tooling(&identity(), &references(), false, false)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(
        error.to_string(),
        "Plugins installation process timed out after 3 minutes for workspace 'workspace1'"
    );
}

#[tokio::test(start_paused = true)]
async fn events_of_other_workspaces_are_ignored() {
    init_logger();
    let event_bus = BrokerEventBus::new();
    let client = Arc::new(MockNamespaceClient::new(
        event_bus.clone(),
        BrokerReply::Silence,
    ));
    let manager = manager(client, Arc::new(MockVolumesStrategy::default()), event_bus.clone());

    let publisher = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        event_bus.publish(tooling_model::BrokerEvent::done("workspace2", vec![]));
    });
    let error = manager
        .get_tooling(&identity(), &references(), false, false)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    publisher.await.unwrap();
}
