use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use log::debug;
use maplit::btreemap;
use snafu::ensure;
use tooling_model::constants::CHE_ORIGINAL_NAME_LABEL;
use tooling_model::{ChePluginEndpoint, WorkspaceEnvironment};

/// Adds one service per endpoint so that sidecar endpoints are reachable by name. Services select
/// the workspace pod by its original name label and expose the endpoint's target port.
pub(crate) fn provision_services(
    environment: &mut dyn WorkspaceEnvironment,
    pod_name: &str,
    endpoints: &[ChePluginEndpoint],
) -> Result<()> {
    for endpoint in endpoints {
        let services = environment.services_mut();
        ensure!(
            !services.contains_key(&endpoint.name),
            error::ServiceExistsSnafu {
                name: &endpoint.name
            }
        );
        debug!(
            "Exposing endpoint '{}' of pod '{}' on port {}",
            endpoint.name, pod_name, endpoint.target_port
        );
        services.insert(endpoint.name.clone(), service(pod_name, endpoint));
    }
    Ok(())
}

fn service(pod_name: &str, endpoint: &ChePluginEndpoint) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(endpoint.name.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(btreemap! {
                CHE_ORIGINAL_NAME_LABEL.to_string() => pod_name.to_string(),
            }),
            ports: Some(vec![ServicePort {
                port: endpoint.target_port,
                target_port: Some(IntOrString::Int(endpoint.target_port)),
                protocol: Some("TCP".to_string()),
                ..ServicePort::default()
            }]),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}
