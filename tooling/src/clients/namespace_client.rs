use super::error::{self, ClientResult};
use http::StatusCode;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::PostParams;
use kube::{Api, ResourceExt};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::{ensure, ResultExt};
use std::fmt::Debug;

/// `NamespaceClient` submits the objects of a broker environment into the workspace namespace.
///
/// This is provided as a trait so that mock implementations can be injected for testing purposes.
/// In practice you will use the [`KubeNamespaceClient`].
#[async_trait::async_trait]
pub trait NamespaceClient: Send + Sync {
    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap)
        -> ClientResult<()>;

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> ClientResult<()>;

    async fn create_service(&self, namespace: &str, service: &Service) -> ClientResult<()>;

    /// Create the claim unless a claim with the same name already exists in the namespace.
    async fn ensure_persistent_volume_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClientResult<()>;
}

/// Provides the default [`NamespaceClient`] implementation.
#[derive(Clone)]
pub struct KubeNamespaceClient {
    client: kube::Client,
}

impl KubeNamespaceClient {
    /// Create a new `KubeNamespaceClient` using the default k8s client.
    pub async fn new() -> ClientResult<Self> {
        let client = kube::Client::try_default()
            .await
            .context(error::InitializationSnafu)?;
        Ok(Self::new_from_k8s_client(client))
    }

    pub fn new_from_k8s_client(client: kube::Client) -> Self {
        Self { client }
    }

    async fn create<K>(&self, namespace: &str, what: &str, object: &K) -> ClientResult<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned
            + Serialize,
        <K as kube::Resource>::DynamicType: Default,
    {
        let name = object.meta().name.clone().unwrap_or_default();
        ensure!(!name.is_empty(), error::MissingNameSnafu { what });
        trace!("Creating {} '{}' in namespace '{}'", what, name, namespace);
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), object)
            .await
            .context(error::KubeApiCallSnafu {
                method: "create",
                what,
                name,
            })
    }
}

#[async_trait::async_trait]
impl NamespaceClient for KubeNamespaceClient {
    async fn create_config_map(
        &self,
        namespace: &str,
        config_map: &ConfigMap,
    ) -> ClientResult<()> {
        self.create(namespace, "config map", config_map).await?;
        Ok(())
    }

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> ClientResult<()> {
        self.create(namespace, "pod", pod).await?;
        Ok(())
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> ClientResult<()> {
        self.create(namespace, "service", service).await?;
        Ok(())
    }

    async fn ensure_persistent_volume_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClientResult<()> {
        match self.create(namespace, "persistent volume claim", claim).await {
            Ok(_) => Ok(()),
            Err(error::ClientError::KubeApiCall {
                source: kube::Error::Api(response),
                ..
            }) if response.code == StatusCode::CONFLICT.as_u16() => {
                debug!(
                    "Persistent volume claim '{}' already exists in namespace '{}'",
                    claim.name_any(),
                    namespace
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
