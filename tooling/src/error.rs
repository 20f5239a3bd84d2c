use crate::clients::ClientError;
use snafu::Snafu;
use std::time::Duration;

/// The `Result` type returned by the tooling provisioning functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The public error type of the tooling provisioning crate.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

/// The broad category of an [`Error`]. Callers use it to tell a misconfigured workspace apart from
/// a failing cluster and from a bug in the caller.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The workspace or its plugins are misconfigured. Retrying will not help.
    Configuration,
    /// The cluster, a limit value or a collaborator failed.
    Infrastructure,
    /// The broker did not report in time. This is an infrastructure failure that callers may
    /// want to report on its own, see [`ErrorKind::is_infrastructure`].
    Timeout,
    /// A caller used an API out of order. This is a bug in the caller.
    ProtocolViolation,
}

impl ErrorKind {
    /// True for failures of the cluster or its collaborators, broker timeouts included.
    pub fn is_infrastructure(self) -> bool {
        matches!(self, ErrorKind::Infrastructure | ErrorKind::Timeout)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display(
        "Artifacts broker can only be applied to a workspace with one pod, {} has {} pods",
        what,
        count
    ))]
    ArtifactsBrokerPods { what: String, count: usize },

    #[snafu(display(
        "The plugin broker for workspace '{}' failed: {}",
        workspace_id,
        message
    ))]
    BrokerFailed {
        workspace_id: String,
        message: String,
    },

    #[snafu(display(
        "Plugins installation process timed out after {} minutes for workspace '{}'",
        minutes,
        workspace_id
    ))]
    BrokerTimeout { workspace_id: String, minutes: u64 },

    #[snafu(display("Unable to {} for workspace '{}': {}", operation, workspace_id, source))]
    Client {
        operation: String,
        workspace_id: String,
        source: ClientError,
    },

    #[snafu(display("Unable to parse tooling configuration: {}", source))]
    ConfigParse { source: serde_yaml::Error },

    #[snafu(display("Invalid tooling configuration value '{}' for '{}': {}", value, field, source))]
    ConfigValue {
        field: String,
        value: String,
        source: tooling_model::Error,
    },

    #[snafu(display("Plugin '{}' is specified more than once", id))]
    DuplicatePlugin { id: String },

    #[snafu(display(
        "Applying of component '{}' failed. Machine '{}' already contains server with name '{}'",
        component,
        machine,
        name
    ))]
    EndpointCollision {
        component: String,
        machine: String,
        name: String,
    },

    #[snafu(display(
        "Sidecar {} field contains illegal value '{}' in container '{}': {}",
        field,
        value,
        container,
        source
    ))]
    IllegalResourceValue {
        field: String,
        value: String,
        container: String,
        source: tooling_model::Error,
    },

    #[snafu(display(
        "Plugin '{}' contains container with invalid name '{}'",
        plugin_id,
        name
    ))]
    InvalidContainerName { plugin_id: String, name: String },

    #[snafu(display("Invalid plugin reference '{}': {}", reference, reason))]
    InvalidPluginReference { reference: String, reason: String },

    #[snafu(display(
        "Invalid devfile component '{}' override '{}' value '{}': {}",
        component,
        field,
        value,
        source
    ))]
    InvalidComponentOverride {
        component: String,
        field: String,
        value: String,
        source: tooling_model::Error,
    },

    #[snafu(display(
        "The plugin broker for workspace '{}' reported success but the plugins list is missing",
        workspace_id
    ))]
    MissingTooling { workspace_id: String },

    #[snafu(display(
        "Plugin '{}' is not declared by any editor or plugin component, available components: [{}]",
        plugin_id,
        available
    ))]
    MissingDevfileComponent { plugin_id: String, available: String },

    #[snafu(display(
        "Che plugins tooling configuration can be applied to a workspace with one pod only"
    ))]
    MultiplePods { count: usize },

    #[snafu(display("Pod '{}' is missing from the workspace environment", pod_name))]
    PodMissing { pod_name: String },

    #[snafu(display(
        "Sidecar '{}' of plugin '{}' mounts the reserved volume '{}' at '{}' instead of '{}'. \
        Use the mountSources flag of the container instead of declaring this volume",
        container,
        plugin_id,
        volume,
        path,
        expected
    ))]
    ReservedVolume {
        plugin_id: String,
        container: String,
        volume: String,
        path: String,
        expected: String,
    },

    #[snafu(display("BrokersResult was already completed"))]
    ResultAlreadyCompleted,

    #[snafu(display("The result of the plugin broker was dropped before it was delivered"))]
    ResultDropped,

    #[snafu(display("BrokersResult get may be called only once"))]
    ResultGetCalledTwice,

    #[snafu(display("BrokersResult {} called before get", operation))]
    ResultNotAwaiting { operation: String },

    #[snafu(display("No result was submitted within {:?}", timeout))]
    ResultTimeout { timeout: Duration },

    #[snafu(display("Unable to serialize {}: {}", what, source))]
    Serialization {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display(
        "Applying of sidecar tooling failed. Kubernetes service with name '{}' already exists in \
        the workspace environment.",
        name
    ))]
    ServiceExists { name: String },

    #[snafu(display(
        "No tooling applier is registered for environment type '{}'",
        environment_type
    ))]
    UnsupportedEnvironment { environment_type: String },
}

impl InnerError {
    fn kind(&self) -> ErrorKind {
        match self {
            InnerError::ConfigParse { .. }
            | InnerError::ConfigValue { .. }
            | InnerError::DuplicatePlugin { .. }
            | InnerError::EndpointCollision { .. }
            | InnerError::InvalidComponentOverride { .. }
            | InnerError::InvalidContainerName { .. }
            | InnerError::InvalidPluginReference { .. }
            | InnerError::MissingDevfileComponent { .. }
            | InnerError::MultiplePods { .. }
            | InnerError::ReservedVolume { .. }
            | InnerError::UnsupportedEnvironment { .. } => ErrorKind::Configuration,
            InnerError::ArtifactsBrokerPods { .. }
            | InnerError::BrokerFailed { .. }
            | InnerError::Client { .. }
            | InnerError::IllegalResourceValue { .. }
            | InnerError::MissingTooling { .. }
            | InnerError::PodMissing { .. }
            | InnerError::Serialization { .. }
            | InnerError::ServiceExists { .. } => ErrorKind::Infrastructure,
            InnerError::BrokerTimeout { .. } | InnerError::ResultTimeout { .. } => {
                ErrorKind::Timeout
            }
            InnerError::ResultAlreadyCompleted
            | InnerError::ResultDropped
            | InnerError::ResultGetCalledTwice
            | InnerError::ResultNotAwaiting { .. } => ErrorKind::ProtocolViolation,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn service_collision_message() {
        let error: Error = ServiceExistsSnafu { name: "debug" }.build().into();
        assert_eq!(error.kind(), ErrorKind::Infrastructure);
        assert_eq!(
            error.to_string(),
            "Applying of sidecar tooling failed. Kubernetes service with name 'debug' already \
            exists in the workspace environment."
        );
    }

    #[test]
    fn timeout_names_workspace() {
        let error: Error = BrokerTimeoutSnafu {
            workspace_id: "workspace1",
            minutes: 3u64,
        }
        .build()
        .into();
        assert_eq!(error.kind(), ErrorKind::Timeout);
        assert!(error.kind().is_infrastructure());
        assert!(error.to_string().contains("workspace1"));
    }

    #[test]
    fn only_cluster_failures_are_infrastructure() {
        assert!(ErrorKind::Infrastructure.is_infrastructure());
        assert!(ErrorKind::Timeout.is_infrastructure());
        assert!(!ErrorKind::Configuration.is_infrastructure());
        assert!(!ErrorKind::ProtocolViolation.is_infrastructure());
    }
}
