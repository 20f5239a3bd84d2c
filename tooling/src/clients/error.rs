use snafu::Snafu;

/// The result type returned by [`NamespaceClient`] and [`WorkspaceVolumesStrategy`]
/// implementations.
///
/// [`NamespaceClient`]: crate::clients::NamespaceClient
/// [`WorkspaceVolumesStrategy`]: crate::clients::WorkspaceVolumesStrategy
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// The error type returned by [`NamespaceClient`] and [`WorkspaceVolumesStrategy`]
/// implementations.
///
/// [`NamespaceClient`]: crate::clients::NamespaceClient
/// [`WorkspaceVolumesStrategy`]: crate::clients::WorkspaceVolumesStrategy
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    /// The Kubernetes client could not be created.
    #[snafu(display("Error initializing the Kubernetes client: {}", source))]
    Initialization { source: kube::Error },

    /// A call to the Kubernetes API failed.
    #[snafu(display("Unable to {} {} '{}': {}", method, what, name, source))]
    KubeApiCall {
        method: String,
        what: String,
        name: String,
        source: kube::Error,
    },

    /// An object could not be submitted because it has no name.
    #[snafu(display("Unable to create {} without a name", what))]
    MissingName { what: String },

    /// Any other failure, typically from custom (i.e. mock) implementations.
    #[snafu(display("{}", message))]
    Message { message: String },
}

impl From<&str> for ClientError {
    fn from(message: &str) -> Self {
        ClientError::Message {
            message: message.to_string(),
        }
    }
}
