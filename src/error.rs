use crate::instrumentation::Operation;
use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between the orchestrator and a remote
/// provider.
///
/// [`crate::PluginProvider`] returns these wrapped in [`anyhow::Error`];
/// use `downcast_ref::<PluginError>()` to tell them apart.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The base URL given at construction is not usable.
    #[error("invalid plugin URL {url}: {detail}")]
    InvalidUrl { url: String, detail: String },

    /// The HTTP client could not be set up.
    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// No HTTP response was obtained: connection, DNS or timeout trouble.
    #[error("{operation}: transport failure: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    /// The negotiation request did not get a response.
    #[error("negotiation with {url} failed: {source}")]
    Handshake {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote side does not speak this protocol version.
    /// `subject` is the response header that did not match, or `status`.
    #[error("negotiation failed: {subject} is {actual:?}, expected {expected:?}")]
    Protocol {
        subject: &'static str,
        expected: String,
        actual: Option<String>,
    },

    /// The adapter answered with something other than 200.
    #[error("{operation}: remote server answered {status}")]
    RemoteServer {
        operation: Operation,
        status: StatusCode,
    },

    /// JSON that could not be decoded, on either side.
    #[error("{operation}: malformed payload: {source}")]
    MalformedPayload {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    /// A request body that was too large or not received in time.
    #[error("{operation}: unreadable request body: {detail}")]
    UnreadableBody { operation: Operation, detail: String },

    /// The wrapped local provider itself failed.
    #[error("{operation}: provider failed: {source:#}")]
    LocalCapability {
        operation: Operation,
        source: anyhow::Error,
    },
}
impl PluginError {
    /// The operation the failure belongs to, if it belongs to one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            PluginError::InvalidUrl { .. }
            | PluginError::HttpClient(_)
            | PluginError::Handshake { .. }
            | PluginError::Protocol { .. } => None,
            PluginError::Transport { operation, .. }
            | PluginError::RemoteServer { operation, .. }
            | PluginError::MalformedPayload { operation, .. }
            | PluginError::UnreadableBody { operation, .. }
            | PluginError::LocalCapability { operation, .. } => Some(*operation),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PluginError::Transport { .. } | PluginError::Handshake { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            PluginError::Transport { source, .. } | PluginError::Handshake { source, .. } => {
                source.is_timeout()
            }
            _ => false,
        }
    }
}
