use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::time::Duration;

/// Setup of the adapter's HTTP server.
/// The defaults are the values ExternalDNS expects from a plugin.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    pub address: String,
    pub port: u16,
    /// Upper bound for a client to deliver its request head.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub read_timeout: Duration,
    /// Upper bound for a client to take the response and go away.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub write_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub keep_alive: Duration,
    /// Largest accepted request body, in bytes.
    pub payload_limit: usize,
    /// Worker threads, `None` for one per core.
    pub workers: Option<usize>,
}
impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            address: "127.0.0.1".to_string(),
            port: 8888,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(5),
            payload_limit: 4 * 1024 * 1024,
            workers: None,
        }
    }
}

/// How strictly the proxy checks the protocol version at construction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NegotiationMode {
    /// A failed or mismatching handshake fails construction.
    #[default]
    Strict,
    /// The handshake is done but a mismatch is only logged.
    Advisory,
    /// No handshake.
    Skip,
}

/// Setup of [`crate::PluginProvider`].
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Deadline of a whole request, `None` for no deadline.
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub timeout: Option<Duration>,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    pub negotiation: NegotiationMode,
}
impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(5),
            negotiation: NegotiationMode::default(),
        }
    }
}
