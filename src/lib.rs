pub mod changes;
mod client;
pub mod config;
pub mod domain_filter;
pub mod endpoint;
mod error;
pub mod fallback;
pub mod instrumentation;
mod negotiation;
mod plugin;
mod plugin_json;
pub mod property;
mod provider;
pub mod routes;

/// Media type both sides announce during negotiation.
pub const MEDIATYPE: &str = "application/external.dns.plugin+json;version=1";

pub use client::PluginProvider;
pub use error::PluginError;
pub use negotiation::NegotiationDescriptor;
pub use plugin::Plugin;
pub use plugin_json::PluginJson;
pub use provider::Provider;
