use crate::{changes::Changes, domain_filter::DomainFilter, endpoint::Endpoint};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Definition of the operations a DNS provider offers to the orchestrator.
/// Both a local implementation and [`crate::PluginProvider`], which forwards
/// every call to a remote process, implement this.
/// Implementations are called from several requests at once.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The domains this provider is responsible for.
    /// Implementations that do not filter return [`DomainFilter::accept_all`].
    fn domain_filter(&self) -> DomainFilter;

    /// All records currently held by the provider.
    async fn records(&self) -> Result<Vec<Endpoint>>;

    /// Apply the change-set computed by the planner.
    async fn apply_changes(&self, changes: Changes) -> Result<()>;

    /// Whether two values of the provider specific property `name` mean the
    /// same thing. Implementations without special knowledge compare the
    /// strings.
    async fn property_values_equal(&self, name: &str, previous: &str, current: &str)
    -> Result<bool>;

    /// Provider specific adjustments of desired records, such as dropping
    /// unsupported properties. Order is kept.
    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>>;
}
