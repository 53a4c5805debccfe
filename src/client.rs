use crate::{
    MEDIATYPE,
    changes::Changes,
    config::{ClientConfig, NegotiationMode},
    domain_filter::DomainFilter,
    endpoint::Endpoint,
    error::PluginError,
    fallback::{FallbackPolicy, LocalDefault},
    instrumentation::{FailureRecorder, NoopFailures, Operation},
    negotiation::handshake,
    property::{PropertyValuesEqualRequest, PropertyValuesEqualResponse},
    provider::Provider,
    routes::Route,
};
use anyhow::Result;
use async_trait::async_trait;
use logcall::logcall;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode, Url,
    header::ACCEPT,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A [`Provider`] living in another process, reached over HTTP.
///
/// Every call is exactly one request, never retried. Listing and applying
/// records fail loudly. Comparing property values and adjusting endpoints
/// never fail: when the remote side cannot answer, the [`FallbackPolicy`]
/// answers instead, and the failure is only visible in the log and the
/// failure counters.
///
/// Dropping a pending call aborts its request. A request running past
/// [`ClientConfig::timeout`] is aborted and handled as a transport failure,
/// under the same policy as any other failure of that operation.
#[derive(Debug, Clone)]
pub struct PluginProvider {
    client: Client,
    urls: RouteUrls,
    failures: Arc<dyn FailureRecorder>,
    fallback: Arc<dyn FallbackPolicy>,
}

#[derive(Debug, Clone)]
struct RouteUrls {
    base: Url,
    records: Url,
    property_values_equal: Url,
    adjust_endpoints: Url,
}
impl RouteUrls {
    fn parse(url: &str) -> Result<Self, PluginError> {
        let invalid = |detail: String| PluginError::InvalidUrl {
            url: url.to_string(),
            detail,
        };
        let mut base = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(invalid("not an http(s) URL".to_string()));
        }
        // Routes are joined relative to the base, keeping any path prefix.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |route: Route| base.join(route.relative()).map_err(|e| invalid(e.to_string()));
        Ok(RouteUrls {
            records: join(Route::Records)?,
            property_values_equal: join(Route::PropertyValuesEqual)?,
            adjust_endpoints: join(Route::AdjustEndpoints)?,
            base,
        })
    }
}

impl PluginProvider {
    /// Connect to the plugin at `url` with the default [`ClientConfig`].
    pub async fn new(url: &str) -> Result<Self, PluginError> {
        Self::with_config(url, ClientConfig::default()).await
    }

    #[logcall(ok = "debug", err = "error")]
    pub async fn with_config(url: &str, config: ClientConfig) -> Result<Self, PluginError> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(PluginError::HttpClient)?;
        Self::with_client(url, client, config.negotiation).await
    }

    /// Use an existing HTTP client, so several proxies can share its pool.
    pub async fn with_client(
        url: &str,
        client: Client,
        negotiation: NegotiationMode,
    ) -> Result<Self, PluginError> {
        let urls = RouteUrls::parse(url)?;
        match negotiation {
            NegotiationMode::Strict => handshake(&client, &urls.base).await?,
            NegotiationMode::Advisory => {
                if let Err(e) = handshake(&client, &urls.base).await {
                    log::warn!("Ignoring failed negotiation with {}: {e}", urls.base);
                }
            }
            NegotiationMode::Skip => {}
        }
        Ok(PluginProvider {
            client,
            urls,
            failures: Arc::new(NoopFailures),
            fallback: Arc::new(LocalDefault),
        })
    }

    /// Report failed calls to `failures`.
    pub fn with_failures(mut self, failures: Arc<dyn FailureRecorder>) -> Self {
        self.failures = failures;
        self
    }

    /// Replace the answers given when a soft operation fails.
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackPolicy>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.urls.base
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response, PluginError> {
        let res = request
            .header(ACCEPT, MEDIATYPE)
            .send()
            .await
            .map_err(|source| PluginError::Transport { operation, source })?;
        let status = res.status();
        log::debug!("{operation}: remote answered {status}");
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(PluginError::RemoteServer { operation, status })
        }
    }

    async fn receive<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, PluginError> {
        let res = self.send(operation, request).await?;
        let body = res
            .bytes()
            .await
            .map_err(|source| PluginError::Transport { operation, source })?;
        serde_json::from_slice(&body)
            .map_err(|source| PluginError::MalformedPayload { operation, source })
    }

    fn hard_failure(&self, operation: Operation, error: PluginError) -> anyhow::Error {
        log::error!("{error}");
        self.failures.record_failure(operation);
        error.into()
    }

    fn soft_failure(&self, operation: Operation, error: &PluginError) {
        log::warn!("{error}; answering with the local fallback");
        self.failures.record_failure(operation);
    }
}

#[async_trait]
impl Provider for PluginProvider {
    /// Filtering happens in the remote process, which is not observable from
    /// here, so everything is let through.
    fn domain_filter(&self) -> DomainFilter {
        DomainFilter::accept_all()
    }

    #[logcall("debug")]
    async fn records(&self) -> Result<Vec<Endpoint>> {
        let op = Operation::Records;
        self.receive(op, self.client.get(self.urls.records.clone()))
            .await
            .map_err(|e| self.hard_failure(op, e))
    }

    #[logcall("debug")]
    async fn apply_changes(&self, changes: Changes) -> Result<()> {
        let op = Operation::ApplyChanges;
        let request = self.client.post(self.urls.records.clone()).json(&changes);
        self.send(op, request)
            .await
            .map(|_| ())
            .map_err(|e| self.hard_failure(op, e))
    }

    #[logcall("debug")]
    async fn property_values_equal(&self, name: &str, previous: &str, current: &str) -> Result<bool> {
        let op = Operation::PropertyValuesEqual;
        let request = self
            .client
            .post(self.urls.property_values_equal.clone())
            .json(&PropertyValuesEqualRequest {
                name: name.to_string(),
                previous: previous.to_string(),
                current: current.to_string(),
            });
        match self.receive::<PropertyValuesEqualResponse>(op, request).await {
            Ok(res) => Ok(res.equals),
            Err(e) => {
                self.soft_failure(op, &e);
                self.fallback.property_values_equal(name, previous, current, e)
            }
        }
    }

    #[logcall("debug")]
    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        let op = Operation::AdjustEndpoints;
        let request = self
            .client
            .post(self.urls.adjust_endpoints.clone())
            .json(&endpoints);
        match self.receive(op, request).await {
            Ok(adjusted) => Ok(adjusted),
            Err(e) => {
                self.soft_failure(op, &e);
                self.fallback.adjust_endpoints(endpoints, e)
            }
        }
    }
}
