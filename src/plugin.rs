use crate::{
    changes::Changes,
    config::PluginConfig,
    endpoint::Endpoint,
    error::PluginError,
    instrumentation::{FailureRecorder, NoopFailures, Operation},
    negotiation::negotiate,
    plugin_json::PluginJson,
    property::{PropertyValuesEqualRequest, PropertyValuesEqualResponse},
    provider::Provider,
    routes::Route,
};
use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, ResponseError,
    dev::Server,
    http::StatusCode,
    rt::time::timeout,
    web::{self, Bytes, Data, Payload, ServiceConfig},
};
use logcall::logcall;
use serde::de::DeserializeOwned;
use std::{fmt, future::Future, net::SocketAddr, sync::Arc, time::Duration};

/// Exposes a local [`Provider`] to the orchestrator over HTTP.
///
/// Every route decodes its body, calls the provider and encodes the
/// result. Bodies that are too large, arrive too slowly or do not decode
/// are answered with an empty 400, provider failures with an empty 500; the
/// details only go to the log and the failure counters.
#[derive(Debug, Clone)]
pub struct Plugin {
    provider: Arc<dyn Provider>,
    failures: Arc<dyn FailureRecorder>,
    config: PluginConfig,
}
impl Plugin {
    /// Constructor of `Plugin`.
    #[logcall("debug")]
    pub fn new(provider: Arc<dyn Provider>, config: PluginConfig) -> Plugin {
        Plugin {
            provider,
            failures: Arc::new(NoopFailures),
            config,
        }
    }

    /// Report failed requests to `failures`.
    pub fn with_failures(mut self, failures: Arc<dyn FailureRecorder>) -> Self {
        self.failures = failures;
        self
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Mount the plugin routes, for use with `App::configure`.
    /// Paths that are not routed fall through to the negotiation handler.
    pub fn configure(&self, cfg: &mut ServiceConfig) {
        let state = Data::new(State {
            provider: self.provider.clone(),
            failures: self.failures.clone(),
            payload_limit: self.config.payload_limit,
            read_timeout: self.config.read_timeout,
        });
        cfg.app_data(state)
            .service(web::resource(Route::Negotiate.path()).to(negotiate))
            .service(
                web::resource(Route::Records.path())
                    .route(web::get().to(get_records))
                    .route(web::post().to(post_records))
                    .default_service(web::to(unsupported_method)),
            )
            .service(
                web::resource(Route::PropertyValuesEqual.path())
                    .route(web::post().to(post_property_values_equal))
                    .default_service(web::to(unsupported_method)),
            )
            .service(
                web::resource(Route::AdjustEndpoints.path())
                    .route(web::post().to(post_adjust_endpoints))
                    .default_service(web::to(unsupported_method)),
            )
            .default_service(web::to(negotiate));
    }

    /// Bind the listening socket without serving yet.
    /// The returned addresses are the ones actually bound, which matters
    /// when the configured port is 0.
    pub fn bind(&self) -> std::io::Result<(Vec<SocketAddr>, Server)> {
        let plugin = self.clone();
        let mut server = HttpServer::new(move || {
            let plugin = plugin.clone();
            App::new().configure(move |cfg| plugin.configure(cfg))
        })
        .client_request_timeout(self.config.read_timeout)
        .client_disconnect_timeout(self.config.write_timeout)
        .keep_alive(self.config.keep_alive);
        if let Some(workers) = self.config.workers {
            server = server.workers(workers);
        }
        let server = server.bind((self.config.address.as_str(), self.config.port))?;
        let addrs = server.addrs();
        log::info!("Plugin listening on {addrs:?}");
        Ok((addrs, server.run()))
    }

    /// Serve until the server is stopped.
    #[logcall(ok = "debug", err = "error")]
    pub async fn start(&self) -> anyhow::Result<()> {
        let (_, server) = self.bind()?;
        server.await?;
        Ok(())
    }
}

struct State {
    provider: Arc<dyn Provider>,
    failures: Arc<dyn FailureRecorder>,
    payload_limit: usize,
    read_timeout: Duration,
}
// Handlers are logged with their state; the provider may hold whole zones.
impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("payload_limit", &self.payload_limit)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}
impl State {
    /// Receive the whole body, at most `payload_limit` bytes of it within
    /// `read_timeout`. The head of the request is bounded by the server.
    async fn read(&self, operation: Operation, payload: Payload) -> Result<Bytes, PluginError> {
        let read = payload.to_bytes_limited(self.payload_limit);
        let detail = match timeout(self.read_timeout, read).await {
            Ok(Ok(Ok(body))) => return Ok(body),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(_)) => format!("body exceeds {} bytes", self.payload_limit),
            Err(_) => format!("body not received within {:?}", self.read_timeout),
        };
        log::warn!("{operation}: rejecting request body: {detail}");
        self.failures.record_failure(operation);
        Err(PluginError::UnreadableBody { operation, detail })
    }

    fn decode<T: DeserializeOwned>(
        &self,
        operation: Operation,
        body: &[u8],
    ) -> Result<T, PluginError> {
        serde_json::from_slice(body).map_err(|source| {
            log::warn!("{operation}: rejecting request body: {source}");
            self.failures.record_failure(operation);
            PluginError::MalformedPayload { operation, source }
        })
    }

    async fn local<T>(
        &self,
        operation: Operation,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, PluginError> {
        call.await.map_err(|source| {
            log::error!("{operation}: provider failed: {source:?}");
            self.failures.record_failure(operation);
            PluginError::LocalCapability { operation, source }
        })
    }
}

impl ResponseError for PluginError {
    fn status_code(&self) -> StatusCode {
        match self {
            PluginError::MalformedPayload { .. } | PluginError::UnreadableBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::new(self.status_code())
    }
}

// Get records
#[logcall("debug")]
async fn get_records(state: Data<State>) -> Result<PluginJson<Vec<Endpoint>>, PluginError> {
    let records = state
        .local(Operation::Records, state.provider.records())
        .await?;
    Ok(PluginJson(records))
}

// Apply changes
#[logcall("debug", input = "")]
async fn post_records(state: Data<State>, body: Payload) -> Result<HttpResponse, PluginError> {
    let body = state.read(Operation::ApplyChanges, body).await?;
    let changes: Changes = state.decode(Operation::ApplyChanges, &body)?;
    log::debug!(
        "Applying {} creates, {} updates, {} deletes",
        changes.create.len(),
        changes.update.len(),
        changes.delete.len()
    );
    state
        .local(
            Operation::ApplyChanges,
            state.provider.apply_changes(changes),
        )
        .await?;
    Ok(HttpResponse::Ok().finish())
}

// Provider specific comparison of property values
#[logcall("debug", input = "")]
async fn post_property_values_equal(
    state: Data<State>,
    body: Payload,
) -> Result<PluginJson<PropertyValuesEqualResponse>, PluginError> {
    let body = state.read(Operation::PropertyValuesEqual, body).await?;
    let req: PropertyValuesEqualRequest = state.decode(Operation::PropertyValuesEqual, &body)?;
    let equals = state
        .local(
            Operation::PropertyValuesEqual,
            state
                .provider
                .property_values_equal(&req.name, &req.previous, &req.current),
        )
        .await?;
    Ok(PluginJson(PropertyValuesEqualResponse { equals }))
}

// Provider specific adjustments of records
#[logcall("debug", input = "")]
async fn post_adjust_endpoints(
    state: Data<State>,
    body: Payload,
) -> Result<PluginJson<Vec<Endpoint>>, PluginError> {
    let body = state.read(Operation::AdjustEndpoints, body).await?;
    let endpoints: Vec<Endpoint> = state.decode(Operation::AdjustEndpoints, &body)?;
    let endpoints = state
        .local(
            Operation::AdjustEndpoints,
            state.provider.adjust_endpoints(endpoints),
        )
        .await?;
    Ok(PluginJson(endpoints))
}

async fn unsupported_method(req: HttpRequest) -> HttpResponse {
    log::error!("Unsupported method {} on {}", req.method(), req.path());
    HttpResponse::BadRequest().finish()
}
