//! Shared helpers for the HTTP tests.

#![allow(dead_code)]

use actix_web::{App, HttpServer, dev::ServerHandle, web::ServiceConfig};
use externaldns_plugin::{
    PluginProvider,
    config::{ClientConfig, NegotiationMode},
    instrumentation::PrometheusFailures,
};
use std::{net::TcpListener, sync::Arc};

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serve whatever `configure` mounts on a free local port.
pub async fn serve<F>(configure: F) -> (String, ServerHandle)
where
    F: Fn(&mut ServiceConfig) + Send + Clone + 'static,
{
    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind test server");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{addr}"), handle)
}

/// A URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind a free port");
    let addr = listener.local_addr().expect("free port address");
    drop(listener);
    format!("http://{addr}")
}

/// A proxy that does not negotiate, with its own failure counters.
pub async fn proxy(url: &str) -> (PluginProvider, Arc<PrometheusFailures>) {
    proxy_with(
        url,
        ClientConfig {
            negotiation: NegotiationMode::Skip,
            ..Default::default()
        },
    )
    .await
}

pub async fn proxy_with(
    url: &str,
    config: ClientConfig,
) -> (PluginProvider, Arc<PrometheusFailures>) {
    let failures = Arc::new(
        PrometheusFailures::client(&prometheus::Registry::new()).expect("register counters"),
    );
    let provider = PluginProvider::with_config(url, config)
        .await
        .expect("construct proxy")
        .with_failures(failures.clone());
    (provider, failures)
}
