mod common;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use common::init_log;
use externaldns_plugin::{
    Plugin, PluginError, PluginProvider, Provider,
    changes::{Changes, FromTo},
    config::PluginConfig,
    domain_filter::DomainFilter,
    endpoint::{Endpoint, ProviderSpecificProperty, RecordType},
    instrumentation::{Operation, PrometheusFailures},
};
use std::{
    collections::HashMap,
    io::{Read, Write},
    net::TcpStream,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Holds records in a list and fails on demand.
#[derive(Debug, Default)]
struct ListDns {
    records: Mutex<Vec<Endpoint>>,
    broken: bool,
}
impl ListDns {
    fn check(&self) -> Result<()> {
        if self.broken {
            Err(anyhow!("backend is down"))
        } else {
            Ok(())
        }
    }
}
#[async_trait]
impl Provider for ListDns {
    fn domain_filter(&self) -> DomainFilter {
        DomainFilter::Strings {
            include: Some(vec!["example.org".to_string()]),
            exclude: None,
        }
    }

    async fn records(&self) -> Result<Vec<Endpoint>> {
        self.check()?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn apply_changes(&self, changes: Changes) -> Result<()> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        for d in changes.delete.iter().chain(changes.update_old()) {
            records.retain(|r| r.key() != d.key());
        }
        records.extend(changes.update.into_iter().map(|ft| ft.to));
        records.extend(changes.create);
        Ok(())
    }

    async fn property_values_equal(&self, _name: &str, previous: &str, current: &str) -> Result<bool> {
        self.check()?;
        Ok(previous.eq_ignore_ascii_case(current))
    }

    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        self.check()?;
        Ok(endpoints
            .into_iter()
            .map(|mut e| {
                e.record_ttl.get_or_insert(300);
                e
            })
            .collect())
    }
}

async fn start(provider: Arc<ListDns>) -> (String, Arc<PrometheusFailures>) {
    start_with(provider, PluginConfig::default()).await
}

async fn start_with(
    provider: Arc<ListDns>,
    config: PluginConfig,
) -> (String, Arc<PrometheusFailures>) {
    let registry = prometheus::Registry::new();
    let failures = Arc::new(PrometheusFailures::server(&registry).unwrap());
    let plugin = Plugin::new(
        provider,
        PluginConfig {
            port: 0,
            workers: Some(1),
            ..config
        },
    )
    .with_failures(failures.clone());
    let (addrs, server) = plugin.bind().unwrap();
    actix_web::rt::spawn(server);
    (format!("http://{}", addrs[0]), failures)
}

fn record(name: &str, target: &str) -> Endpoint {
    Endpoint {
        dns_name: name.to_string(),
        targets: vec![target.to_string()],
        record_type: Some(RecordType::A),
        set_identifier: String::new(),
        record_ttl: None,
        labels: HashMap::from([("owner".to_string(), "default".to_string())]),
        provider_specific: vec![ProviderSpecificProperty {
            name: "alias".to_string(),
            value: "false".to_string(),
        }],
    }
}

#[actix_web::test]
async fn proxy_and_plugin_agree() {
    init_log();
    let (url, server_failures) = start(Arc::new(ListDns::default())).await;
    let registry = prometheus::Registry::new();
    let client_failures = Arc::new(PrometheusFailures::client(&registry).unwrap());
    let provider = PluginProvider::new(&url)
        .await
        .unwrap()
        .with_failures(client_failures.clone());

    assert!(provider.records().await.unwrap().is_empty());

    let a = record("a.example.org", "10.0.0.1");
    let b = record("b.example.org", "10.0.0.2");
    provider
        .apply_changes(Changes {
            create: vec![a.clone(), b.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(provider.records().await.unwrap(), vec![a.clone(), b.clone()]);

    let b2 = record("b.example.org", "10.0.0.3");
    provider
        .apply_changes(Changes {
            update: vec![FromTo {
                from: b.clone(),
                to: b2.clone(),
            }],
            delete: vec![a.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(provider.records().await.unwrap(), vec![b2.clone()]);

    assert!(provider.property_values_equal("alias", "TRUE", "true").await.unwrap());

    let adjusted = provider.adjust_endpoints(vec![a.clone(), b2.clone()]).await.unwrap();
    assert_eq!(adjusted.len(), 2);
    assert!(adjusted.iter().all(|e| e.record_ttl == Some(300)));
    assert_eq!(adjusted[0].dns_name, "a.example.org");
    assert_eq!(adjusted[1].provider_specific, b2.provider_specific);

    // The remote filter is not visible through the proxy.
    assert!(provider.domain_filter().is_accept_all());

    for op in Operation::ALL {
        assert_eq!(client_failures.get(op), 0, "{op}");
        assert_eq!(server_failures.get(op), 0, "{op}");
    }
}

#[actix_web::test]
async fn broken_provider_behind_the_plugin() {
    init_log();
    let (url, server_failures) = start(Arc::new(ListDns {
        broken: true,
        ..Default::default()
    }))
    .await;
    let registry = prometheus::Registry::new();
    let client_failures = Arc::new(PrometheusFailures::client(&registry).unwrap());
    let provider = PluginProvider::new(&url)
        .await
        .unwrap()
        .with_failures(client_failures.clone());

    let err = provider.records().await.unwrap_err();
    let err = err.downcast_ref::<PluginError>().unwrap();
    assert!(matches!(err, PluginError::RemoteServer { status, .. } if status.as_u16() == 500));
    // No detail of the backend crosses the wire.
    assert!(!err.to_string().contains("backend is down"));

    assert!(provider.apply_changes(Changes::default()).await.is_err());
    assert!(provider.property_values_equal("ttl", "60", "60").await.unwrap());
    assert!(!provider.property_values_equal("ttl", "60", "61").await.unwrap());
    let input = vec![record("a.example.org", "10.0.0.1")];
    assert_eq!(provider.adjust_endpoints(input.clone()).await.unwrap(), input);

    assert_eq!(client_failures.get(Operation::Records), 1);
    assert_eq!(client_failures.get(Operation::ApplyChanges), 1);
    assert_eq!(client_failures.get(Operation::PropertyValuesEqual), 2);
    assert_eq!(client_failures.get(Operation::AdjustEndpoints), 1);
    assert_eq!(server_failures.get(Operation::PropertyValuesEqual), 2);
}

#[actix_web::test]
async fn slow_bodies_are_cut_off() {
    init_log();
    let provider = Arc::new(ListDns::default());
    let (url, failures) = start_with(
        provider.clone(),
        PluginConfig {
            read_timeout: Duration::from_millis(300),
            ..Default::default()
        },
    )
    .await;
    let addr = url.trim_start_matches("http://").to_string();

    // The head arrives at once, the body never completes.
    let head = actix_web::rt::task::spawn_blocking(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
            .write_all(
                b"POST /records HTTP/1.1\r\nHost: localhost\r\n\
                  Content-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"Create\":",
            )
            .unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 512];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&head).into_owned()
    })
    .await
    .unwrap();

    assert!(head.starts_with("HTTP/1.1 400"), "{head}");
    assert_eq!(failures.get(Operation::ApplyChanges), 1);
    assert!(provider.records.lock().unwrap().is_empty());
}
