use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::Parser;
use dashmap::DashMap;
use externaldns_plugin::{
    Plugin, Provider,
    changes::Changes,
    config::PluginConfig,
    domain_filter::DomainFilter,
    endpoint::{Endpoint, EndpointKey},
    instrumentation::PrometheusFailures,
};
use logcall::logcall;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    address: String,
    /// Port to listen on
    #[arg(long, default_value_t = 8888)]
    port: u16,
    /// Only handle names under these domains (repeatable)
    #[arg(long)]
    domain: Vec<String>,
}

#[logcall(ok = "debug", err = "error")]
#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let registry = prometheus::Registry::new();
    let failures = Arc::new(PrometheusFailures::server(&registry)?);
    let provider = Arc::new(MemoryDns {
        domain_filter: if args.domain.is_empty() {
            DomainFilter::accept_all()
        } else {
            DomainFilter::Strings {
                include: Some(args.domain),
                exclude: None,
            }
        },
        records: DashMap::new(),
    });
    let config = PluginConfig {
        address: args.address,
        port: args.port,
        ..Default::default()
    };
    Plugin::new(provider, config)
        .with_failures(failures)
        .start()
        .await
}

/// Keeps records in memory, keyed by their identity.
#[derive(Debug)]
struct MemoryDns {
    domain_filter: DomainFilter,
    records: DashMap<EndpointKey, Endpoint>,
}
#[async_trait]
impl Provider for MemoryDns {
    fn domain_filter(&self) -> DomainFilter {
        self.domain_filter.clone()
    }

    #[logcall("debug")]
    async fn records(&self) -> Result<Vec<Endpoint>> {
        Ok(self.records.iter().map(|x| x.value().clone()).collect())
    }

    #[logcall("info")]
    async fn apply_changes(&self, changes: Changes) -> Result<()> {
        if let Some(i) = changes
            .create
            .iter()
            .chain(changes.update_new())
            .find(|x| !self.domain_filter.matches(&x.dns_name))
        {
            return Err(anyhow!("{} is outside of the handled domains", i.dns_name));
        }

        for i in changes.delete {
            self.records.remove(&i.key());
        }
        for i in changes.update {
            // No locking since it is in memory only.
            self.records.remove(&i.from.key());
            self.records.insert(i.to.key(), i.to);
        }
        for i in changes.create {
            self.records.insert(i.key(), i);
        }
        log::info!("{} records held", self.records.len());

        Ok(())
    }

    #[logcall("debug")]
    async fn property_values_equal(&self, _name: &str, previous: &str, current: &str) -> Result<bool> {
        Ok(previous == current)
    }

    #[logcall("debug")]
    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        // Nothing provider specific is kept here.
        Ok(endpoints
            .into_iter()
            .map(|mut x| {
                x.provider_specific.clear();
                x
            })
            .collect())
    }
}
