//! Failure counters.
//!
//! Recorders are handed in at construction instead of living in a process
//! wide registry, so each proxy or adapter can report to wherever its owner
//! wants, and tests can observe them in isolation.

use metrics::{Counter, Key, Label, Level, Metadata, Unit};
use prometheus::{IntCounterVec, Opts, Registry};
use std::fmt::{Debug, Display};

/// The operations that travel over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Records,
    ApplyChanges,
    PropertyValuesEqual,
    AdjustEndpoints,
}
impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Records,
        Operation::ApplyChanges,
        Operation::PropertyValuesEqual,
        Operation::AdjustEndpoints,
    ];

    /// Value of the `operation` label.
    pub const fn label(self) -> &'static str {
        match self {
            Operation::Records => "records",
            Operation::ApplyChanges => "apply_changes",
            Operation::PropertyValuesEqual => "property_values_equal",
            Operation::AdjustEndpoints => "adjust_endpoints",
        }
    }

    const fn index(self) -> usize {
        match self {
            Operation::Records => 0,
            Operation::ApplyChanges => 1,
            Operation::PropertyValuesEqual => 2,
            Operation::AdjustEndpoints => 3,
        }
    }
}
impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink for failure events.
/// Called once per failed call, including the ones that were answered with
/// a local default and never reached the caller as an error.
pub trait FailureRecorder: Send + Sync + Debug {
    fn record_failure(&self, operation: Operation);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFailures;
impl FailureRecorder for NoopFailures {
    fn record_failure(&self, _operation: Operation) {}
}

pub const CLIENT_FAILURES: &str = "externaldns_plugin_client_failures_total";
pub const SERVER_FAILURES: &str = "externaldns_plugin_server_failures_total";

/// Counters kept in a caller supplied Prometheus registry, labelled by
/// operation.
#[derive(Debug, Clone)]
pub struct PrometheusFailures {
    counter: IntCounterVec,
}
impl PrometheusFailures {
    /// Failures seen by [`crate::PluginProvider`].
    pub fn client(registry: &Registry) -> prometheus::Result<Self> {
        Self::register(
            registry,
            CLIENT_FAILURES,
            "Failed calls to a remote DNS provider, including those answered with a local default.",
        )
    }

    /// Failures seen by [`crate::Plugin`].
    pub fn server(registry: &Registry) -> prometheus::Result<Self> {
        Self::register(
            registry,
            SERVER_FAILURES,
            "Requests the plugin adapter could not serve.",
        )
    }

    fn register(registry: &Registry, name: &str, help: &str) -> prometheus::Result<Self> {
        let counter = IntCounterVec::new(Opts::new(name, help), &["operation"])?;
        registry.register(Box::new(counter.clone()))?;
        // All series exist from the start, at zero.
        for op in Operation::ALL {
            counter.with_label_values(&[op.label()]);
        }
        Ok(Self { counter })
    }

    /// Current count for `operation`.
    pub fn get(&self, operation: Operation) -> u64 {
        self.counter.with_label_values(&[operation.label()]).get()
    }
}
impl FailureRecorder for PrometheusFailures {
    fn record_failure(&self, operation: Operation) {
        self.counter.with_label_values(&[operation.label()]).inc();
    }
}

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Counters obtained from a caller supplied `metrics` recorder.
#[derive(Clone)]
pub struct MetricsFailures {
    name: &'static str,
    counters: [Counter; 4],
}
impl MetricsFailures {
    pub fn new<R>(recorder: &R, name: &'static str) -> Self
    where
        R: metrics::Recorder + ?Sized,
    {
        recorder.describe_counter(
            name.into(),
            Some(Unit::Count),
            "Failed plugin calls by operation.".into(),
        );
        let counters = Operation::ALL.map(|op| {
            let key = Key::from_parts(name, vec![Label::new("operation", op.label())]);
            recorder.register_counter(&key, &METADATA)
        });
        Self { name, counters }
    }
}
impl Debug for MetricsFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsFailures")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
impl FailureRecorder for MetricsFailures {
    fn record_failure(&self, operation: Operation) {
        self.counters[operation.index()].increment(1);
    }
}
