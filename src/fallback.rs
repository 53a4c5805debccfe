use crate::{endpoint::Endpoint, error::PluginError};
use anyhow::Result;
use std::fmt::Debug;

/// What [`crate::PluginProvider`] answers when a property comparison or an
/// endpoint adjustment could not be done remotely.
///
/// Both operations only decide whether a change is a no-op, so by default
/// the sync loop is kept alive with something computable locally
/// ([`LocalDefault`]). The answer may be wrong, which is why every call that
/// lands here is logged and counted. Use [`HardFail`] to surface the error
/// instead.
pub trait FallbackPolicy: Send + Sync + Debug {
    fn property_values_equal(
        &self,
        name: &str,
        previous: &str,
        current: &str,
        error: PluginError,
    ) -> Result<bool>;

    fn adjust_endpoints(&self, endpoints: Vec<Endpoint>, error: PluginError)
    -> Result<Vec<Endpoint>>;
}

/// Literal string comparison, and endpoints handed back untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDefault;
impl FallbackPolicy for LocalDefault {
    fn property_values_equal(
        &self,
        _name: &str,
        previous: &str,
        current: &str,
        _error: PluginError,
    ) -> Result<bool> {
        Ok(previous == current)
    }

    fn adjust_endpoints(
        &self,
        endpoints: Vec<Endpoint>,
        _error: PluginError,
    ) -> Result<Vec<Endpoint>> {
        Ok(endpoints)
    }
}

/// Treat the soft operations like the others and return the error.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardFail;
impl FallbackPolicy for HardFail {
    fn property_values_equal(
        &self,
        _name: &str,
        _previous: &str,
        _current: &str,
        error: PluginError,
    ) -> Result<bool> {
        Err(error.into())
    }

    fn adjust_endpoints(
        &self,
        _endpoints: Vec<Endpoint>,
        error: PluginError,
    ) -> Result<Vec<Endpoint>> {
        Err(error.into())
    }
}
