//! Failover client facade
//!
//! [`FailoverClient`] is the public entry point: it owns the endpoint
//! rotation and retry loop, and exposes typed store operations on top.
//! [`SharedFailoverClient`] wraps one behind a mutex for use from several
//! threads.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use super::command::{Command, CommandOutput};
use super::events::{FailoverEvents, TracingEvents};
use super::registry::EndpointRegistry;
use super::retry::Orchestrator;
use super::selector::ConnectionSelector;
use crate::client::{ConnectionFactory, Connector, SetOptions, StoreCommands, StoreValue};
use crate::config::{Endpoint, FailoverConfig};
use crate::utils::{Result, StoreError};

/// Store client that fails over between Active-Active endpoints
///
/// Every operation runs under the retry policy from the configuration.
/// Operations are not deduplicated: a write that reached a server before
/// its reply was lost may be applied again on retry.
pub struct FailoverClient<F: Connector = ConnectionFactory> {
    orchestrator: Orchestrator<F>,
}

impl FailoverClient<ConnectionFactory> {
    /// Client over TCP/TLS connections, logging through `tracing`
    pub fn new(config: FailoverConfig) -> Result<Self> {
        let connector = ConnectionFactory::from_config(&config);
        Self::with_connector(config, connector, Arc::new(TracingEvents))
    }
}

impl<F: Connector> FailoverClient<F> {
    /// Client with a custom connector and event sink
    pub fn with_connector(
        config: FailoverConfig,
        connector: F,
        events: Arc<dyn FailoverEvents>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = EndpointRegistry::new(config.endpoints, config.shuffle_endpoints)?;
        let selector = ConnectionSelector::new(registry, connector, events);
        Ok(Self {
            orchestrator: Orchestrator::new(selector, config.retry),
        })
    }

    /// Run an arbitrary operation against the active connection with retries
    pub fn execute<T, Op>(&mut self, operation: Op) -> Result<T>
    where
        Op: FnMut(&mut F::Connection) -> std::result::Result<T, StoreError>,
    {
        self.orchestrator.execute(operation)
    }

    /// Run a [`Command`] with retries
    pub fn run(&mut self, command: &Command) -> Result<CommandOutput> {
        self.execute(|conn| command.apply(conn))
    }

    pub fn ping(&mut self) -> Result<bool> {
        self.execute(|conn| conn.ping())
    }

    pub fn get(&mut self, key: &str) -> Result<Option<StoreValue>> {
        self.execute(|conn| conn.get(key))
    }

    /// SET with optional expiry and NX; false when NX prevented the write
    pub fn set(&mut self, key: &str, value: impl AsRef<[u8]>, options: SetOptions) -> Result<bool> {
        let value = value.as_ref();
        self.execute(|conn| conn.set(key, value, &options))
    }

    pub fn incr(&mut self, key: &str) -> Result<i64> {
        self.execute(|conn| conn.incr(key))
    }

    /// JSON.SET `document` at `path`; serialization happens once, before any attempt
    pub fn json_set<T: Serialize + ?Sized>(&mut self, key: &str, path: &str, document: &T) -> Result<bool> {
        let json = serde_json::to_string(document)?;
        self.execute(|conn| conn.json_set(key, path, &json))
    }

    /// Release the active connection
    ///
    /// Never fails. The client stays usable; the next operation reconnects
    /// starting from the current active endpoint.
    pub fn close(&mut self) {
        self.orchestrator.selector_mut().close();
    }

    pub fn is_connected(&self) -> bool {
        self.orchestrator.selector().is_connected()
    }

    pub fn active_index(&self) -> usize {
        self.orchestrator.selector().active_index()
    }

    pub fn active_endpoint(&self) -> &Endpoint {
        self.orchestrator.selector().active_endpoint()
    }

    /// Endpoints in rotation order
    pub fn endpoints(&self) -> &[Endpoint] {
        self.orchestrator.selector().registry().as_slice()
    }
}

/// Cloneable handle to one [`FailoverClient`]
///
/// Operations are serialized: the lock is held for the whole retry loop,
/// backoff sleeps included, so callers never observe a half-rotated state.
pub struct SharedFailoverClient<F: Connector = ConnectionFactory> {
    inner: Arc<Mutex<FailoverClient<F>>>,
}

impl<F: Connector> Clone for SharedFailoverClient<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Connector> From<FailoverClient<F>> for SharedFailoverClient<F> {
    fn from(client: FailoverClient<F>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }
}

impl SharedFailoverClient<ConnectionFactory> {
    pub fn new(config: FailoverConfig) -> Result<Self> {
        FailoverClient::new(config).map(Self::from)
    }
}

impl<F: Connector> SharedFailoverClient<F> {
    pub fn execute<T, Op>(&self, operation: Op) -> Result<T>
    where
        Op: FnMut(&mut F::Connection) -> std::result::Result<T, StoreError>,
    {
        self.inner.lock().execute(operation)
    }

    pub fn run(&self, command: &Command) -> Result<CommandOutput> {
        self.inner.lock().run(command)
    }

    pub fn ping(&self) -> Result<bool> {
        self.inner.lock().ping()
    }

    pub fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        self.inner.lock().get(key)
    }

    pub fn set(&self, key: &str, value: impl AsRef<[u8]>, options: SetOptions) -> Result<bool> {
        self.inner.lock().set(key, value, options)
    }

    pub fn incr(&self, key: &str) -> Result<i64> {
        self.inner.lock().incr(key)
    }

    pub fn json_set<T: Serialize + ?Sized>(&self, key: &str, path: &str, document: &T) -> Result<bool> {
        self.inner.lock().json_set(key, path, document)
    }

    pub fn close(&self) {
        self.inner.lock().close();
    }

    pub fn active_index(&self) -> usize {
        self.inner.lock().active_index()
    }

    pub fn active_endpoint(&self) -> Endpoint {
        self.inner.lock().active_endpoint().clone()
    }
}
