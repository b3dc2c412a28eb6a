//! Failover event sink
//!
//! The selector and the retry loop report every connect attempt, failure
//! and retry through [`FailoverEvents`]. [`TracingEvents`] forwards them to
//! `tracing`; the subscriber itself is installed by the application.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Endpoint;
use crate::utils::StoreError;

/// Receives connection and retry transitions
pub trait FailoverEvents: Send + Sync {
    /// About to build and probe a connection
    fn connecting(&self, endpoint: &Endpoint, index: usize);

    /// Connection built and probed successfully, now active
    fn connected(&self, endpoint: &Endpoint, index: usize);

    /// Building or probing a connection failed
    fn connect_failed(&self, endpoint: &Endpoint, index: usize, error: &StoreError);

    /// A command failed transiently; the endpoint is about to be rotated out
    fn command_failed(&self, endpoint: &Endpoint, attempt: u32, error: &StoreError);

    /// Sleeping before the next attempt
    fn retry_scheduled(&self, attempt: u32, delay: Duration, error: &StoreError);

    /// Releasing a connection failed; the error is not propagated
    fn close_failed(&self, endpoint: &Endpoint, error: &StoreError);
}

/// Event sink emitting `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl FailoverEvents for TracingEvents {
    fn connecting(&self, endpoint: &Endpoint, index: usize) {
        debug!(endpoint = %endpoint, idx = index, "Connecting");
    }

    fn connected(&self, endpoint: &Endpoint, index: usize) {
        info!(endpoint = %endpoint, idx = index, "Connected to endpoint");
    }

    fn connect_failed(&self, endpoint: &Endpoint, index: usize, error: &StoreError) {
        warn!(endpoint = %endpoint, idx = index, error = %error, "Connect failed");
    }

    fn command_failed(&self, endpoint: &Endpoint, attempt: u32, error: &StoreError) {
        warn!(
            endpoint = %endpoint,
            attempt,
            error = %error,
            "Command error from current endpoint, attempting failover"
        );
    }

    fn retry_scheduled(&self, attempt: u32, delay: Duration, error: &StoreError) {
        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Retrying");
    }

    fn close_failed(&self, endpoint: &Endpoint, error: &StoreError) {
        debug!(endpoint = %endpoint, error = %error, "Ignoring error while closing connection");
    }
}
