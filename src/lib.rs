//! valkey-failover library
//!
//! Client-side failover for Valkey/Redis Active-Active deployments: one
//! logical store reached through several endpoints, with PING probing,
//! endpoint rotation and bounded retries with jittered backoff.

pub mod client;
pub mod config;
pub mod failover;
pub mod utils;

pub use client::{Expiry, SetOptions, StoreValue};
pub use config::{Endpoint, FailoverConfig, TlsConfig};
pub use failover::{
    Command, CommandOutput, FailoverClient, FailoverEvents, RetryPolicy, SharedFailoverClient,
    TracingEvents,
};
pub use utils::{FailoverError, StoreError};
