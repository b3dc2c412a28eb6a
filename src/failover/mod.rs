//! Endpoint failover and retry
//!
//! Layers, bottom up: [`EndpointRegistry`] fixes the candidate order,
//! [`ConnectionSelector`] owns the active endpoint and its connection,
//! [`Orchestrator`] applies the retry policy, and [`FailoverClient`]
//! exposes the store operations.

pub mod client;
pub mod command;
pub mod events;
pub mod probe;
pub mod registry;
pub mod retry;
pub mod selector;

#[cfg(test)]
mod testing;

pub use client::{FailoverClient, SharedFailoverClient};
pub use command::{Command, CommandOutput, JsonSetCommand, SetCommand};
pub use events::{FailoverEvents, TracingEvents};
pub use probe::probe;
pub use registry::EndpointRegistry;
pub use retry::{Orchestrator, RetryPolicy};
pub use selector::{ConnectionSelector, Unreachable};
