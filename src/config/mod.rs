//! Configuration module

pub mod cli;
pub mod endpoint;
pub mod failover_config;
pub mod tls_config;

pub use cli::{CliArgs, CliCommand};
pub use endpoint::{Endpoint, TransportOptions, DEFAULT_PORT};
pub use failover_config::FailoverConfig;
pub use tls_config::TlsConfig;
