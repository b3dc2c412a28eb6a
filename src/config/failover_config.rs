//! Failover client configuration

use std::time::Duration;

use super::cli::CliArgs;
use super::endpoint::Endpoint;
use super::tls_config::TlsConfig;
use crate::failover::RetryPolicy;
use crate::utils::FailoverError;

/// Default socket read/write timeout
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(2500);

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Complete failover client configuration
#[derive(Debug, Clone)]
pub struct FailoverConfig {
    /// Candidate endpoints; must not be empty
    pub endpoints: Vec<Endpoint>,
    /// Decode bulk string replies as UTF-8 text
    pub decode_responses: bool,
    /// Read/write timeout applied to every connection
    pub socket_timeout: Duration,
    /// Connect timeout unless an endpoint overrides it
    pub connect_timeout: Duration,
    /// Shuffle the endpoint list once at construction
    pub shuffle_endpoints: bool,
    pub retry: RetryPolicy,
}

impl FailoverConfig {
    /// Configuration with default timeouts and retry policy
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            decode_responses: true,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shuffle_endpoints: true,
            retry: RetryPolicy::default(),
        }
    }

    /// Reject settings that would make every connect fail locally
    ///
    /// A zero socket timeout cannot be applied to a socket at all, so it
    /// would otherwise surface as every endpoint being unreachable.
    pub fn validate(&self) -> Result<(), FailoverError> {
        if self.endpoints.is_empty() {
            return Err(FailoverError::Configuration(
                "At least one endpoint is required".to_string(),
            ));
        }
        if self.socket_timeout.is_zero() {
            return Err(FailoverError::Configuration(
                "socket_timeout must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(FailoverError::Configuration(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }
        if let Some(ep) = self
            .endpoints
            .iter()
            .find(|ep| ep.options.connect_timeout_ms == Some(0))
        {
            return Err(FailoverError::Configuration(format!(
                "connect_timeout_ms for {} must be greater than 0",
                ep
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(FailoverError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        args.validate()?;

        let tls_config = TlsConfig {
            skip_verify: args.tls_skip_verify,
            ca_cert: args.tls_ca_cert.clone(),
            client_cert: args.tls_cert.clone(),
            client_key: args.tls_key.clone(),
            sni: args.tls_sni.clone(),
        };

        // Connection flags only apply to endpoints given on the command line
        let mut endpoints: Vec<Endpoint> = args
            .endpoints
            .iter()
            .cloned()
            .map(|mut ep| {
                if let Some(ref password) = args.password {
                    ep = ep.with_credentials(args.username.clone(), password.clone());
                }
                if args.tls {
                    ep = ep.with_tls(tls_config.clone());
                }
                if args.dbnum.is_some() {
                    ep.options.db = args.dbnum;
                }
                ep
            })
            .collect();

        if let Some(ref path) = args.endpoints_file {
            let data = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
            let from_file: Vec<Endpoint> = serde_json::from_str(&data)
                .map_err(|e| format!("Invalid endpoints file {:?}: {}", path, e))?;
            endpoints.extend(from_file);
        }

        if endpoints.is_empty() {
            endpoints.push(Endpoint::new("127.0.0.1", super::endpoint::DEFAULT_PORT));
        }

        Ok(Self {
            endpoints,
            decode_responses: !args.raw,
            socket_timeout: Duration::from_millis(args.socket_timeout_ms),
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            shuffle_endpoints: !args.no_shuffle,
            retry: RetryPolicy {
                max_attempts: args.max_attempts,
                ..RetryPolicy::default()
            },
        })
    }
}
