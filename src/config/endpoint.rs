//! Endpoint description for one member of an Active-Active database

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::tls_config::TlsConfig;

/// Default Valkey/Redis port, used when an endpoint string has none
pub const DEFAULT_PORT: u16 = 6379;

/// Per-endpoint transport options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
    /// Overrides the factory-wide connect timeout
    pub connect_timeout_ms: Option<u64>,
    /// Database to SELECT after connecting
    pub db: Option<u32>,
    pub tls_config: TlsConfig,
}

impl TransportOptions {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// One network-addressable member of the replicated database
///
/// Endpoints are plain values: they are built once from configuration and
/// never mutated by the failover client.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub options: TransportOptions,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            tls: false,
            options: TransportOptions::default(),
        }
    }

    /// Set ACL credentials (username is optional for the default user)
    pub fn with_credentials(mut self, username: Option<String>, password: impl Into<String>) -> Self {
        self.username = username;
        self.password = Some(password.into());
        self
    }

    /// Enable TLS with the given settings
    pub fn with_tls(mut self, tls_config: TlsConfig) -> Self {
        self.tls = true;
        self.options.tls_config = tls_config;
        self
    }

    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// Hand-written so passwords never reach logs
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("options", &self.options)
            .finish()
    }
}

/// Parses `host`, `host:port` or `[ipv6]:port`
impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty endpoint".to_string());
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| format!("unterminated IPv6 address in '{}'", s))?;
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if tail.is_empty() => (host, None),
                None => return Err(format!("invalid endpoint '{}'", s)),
            }
        } else {
            match s.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(format!("missing host in '{}'", s));
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| format!("invalid port '{}' in '{}'", p, s))?,
            None => DEFAULT_PORT,
        };

        Ok(Endpoint::new(host, port))
    }
}
