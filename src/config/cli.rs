//! Command-line argument parsing
//!
//! Connection options apply to every `--endpoint`; endpoints loaded from
//! `--endpoints-file` carry their own credentials and TLS settings.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::endpoint::Endpoint;

/// Failover-ready Valkey/Redis client for Active-Active databases
#[derive(Parser, Debug, Clone)]
#[command(name = "valkey-failover")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Connection Options =====
    /// Member endpoint as host:port (repeat for each member)
    #[arg(short = 'e', long = "endpoint", action = clap::ArgAction::Append)]
    pub endpoints: Vec<Endpoint>,

    /// JSON file with a list of endpoint objects
    #[arg(long = "endpoints-file")]
    pub endpoints_file: Option<PathBuf>,

    /// Password for AUTH command
    #[arg(short = 'a', long = "auth")]
    pub password: Option<String>,

    /// Username for ACL AUTH (requires --auth)
    #[arg(long = "user")]
    pub username: Option<String>,

    /// Database number to SELECT
    #[arg(long = "dbnum")]
    pub dbnum: Option<u32>,

    // ===== TLS Options =====
    /// Enable TLS connection
    #[arg(long = "tls")]
    pub tls: bool,

    /// Skip TLS certificate verification (insecure)
    #[arg(long = "tls-skip-verify")]
    pub tls_skip_verify: bool,

    /// CA certificate file for TLS
    #[arg(long = "tls-ca-cert")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Client certificate file for TLS
    #[arg(long = "tls-cert")]
    pub tls_cert: Option<PathBuf>,

    /// Client private key file for TLS
    #[arg(long = "tls-key")]
    pub tls_key: Option<PathBuf>,

    /// Server Name Indication for TLS
    #[arg(long = "tls-sni")]
    pub tls_sni: Option<String>,

    // ===== Timing Options =====
    /// Socket read/write timeout in milliseconds
    #[arg(long = "socket-timeout", default_value_t = 2500)]
    pub socket_timeout_ms: u64,

    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    // ===== Failover Options =====
    /// Total attempts per operation (first try included)
    #[arg(long = "max-attempts", default_value_t = 5)]
    pub max_attempts: u32,

    /// Keep endpoints in the given order instead of shuffling
    #[arg(long = "no-shuffle")]
    pub no_shuffle: bool,

    /// Return values as raw bytes instead of decoding UTF-8
    #[arg(long = "raw")]
    pub raw: bool,

    // ===== Output Options =====
    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Operation to run against the database
#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Check that some endpoint answers PING
    Ping,

    /// Read a value
    Get { key: String },

    /// Write a value
    Set {
        key: String,
        value: String,

        /// Expire after N seconds
        #[arg(long = "ex", conflicts_with = "px")]
        ex: Option<u64>,

        /// Expire after N milliseconds
        #[arg(long = "px")]
        px: Option<u64>,

        /// Only set the key if it does not exist
        #[arg(long = "nx")]
        nx: bool,
    },

    /// Atomically increment an integer value
    Incr { key: String },

    /// Write a JSON document (RedisJSON JSON.SET)
    JsonSet {
        key: String,
        /// JSONPath, `$` for the root
        path: String,
        /// Document as JSON text
        json: String,
    },

    /// Increment a counter a few times, then read it back
    Demo {
        #[arg(long = "key", default_value = "demo:aa:counter")]
        key: String,

        #[arg(long = "count", default_value_t = 5)]
        count: u32,

        /// Pause between increments in milliseconds
        #[arg(long = "interval", default_value_t = 100)]
        interval_ms: u64,
    },
}

impl CliArgs {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_some() && self.password.is_none() {
            return Err("--user requires --auth".to_string());
        }

        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err("--tls-cert and --tls-key must be given together".to_string());
        }

        if self.max_attempts == 0 {
            return Err("--max-attempts must be at least 1".to_string());
        }

        if self.socket_timeout_ms == 0 {
            return Err("--socket-timeout must be greater than 0".to_string());
        }

        if self.connect_timeout_ms == 0 {
            return Err("--connect-timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test", "ping"]);
        assert!(args.endpoints.is_empty());
        assert_eq!(args.socket_timeout_ms, 2500);
        assert_eq!(args.max_attempts, 5);
        assert!(!args.raw);
        assert!(matches!(args.command, CliCommand::Ping));
    }

    #[test]
    fn test_multiple_endpoints() {
        let args = CliArgs::parse_from([
            "test", "-e", "host1:6380", "-e", "host2:6381", "get", "k",
        ]);
        assert_eq!(args.endpoints.len(), 2);
        assert_eq!(args.endpoints[0].host, "host1");
        assert_eq!(args.endpoints[1].port, 6381);
        assert!(matches!(args.command, CliCommand::Get { ref key } if key == "k"));
    }

    #[test]
    fn test_set_args() {
        let args = CliArgs::parse_from(["test", "set", "k", "v", "--ex", "10", "--nx"]);
        match args.command {
            CliCommand::Set { key, value, ex, px, nx } => {
                assert_eq!(key, "k");
                assert_eq!(value, "v");
                assert_eq!(ex, Some(10));
                assert_eq!(px, None);
                assert!(nx);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ex_conflicts_with_px() {
        let res = CliArgs::try_parse_from(["test", "set", "k", "v", "--ex", "1", "--px", "5"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let res = CliArgs::try_parse_from(["test", "-e", "host:port", "ping"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_validation_user_without_auth() {
        let args = CliArgs::parse_from(["test", "--user", "admin", "ping"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_tls_cert_without_key() {
        let args = CliArgs::parse_from(["test", "--tls-cert", "cert.pem", "ping"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_attempts() {
        let args = CliArgs::parse_from(["test", "--max-attempts", "0", "ping"]);
        assert!(args.validate().is_err());
    }
}
