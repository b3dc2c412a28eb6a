//! Error types for valkey-failover
//!
//! Two layers: [`StoreError`] is the closed set of failures a single store
//! connection can report, and [`FailoverError`] is what crosses the
//! failover client boundary after retries and rotation have been applied.

use std::io;
use thiserror::Error;

/// Errors raised by a single store connection
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Timed out: {0}")]
    Timeout(io::Error),

    #[error("Connection refused: {0}")]
    ConnectionRefused(io::Error),

    #[error("Connection reset: {0}")]
    ConnectionReset(io::Error),

    #[error("IO error: {0}")]
    Io(io::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Response is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => StoreError::Timeout(e),
            io::ErrorKind::ConnectionRefused => StoreError::ConnectionRefused(e),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => StoreError::ConnectionReset(e),
            _ => StoreError::Io(e),
        }
    }
}

impl StoreError {
    /// Whether the connection that produced this error can no longer be
    /// trusted to stay in sync with the server's reply stream
    pub fn poisons_connection(&self) -> bool {
        matches!(self, StoreError::Protocol(_))
    }
}

/// Retry classification of a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying, possibly against another endpoint
    Transient,
    /// Retrying will not help
    Fatal,
}

/// Classify a store error for the retry loop
pub fn classify(error: &StoreError) -> ErrorClass {
    match error {
        StoreError::Timeout(_)
        | StoreError::ConnectionRefused(_)
        | StoreError::ConnectionReset(_)
        | StoreError::Io(_) => ErrorClass::Transient,
        // Replica still loading its dataset into memory
        StoreError::Server(msg) if msg.starts_with("LOADING") => ErrorClass::Transient,
        StoreError::Auth(_)
        | StoreError::Tls(_)
        | StoreError::Server(_)
        | StoreError::Protocol(_)
        | StoreError::Decode(_)
        | StoreError::InvalidArgument(_) => ErrorClass::Fatal,
    }
}

/// Errors returned to callers of the failover client
#[derive(Error, Debug)]
pub enum FailoverError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transient failure on {endpoint} after {attempts} attempts: {source}")]
    Transient {
        endpoint: String,
        attempts: u32,
        source: StoreError,
    },

    #[error("All {tried} endpoints unreachable after {attempts} attempts: {source}")]
    AllEndpointsUnreachable {
        tried: usize,
        attempts: u32,
        source: StoreError,
    },

    #[error("Operation failed on {endpoint}: {source}")]
    Fatal {
        endpoint: String,
        source: StoreError,
    },

    #[error("Failed to serialize JSON document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FailoverError {
    /// The store error behind this failure, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            FailoverError::Configuration(_) | FailoverError::Serialization(_) => None,
            FailoverError::Transient { source, .. }
            | FailoverError::AllEndpointsUnreachable { source, .. }
            | FailoverError::Fatal { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, FailoverError>;
