//! Store connection traits
//!
//! [`StoreConnection`] is the minimal surface a connection has to offer:
//! send one command, report the decode mode, close. Typed commands live in
//! the [`StoreCommands`] extension trait so mock connections in tests only
//! implement the three base methods.

use std::fmt;

use crate::config::Endpoint;
use crate::utils::{RespValue, StoreError};

/// Base operations of a live connection to one endpoint
pub trait StoreConnection {
    /// Send a command and return its reply
    ///
    /// Error replies from the server come back as `Err`, see [`check_reply`].
    fn execute(&mut self, args: &[&[u8]]) -> Result<RespValue, StoreError>;

    /// Whether bulk string replies are decoded to text
    fn decode_responses(&self) -> bool;

    /// Release the underlying transport
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Builds connections to endpoints
///
/// Implementations must not retry; whatever goes wrong while building the
/// handle is returned as is.
pub trait Connector {
    type Connection: StoreConnection;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Connection, StoreError>;
}

/// Turn a server error reply into a [`StoreError`]
pub fn check_reply(reply: RespValue) -> Result<RespValue, StoreError> {
    match reply {
        RespValue::Error(msg) => {
            if msg.starts_with("NOAUTH") || msg.starts_with("WRONGPASS") || msg.starts_with("NOPERM")
            {
                Err(StoreError::Auth(msg))
            } else {
                Err(StoreError::Server(msg))
            }
        }
        other => Ok(other),
    }
}

fn unexpected(command: &str, reply: &RespValue) -> StoreError {
    StoreError::Protocol(format!("unexpected {} reply to {}", reply.kind(), command))
}

/// A value read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl StoreValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StoreValue::Text(s) => s.as_bytes(),
            StoreValue::Bytes(b) => b,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::Text(s) => Some(s),
            StoreValue::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            StoreValue::Text(s) => s.into_bytes(),
            StoreValue::Bytes(b) => b,
        }
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Text(s) => f.write_str(s),
            StoreValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

/// Key expiry for SET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Seconds(u64),
    Millis(u64),
}

/// Options for SET
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub expiry: Option<Expiry>,
    /// NX: only write when the key does not exist yet
    pub only_if_absent: bool,
}

/// Typed commands built on top of [`StoreConnection`]
pub trait StoreCommands: StoreConnection {
    /// Send PING and verify PONG response
    fn ping(&mut self) -> Result<bool, StoreError> {
        match self.execute(&[&b"PING"[..]])? {
            RespValue::SimpleString(s) => Ok(s == "PONG"),
            _ => Ok(false),
        }
    }

    /// GET; `None` when the key does not exist
    fn get(&mut self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        match self.execute(&[&b"GET"[..], key.as_bytes()])? {
            RespValue::Null => Ok(None),
            RespValue::BulkString(data) => {
                if self.decode_responses() {
                    Ok(Some(StoreValue::Text(String::from_utf8(data)?)))
                } else {
                    Ok(Some(StoreValue::Bytes(data)))
                }
            }
            other => Err(unexpected("GET", &other)),
        }
    }

    /// SET; returns false when NX prevented the write
    fn set(&mut self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool, StoreError> {
        let mut expiry_buf = itoa::Buffer::new();
        let mut args: Vec<&[u8]> = vec![&b"SET"[..], key.as_bytes(), value];

        match options.expiry {
            Some(Expiry::Seconds(n)) => {
                args.push(b"EX");
                args.push(expiry_buf.format(n).as_bytes());
            }
            Some(Expiry::Millis(n)) => {
                args.push(b"PX");
                args.push(expiry_buf.format(n).as_bytes());
            }
            None => {}
        }
        if options.only_if_absent {
            args.push(b"NX");
        }

        match self.execute(&args)? {
            reply if reply.is_ok() => Ok(true),
            RespValue::Null => Ok(false),
            other => Err(unexpected("SET", &other)),
        }
    }

    /// INCR; returns the value after the increment
    fn incr(&mut self, key: &str) -> Result<i64, StoreError> {
        match self.execute(&[&b"INCR"[..], key.as_bytes()])? {
            RespValue::Integer(n) => Ok(n),
            other => Err(unexpected("INCR", &other)),
        }
    }

    /// RedisJSON JSON.SET with an already serialized document
    fn json_set(&mut self, key: &str, path: &str, json: &str) -> Result<bool, StoreError> {
        match self.execute(&[&b"JSON.SET"[..], key.as_bytes(), path.as_bytes(), json.as_bytes()])? {
            reply if reply.is_ok() => Ok(true),
            RespValue::Null => Ok(false),
            other => Err(unexpected("JSON.SET", &other)),
        }
    }
}

// Blanket implementation: any StoreConnection automatically gets StoreCommands
impl<T: StoreConnection + ?Sized> StoreCommands for T {}
