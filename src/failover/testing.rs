//! In-memory store used by the failover tests
//!
//! Endpoints are told apart by host name. Each host can refuse
//! connections, fail its PING, or have command failures queued up.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use super::events::FailoverEvents;
use super::retry::RetryPolicy;
use crate::client::{Connector, StoreConnection};
use crate::config::{Endpoint, FailoverConfig};
use crate::utils::{RespValue, StoreError};

#[derive(Default)]
pub struct ScriptState {
    /// Hosts whose connect fails with ECONNREFUSED
    pub refused: HashSet<String>,
    /// Hosts that connect but fail PING
    pub ping_down: HashSet<String>,
    /// Errors returned by the next non-PING commands, in order
    pub command_failures: VecDeque<StoreError>,
    /// Every non-PING command fails with this kind when set
    pub always_fail: Option<io::ErrorKind>,
    pub close_fails: bool,
    /// Hosts in connect order, including failed attempts
    pub connect_attempts: Vec<String>,
    /// (host, command name) for every non-PING command
    pub commands: Vec<(String, String)>,
    pub closes: usize,
    counters: HashMap<String, i64>,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    pub state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, host: &str) {
        self.state.lock().refused.insert(host.to_string());
    }

    pub fn fail_ping(&self, host: &str) {
        self.state.lock().ping_down.insert(host.to_string());
    }

    pub fn fail_next(&self, kind: io::ErrorKind) {
        self.state
            .lock()
            .command_failures
            .push_back(StoreError::from(io::Error::from(kind)));
    }

    pub fn fail_next_with(&self, error: StoreError) {
        self.state.lock().command_failures.push_back(error);
    }

    pub fn connect_attempts(&self) -> Vec<String> {
        self.state.lock().connect_attempts.clone()
    }

    pub fn command_hosts(&self) -> Vec<String> {
        self.state.lock().commands.iter().map(|(h, _)| h.clone()).collect()
    }
}

pub struct ScriptedConnection {
    host: String,
    state: Arc<Mutex<ScriptState>>,
    decode: bool,
}

impl StoreConnection for ScriptedConnection {
    fn execute(&mut self, args: &[&[u8]]) -> Result<RespValue, StoreError> {
        let name = String::from_utf8_lossy(args[0]).to_uppercase();
        let mut state = self.state.lock();

        if name == "PING" {
            if state.ping_down.contains(&self.host) {
                return Err(StoreError::from(io::Error::from(io::ErrorKind::TimedOut)));
            }
            return Ok(RespValue::SimpleString("PONG".into()));
        }

        state.commands.push((self.host.clone(), name.clone()));
        if let Some(err) = state.command_failures.pop_front() {
            return Err(err);
        }
        if let Some(kind) = state.always_fail {
            return Err(StoreError::from(io::Error::from(kind)));
        }

        match name.as_str() {
            "GET" => {
                let key = String::from_utf8_lossy(args[1]);
                Ok(RespValue::BulkString(
                    format!("{}:{}", self.host, key).into_bytes(),
                ))
            }
            "INCR" => {
                let key = String::from_utf8_lossy(args[1]).into_owned();
                let counter = state.counters.entry(key).or_insert(0);
                *counter += 1;
                Ok(RespValue::Integer(*counter))
            }
            "SET" | "JSON.SET" => Ok(RespValue::SimpleString("OK".into())),
            _ => Ok(RespValue::Error(format!("ERR unknown command '{}'", name))),
        }
    }

    fn decode_responses(&self) -> bool {
        self.decode
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.closes += 1;
        if state.close_fails {
            return Err(StoreError::from(io::Error::from(io::ErrorKind::NotConnected)));
        }
        Ok(())
    }
}

impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    fn connect(&self, endpoint: &Endpoint) -> Result<ScriptedConnection, StoreError> {
        let mut state = self.state.lock();
        state.connect_attempts.push(endpoint.host.clone());
        if state.refused.contains(&endpoint.host) {
            return Err(StoreError::from(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )));
        }
        Ok(ScriptedConnection {
            host: endpoint.host.clone(),
            state: self.state.clone(),
            decode: true,
        })
    }
}

/// Event sink that keeps a line per event
#[derive(Default)]
pub struct RecordingEvents {
    pub lines: Mutex<Vec<String>>,
    /// (attempt, delay) for every scheduled retry
    pub delays: Mutex<Vec<(u32, Duration)>>,
}

impl RecordingEvents {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn delays(&self) -> Vec<(u32, Duration)> {
        self.delays.lock().clone()
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

impl FailoverEvents for RecordingEvents {
    fn connecting(&self, endpoint: &Endpoint, index: usize) {
        self.push(format!("connecting {} {}", endpoint.host, index));
    }

    fn connected(&self, endpoint: &Endpoint, index: usize) {
        self.push(format!("connected {} {}", endpoint.host, index));
    }

    fn connect_failed(&self, endpoint: &Endpoint, index: usize, _error: &StoreError) {
        self.push(format!("connect_failed {} {}", endpoint.host, index));
    }

    fn command_failed(&self, endpoint: &Endpoint, attempt: u32, _error: &StoreError) {
        self.push(format!("command_failed {} {}", endpoint.host, attempt));
    }

    fn retry_scheduled(&self, attempt: u32, delay: Duration, _error: &StoreError) {
        self.delays.lock().push((attempt, delay));
        self.push(format!("retry {}", attempt));
    }

    fn close_failed(&self, endpoint: &Endpoint, _error: &StoreError) {
        self.push(format!("close_failed {}", endpoint.host));
    }
}

pub fn endpoints(hosts: &[&str]) -> Vec<Endpoint> {
    hosts.iter().map(|h| Endpoint::new(*h, 6379)).collect()
}

/// Fixed endpoint order and no backoff sleeps
pub fn test_config(hosts: &[&str]) -> FailoverConfig {
    let mut config = FailoverConfig::new(endpoints(hosts));
    config.shuffle_endpoints = false;
    config.retry = RetryPolicy {
        multiplier: Duration::ZERO,
        ..RetryPolicy::default()
    };
    config
}
