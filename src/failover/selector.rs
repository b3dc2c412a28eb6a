//! Active endpoint and connection handle

use std::io;
use std::sync::Arc;

use super::events::FailoverEvents;
use super::probe::probe;
use super::registry::EndpointRegistry;
use crate::client::{Connector, StoreConnection};
use crate::config::Endpoint;
use crate::utils::StoreError;

/// Every endpoint failed to connect or answer PING in one rotation
#[derive(Debug)]
pub struct Unreachable {
    pub tried: usize,
    pub last: StoreError,
}

/// Owns the active index and the (at most one) live connection
///
/// Connections are probed only when acquired; a held connection is handed
/// out unchanged until it is invalidated, discarded or closed.
pub struct ConnectionSelector<F: Connector> {
    registry: EndpointRegistry,
    connector: F,
    events: Arc<dyn FailoverEvents>,
    active_idx: usize,
    conn: Option<F::Connection>,
}

impl<F: Connector> ConnectionSelector<F> {
    pub fn new(registry: EndpointRegistry, connector: F, events: Arc<dyn FailoverEvents>) -> Self {
        Self {
            registry,
            connector,
            events,
            active_idx: 0,
            conn: None,
        }
    }

    /// Return the held connection, or acquire one starting at the active index
    pub fn ensure_connection(&mut self) -> Result<&mut F::Connection, Unreachable> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Try each endpoint once, in rotation order
    fn connect(&mut self) -> Result<F::Connection, Unreachable> {
        let len = self.registry.len();
        let mut last_err = None;

        for i in 0..len {
            let idx = (self.active_idx + i) % len;
            let endpoint = self.registry.get(idx);
            self.events.connecting(endpoint, idx);

            let attempt = self.connector.connect(endpoint).and_then(|mut conn| {
                probe(&mut conn)?;
                Ok(conn)
            });

            match attempt {
                Ok(conn) => {
                    self.active_idx = idx;
                    self.events.connected(endpoint, idx);
                    return Ok(conn);
                }
                Err(e) => {
                    self.events.connect_failed(endpoint, idx, &e);
                    last_err = Some(e);
                }
            }
        }

        Err(Unreachable {
            tried: len,
            last: last_err
                .unwrap_or_else(|| StoreError::Io(io::Error::from(io::ErrorKind::NotConnected))),
        })
    }

    /// Drop the connection and move the rotation start to the next endpoint
    pub fn invalidate(&mut self) {
        self.conn = None;
        self.active_idx = (self.active_idx + 1) % self.registry.len();
    }

    /// Drop the connection but keep the active index
    pub fn discard(&mut self) {
        self.conn = None;
    }

    /// Release the connection; errors are reported to the event sink only
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close() {
                self.events.close_failed(self.registry.get(self.active_idx), &e);
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn active_index(&self) -> usize {
        self.active_idx
    }

    pub fn active_endpoint(&self) -> &Endpoint {
        self.registry.get(self.active_idx)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn events(&self) -> &Arc<dyn FailoverEvents> {
        &self.events
    }
}
