//! Raw TCP connection to one endpoint
//!
//! Blocking TCP (and TLS) connections speaking RESP2, with the same
//! read/write timeout applied to every command.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::store::{check_reply, Connector, StoreConnection};
use crate::config::{Endpoint, FailoverConfig};
use crate::utils::{RespDecoder, RespEncoder, RespValue, StoreError};

/// Underlying byte stream
///
/// For TCP, we split into separate reader/writer.
/// For TLS, the reader buffers the single stream and writes go through
/// `get_mut()` since native-tls doesn't support cloning.
enum Stream {
    Tcp {
        writer: BufWriter<TcpStream>,
        reader: BufReader<TcpStream>,
    },
    #[cfg(feature = "native-tls-backend")]
    NativeTls {
        stream: BufReader<native_tls::TlsStream<TcpStream>>,
    },
}

/// Raw connection wrapper (TCP or TLS)
pub struct RawConnection {
    stream: Stream,
    encoder: RespEncoder,
    decode_responses: bool,
}

/// Resolve `host:port` and connect to the first address that accepts
fn connect_socket(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    socket_timeout: Duration,
) -> Result<TcpStream, StoreError> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(StoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No addresses found for {}", host),
        )));
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(stream) => {
                stream.set_nodelay(true).ok(); // Disable Nagle's algorithm
                stream.set_read_timeout(Some(socket_timeout))?;
                stream.set_write_timeout(Some(socket_timeout))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err
        .map(StoreError::from)
        .unwrap_or_else(|| StoreError::Io(io::Error::from(io::ErrorKind::NotConnected))))
}

impl RawConnection {
    /// Create new TCP connection
    pub fn connect_tcp(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        socket_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let stream = connect_socket(host, port, connect_timeout, socket_timeout)?;

        let writer = BufWriter::with_capacity(16 * 1024, stream.try_clone()?);
        let reader = BufReader::with_capacity(16 * 1024, stream);

        Ok(RawConnection {
            stream: Stream::Tcp { writer, reader },
            encoder: RespEncoder::with_capacity(256),
            decode_responses: true,
        })
    }

    /// Create new TLS connection
    #[cfg(feature = "native-tls-backend")]
    pub fn connect_tls(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        socket_timeout: Duration,
        tls_config: &crate::config::TlsConfig,
    ) -> Result<Self, StoreError> {
        let connector = tls_config.build_connector()?;

        let tcp_stream = connect_socket(host, port, connect_timeout, socket_timeout)?;

        let tls_stream = connector
            .connect(tls_config.server_name(host), tcp_stream)
            .map_err(|e| match e {
                native_tls::HandshakeError::Failure(e) => {
                    StoreError::Tls(format!("TLS handshake failed: {}", e))
                }
                native_tls::HandshakeError::WouldBlock(_) => {
                    StoreError::Timeout(io::Error::from(io::ErrorKind::TimedOut))
                }
            })?;

        Ok(RawConnection {
            stream: Stream::NativeTls {
                stream: BufReader::with_capacity(16 * 1024, tls_stream),
            },
            encoder: RespEncoder::with_capacity(256),
            decode_responses: true,
        })
    }

    /// Choose whether GET replies are decoded as UTF-8 text
    pub fn set_decode_responses(&mut self, decode: bool) {
        self.decode_responses = decode;
    }

    fn write_encoded(&mut self) -> io::Result<()> {
        let bytes = self.encoder.as_bytes();
        match &mut self.stream {
            Stream::Tcp { writer, .. } => {
                writer.write_all(bytes)?;
                writer.flush()
            }
            #[cfg(feature = "native-tls-backend")]
            Stream::NativeTls { stream } => {
                stream.get_mut().write_all(bytes)?;
                stream.get_mut().flush()
            }
        }
    }

    fn read_response(&mut self) -> io::Result<RespValue> {
        match &mut self.stream {
            Stream::Tcp { reader, .. } => decode_one(reader),
            #[cfg(feature = "native-tls-backend")]
            Stream::NativeTls { stream } => decode_one(stream),
        }
    }

    /// Send AUTH command
    pub fn authenticate(&mut self, password: &str, username: Option<&str>) -> Result<(), StoreError> {
        let response = match username {
            Some(user) => self.execute(&[&b"AUTH"[..], user.as_bytes(), password.as_bytes()]),
            None => self.execute(&[&b"AUTH"[..], password.as_bytes()]),
        };

        match response {
            Ok(reply) if reply.is_ok() => Ok(()),
            Ok(other) => Err(StoreError::Auth(format!(
                "Unexpected AUTH response: {:?}",
                other
            ))),
            Err(StoreError::Server(msg)) => Err(StoreError::Auth(msg)),
            Err(e) => Err(e),
        }
    }

    /// Send SELECT command
    pub fn select_db(&mut self, db: u32) -> Result<(), StoreError> {
        let mut db_buf = itoa::Buffer::new();
        match self.execute(&[&b"SELECT"[..], db_buf.format(db).as_bytes()])? {
            reply if reply.is_ok() => Ok(()),
            other => Err(StoreError::Protocol(format!(
                "Unexpected SELECT response: {:?}",
                other
            ))),
        }
    }
}

fn decode_one<R: BufRead>(reader: &mut R) -> io::Result<RespValue> {
    RespDecoder::new(reader).decode()
}

impl StoreConnection for RawConnection {
    fn execute(&mut self, args: &[&[u8]]) -> Result<RespValue, StoreError> {
        self.encoder.clear();
        self.encoder.encode_command(args);
        self.write_encoded()?;

        let reply = self.read_response().map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => StoreError::Protocol(e.to_string()),
            _ => StoreError::from(e),
        })?;
        check_reply(reply)
    }

    fn decode_responses(&self) -> bool {
        self.decode_responses
    }

    fn close(&mut self) -> Result<(), StoreError> {
        match &mut self.stream {
            Stream::Tcp { reader, .. } => reader.get_ref().shutdown(Shutdown::Both)?,
            #[cfg(feature = "native-tls-backend")]
            Stream::NativeTls { stream } => stream.get_mut().shutdown()?,
        }
        Ok(())
    }
}

/// Connection factory for creating connections with common config
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
    pub decode_responses: bool,
}

impl ConnectionFactory {
    pub fn from_config(config: &FailoverConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            socket_timeout: config.socket_timeout,
            decode_responses: config.decode_responses,
        }
    }
}

impl ConnectionFactory {
    #[cfg(feature = "native-tls-backend")]
    fn connect_tls(
        &self,
        endpoint: &Endpoint,
        connect_timeout: Duration,
    ) -> Result<RawConnection, StoreError> {
        RawConnection::connect_tls(
            &endpoint.host,
            endpoint.port,
            connect_timeout,
            self.socket_timeout,
            &endpoint.options.tls_config,
        )
    }

    #[cfg(not(feature = "native-tls-backend"))]
    fn connect_tls(
        &self,
        _endpoint: &Endpoint,
        _connect_timeout: Duration,
    ) -> Result<RawConnection, StoreError> {
        Err(StoreError::Tls("TLS support not compiled in".to_string()))
    }
}

impl Connector for ConnectionFactory {
    type Connection = RawConnection;

    /// Connect, authenticate and select the database; no liveness check
    fn connect(&self, endpoint: &Endpoint) -> Result<RawConnection, StoreError> {
        let connect_timeout = endpoint
            .options
            .connect_timeout()
            .unwrap_or(self.connect_timeout);

        let mut conn = if endpoint.tls {
            self.connect_tls(endpoint, connect_timeout)?
        } else {
            RawConnection::connect_tcp(
                &endpoint.host,
                endpoint.port,
                connect_timeout,
                self.socket_timeout,
            )?
        };

        conn.set_decode_responses(self.decode_responses);

        if let Some(ref password) = endpoint.password {
            conn.authenticate(password, endpoint.username.as_deref())?;
        }

        if let Some(db) = endpoint.options.db {
            conn.select_db(db)?;
        }

        Ok(conn)
    }
}
