//! Socket transport to the host editor.
//!
//! [`connect`] dials the configured endpoint and returns a [`HostConnection`],
//! a blocking duplex stream. The connection is shut down when it is closed
//! explicitly or dropped, so leaving the dispatch loop by any path releases
//! the socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use mimsy_config::SocketEndpoint;
#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};
use tracing::debug;

use crate::error::ExtensionError;

/// Upper bound on establishing the connection. Reads and writes on an
/// established connection have no timeout.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracing target for transport operations.
const TRANSPORT_TARGET: &str = "mimsy_extension::transport";

#[derive(Debug)]
enum HostStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

/// Exclusive connection to the host editor.
#[derive(Debug)]
pub struct HostConnection {
    stream: HostStream,
    endpoint: String,
    closed: bool,
}

impl HostConnection {
    /// Endpoint this connection was opened to, as text.
    #[must_use]
    pub const fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Shuts down both directions of the stream and releases it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by the shutdown. The socket is released
    /// either way.
    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.shutdown()
    }

    fn shutdown(&self) -> io::Result<()> {
        debug!(
            target: TRANSPORT_TARGET,
            endpoint = self.endpoint.as_str(),
            "closing host connection"
        );
        match &self.stream {
            HostStream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            HostStream::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Drop for HostConnection {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(error) = self.shutdown() {
            debug!(
                target: TRANSPORT_TARGET,
                endpoint = self.endpoint.as_str(),
                %error,
                "host connection already closed"
            );
        }
    }
}

impl Read for HostConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stream {
            HostStream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            HostStream::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for HostConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.stream {
            HostStream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            HostStream::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.stream {
            HostStream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            HostStream::Unix(stream) => stream.flush(),
        }
    }
}

/// Opens the connection to the host. Failure is fatal; there is no retry.
///
/// # Errors
///
/// Returns [`ExtensionError::Connection`] when the endpoint cannot be
/// resolved or dialled, and on non-Unix platforms for Unix endpoints.
pub fn connect(endpoint: &SocketEndpoint) -> Result<HostConnection, ExtensionError> {
    let endpoint_display = endpoint.to_string();
    let connection_error = |source: io::Error| ExtensionError::Connection {
        endpoint: endpoint_display.clone(),
        source: Arc::new(source),
    };

    let stream = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            connect_tcp(host, *port).map_err(connection_error)?
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str()).map_err(connection_error)?
            }

            #[cfg(not(unix))]
            {
                return Err(connection_error(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("platform does not support Unix sockets: {path}"),
                )));
            }
        }
    };

    debug!(
        target: TRANSPORT_TARGET,
        endpoint = endpoint_display.as_str(),
        "connected to host"
    );
    Ok(HostConnection {
        stream,
        endpoint: endpoint_display,
        closed: false,
    })
}

fn connect_tcp(host: &str, port: u16) -> io::Result<HostStream> {
    let address = resolve_tcp_address(host, port)?;
    let stream = TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)?;
    // Frames are small and the host waits on each reply.
    stream.set_nodelay(true)?;
    Ok(HostStream::Tcp(stream))
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<HostStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream: UnixStream = socket.into();
    Ok(HostStream::Unix(stream))
}
