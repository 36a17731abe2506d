//! Raw TCP printer transport (port 9100 "JetDirect" style).
//!
//! Most networked label printers accept their command language verbatim on
//! TCP port 9100.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::error::{LabelerError, Result};

/// Default raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Connect and write timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// An open connection to a network printer.
#[derive(Debug)]
pub struct NetworkPrinter {
    stream: TcpStream,
    addr: SocketAddr,
}

impl NetworkPrinter {
    /// Connect to `host:port` (port 9100 if omitted).
    ///
    /// ## Errors
    ///
    /// `DeviceUnavailable` if the address does not resolve or the connection
    /// is refused or times out.
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_timeout(addr, DEFAULT_TIMEOUT)
    }

    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let addr = resolve(addr)?;

        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| LabelerError::DeviceUnavailable(format!("{}: {}", addr, e)))?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(|e| LabelerError::DeviceUnavailable(format!("{}: {}", addr, e)))?;

        debug!(%addr, "Connected to printer");
        Ok(Self { stream, addr })
    }
}

impl Transport for NetworkPrinter {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .map_err(|e| LabelerError::WriteFailed(format!("{}: {}", self.addr, e)))?;
        self.stream
            .flush()
            .map_err(|e| LabelerError::WriteFailed(format!("{}: {}", self.addr, e)))
    }
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    let with_port = if addr.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        addr.to_string()
    } else {
        format!("{}:{}", addr, DEFAULT_PORT)
    };

    with_port
        .to_socket_addrs()
        .map_err(|e| LabelerError::DeviceUnavailable(format!("Invalid address {}: {}", addr, e)))?
        .next()
        .ok_or_else(|| LabelerError::DeviceUnavailable(format!("No address for {}", addr)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_resolve_adds_default_port() {
        let addr = resolve("127.0.0.1").unwrap();
        assert_eq!(addr.port(), DEFAULT_PORT);

        let addr = resolve("127.0.0.1:6101").unwrap();
        assert_eq!(addr.port(), 6101);
    }

    #[test]
    fn test_send_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).unwrap();
            received
        });

        let mut printer = NetworkPrinter::connect(&addr).unwrap();
        printer.send(b"N\nP1").unwrap();
        drop(printer);

        assert_eq!(server.join().unwrap(), b"N\nP1");
    }

    #[test]
    fn test_refused_connection_is_device_unavailable() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = NetworkPrinter::connect_timeout(&format!("127.0.0.1:{}", port), Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, LabelerError::DeviceUnavailable(_)));
    }
}
