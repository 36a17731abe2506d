//! Device channels that produce scale output lines.

use std::io::{BufRead, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LabelerError, Result};
use crate::transport::{SerialPort, Transport};

use super::parse::decode_line;

/// Something that can be opened to read scale lines.
///
/// Implemented by [`SerialLink`] for real scales; tests substitute in-memory
/// readers.
pub trait ScaleLink: Send + Sync {
    /// Open a fresh line reader. Each read should give up after `read_timeout`
    /// and report an empty read.
    fn open(&self, read_timeout: Duration) -> Result<Box<dyn BufRead + Send>>;

    /// Human-readable channel name for logs.
    fn describe(&self) -> String;

    /// Whether an empty read means the peer hung up and the link must be
    /// reopened. TTYs report a read timeout as an empty read, so only
    /// stream sockets say yes.
    fn hangs_up(&self) -> bool {
        false
    }
}

/// A scale on a serial TTY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialLink {
    pub path: PathBuf,
    pub baud: u32,
}

impl SerialLink {
    pub fn new(path: impl Into<PathBuf>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
        }
    }

    /// Poke the scale with CRLF and return the first line it answers with.
    pub fn probe(&self, timeout: Duration) -> Result<String> {
        let mut port = SerialPort::open_duplex(&self.path, self.baud, timeout)?;
        port.send(b"\r\n")?;

        let mut reader = BufReader::new(port);
        let mut raw = Vec::new();
        reader
            .read_until(b'\n', &mut raw)
            .map_err(|e| LabelerError::DeviceUnavailable(format!("{}: {}", self.describe(), e)))?;
        Ok(decode_line(&raw))
    }
}

impl ScaleLink for SerialLink {
    fn open(&self, read_timeout: Duration) -> Result<Box<dyn BufRead + Send>> {
        let port = SerialPort::open_duplex(&self.path, self.baud, read_timeout)?;
        Ok(Box::new(BufReader::new(port)))
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.path.display(), self.baud)
    }
}

/// A scale served over TCP (serial-to-Ethernet adapters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpLink {
    pub addr: String,
}

impl TcpLink {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl ScaleLink for TcpLink {
    fn open(&self, read_timeout: Duration) -> Result<Box<dyn BufRead + Send>> {
        let unavailable = |e: std::io::Error| LabelerError::DeviceUnavailable(format!("{}: {}", self.addr, e));

        let addr = self
            .addr
            .to_socket_addrs()
            .map_err(unavailable)?
            .next()
            .ok_or_else(|| LabelerError::DeviceUnavailable(format!("No address for {}", self.addr)))?;
        let stream = TcpStream::connect_timeout(&addr, read_timeout.max(Duration::from_millis(100)))
            .map_err(unavailable)?;
        stream
            .set_read_timeout(Some(read_timeout.max(Duration::from_millis(1))))
            .map_err(unavailable)?;

        Ok(Box::new(BufReader::new(stream)))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    fn hangs_up(&self) -> bool {
        true
    }
}
