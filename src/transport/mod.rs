//! # Device Transport Layer
//!
//! Sends rendered payloads to printers and writes label artifacts to disk.
//!
//! ## Endpoints
//!
//! | Address | Endpoint | Channel |
//! |---------|----------|---------|
//! | `Simulate` | [`Endpoint::Simulated`] | none, payload is logged and dropped |
//! | `tcp://host:port`, `host:port` | [`Endpoint::Network`] | raw TCP ([`network`]) |
//! | anything else | [`Endpoint::Serial`] | raw TTY at the given baud ([`serial`]) |
//!
//! Every [`send`] opens its channel, writes the whole payload, flushes and
//! closes the channel again, whether or not the write succeeded. Nothing is
//! retried.

pub mod network;
pub mod serial;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{LabelerError, Result};

pub use network::NetworkPrinter;
pub use serial::SerialPort;

/// Reserved address that never opens a real channel.
pub const SIMULATED: &str = "Simulate";

/// An open channel that accepts a complete payload.
pub trait Transport {
    /// Write all of `data` and flush.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}

/// Where a device lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Simulated,
    Serial { path: PathBuf, baud: u32 },
    Network { addr: String },
}

impl Endpoint {
    /// Parse a symbolic address plus rate parameter.
    ///
    /// The rate is ignored for simulated and network endpoints.
    pub fn parse(address: &str, baud: u32) -> Self {
        let address = address.trim();
        if address.is_empty() || address.eq_ignore_ascii_case(SIMULATED) {
            return Endpoint::Simulated;
        }
        if let Some(addr) = address.strip_prefix("tcp://") {
            return Endpoint::Network {
                addr: addr.to_string(),
            };
        }
        if looks_like_host_port(address) {
            return Endpoint::Network {
                addr: address.to_string(),
            };
        }
        Endpoint::Serial {
            path: PathBuf::from(address),
            baud,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Endpoint::Simulated)
    }

    /// Open a channel to this endpoint. `None` for the simulated endpoint.
    pub fn open(&self) -> Result<Option<Box<dyn Transport>>> {
        match self {
            Endpoint::Simulated => Ok(None),
            Endpoint::Serial { path, baud } => Ok(Some(Box::new(SerialPort::open_writer(path, *baud)?))),
            Endpoint::Network { addr } => Ok(Some(Box::new(NetworkPrinter::connect(addr)?))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Simulated => f.write_str(SIMULATED),
            Endpoint::Serial { path, baud } => write!(f, "{}@{}", path.display(), baud),
            Endpoint::Network { addr } => write!(f, "tcp://{}", addr),
        }
    }
}

/// `host:port` with a numeric port and no path separators.
fn looks_like_host_port(address: &str) -> bool {
    if address.contains('/') || address.contains('\\') {
        return false;
    }
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

/// # Send a Payload
///
/// Opens the endpoint, writes the full payload, flushes, and releases the
/// channel on every exit path. Returns the number of bytes handed to the
/// device (the payload length; 0 for the simulated endpoint).
///
/// ## Errors
///
/// - `DeviceUnavailable` if the channel cannot be opened
/// - `WriteFailed` on a partial or failed write
#[instrument(skip(payload), fields(endpoint = %endpoint, bytes = payload.len()))]
pub fn send(endpoint: &Endpoint, payload: &[u8]) -> Result<usize> {
    let Some(mut channel) = endpoint.open()? else {
        info!("Simulated printer, payload discarded");
        return Ok(0);
    };

    channel.send(payload)?;
    info!("Payload sent");
    Ok(payload.len())
}

/// Write a label artifact, creating parent directories.
pub fn write_file<P: AsRef<Path>>(path: P, payload: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, payload)
        .map_err(|e| LabelerError::WriteFailed(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), bytes = payload.len(), "Wrote label file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulated() {
        assert_eq!(Endpoint::parse("Simulate", 9600), Endpoint::Simulated);
        assert_eq!(Endpoint::parse("simulate", 9600), Endpoint::Simulated);
        assert_eq!(Endpoint::parse("", 9600), Endpoint::Simulated);
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(
            Endpoint::parse("tcp://10.0.0.5:9100", 9600),
            Endpoint::Network {
                addr: "10.0.0.5:9100".to_string()
            }
        );
        assert_eq!(
            Endpoint::parse("printer.local:9100", 9600),
            Endpoint::Network {
                addr: "printer.local:9100".to_string()
            }
        );
    }

    #[test]
    fn test_parse_serial() {
        assert_eq!(
            Endpoint::parse("/dev/ttyUSB0", 38400),
            Endpoint::Serial {
                path: PathBuf::from("/dev/ttyUSB0"),
                baud: 38400
            }
        );
        assert_eq!(
            Endpoint::parse("COM3", 9600),
            Endpoint::Serial {
                path: PathBuf::from("COM3"),
                baud: 9600
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Endpoint::Simulated.to_string(), "Simulate");
        assert_eq!(Endpoint::parse("/dev/ttyS0", 9600).to_string(), "/dev/ttyS0@9600");
    }

    #[test]
    fn test_send_simulated_never_opens() {
        assert_eq!(send(&Endpoint::Simulated, b"N\nP1").unwrap(), 0);
    }

    #[test]
    fn test_send_missing_device() {
        let endpoint = Endpoint::parse("/dev/no-such-label-printer", 9600);
        let err = send(&endpoint, b"N\nP1").unwrap_err();
        assert!(matches!(err, LabelerError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("label.pdf");
        write_file(&path, b"%PDF-1.4").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
