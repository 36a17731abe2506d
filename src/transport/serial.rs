//! # Serial TTY Transport
//!
//! Talks to scales and label printers over an RS-232/USB serial TTY (or a
//! Bluetooth RFCOMM device bound to `/dev/rfcommN`).
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so bytes pass through unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXOFF, IXANY off
//! - **No output processing**: OPOST off (no CR/LF translation)
//! - **8N1**: CS8, no parity, CLOCAL | CREAD
//! - **Non-canonical**: ICANON, ECHO, ISIG off
//! - **Speed**: input and output baud set from the endpoint's rate
//!
//! Reads use `VMIN = 0` / `VTIME = timeout` so a silent scale returns an
//! empty read instead of blocking forever.
//!
//! ## Chunked Writes
//!
//! Large payloads are written in 4096-byte chunks with a short delay between
//! chunks so slow printers are not overrun.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::error::{LabelerError, Result};

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Device name prefixes offered by [`enumerate_ports`].
const PORT_PREFIXES: &[&str] = &["ttyUSB", "ttyACM", "ttyS", "rfcomm", "cu.usb"];

/// An open serial device.
///
/// Dropping the port closes the file descriptor.
#[derive(Debug)]
pub struct SerialPort {
    file: File,
    path: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialPort {
    /// Open a device for writing only (printers).
    ///
    /// ## Errors
    ///
    /// `DeviceUnavailable` if the device doesn't exist, permission is denied
    /// (may need the dialout group), the baud rate is unsupported, or TTY
    /// configuration fails.
    pub fn open_writer<P: AsRef<Path>>(device: P, baud: u32) -> Result<Self> {
        Self::open_with(device.as_ref(), baud, false, None)
    }

    /// Open a device for reading and writing (scales).
    ///
    /// `read_timeout` bounds each read; it is rounded to tenths of a second
    /// and capped at 25.5 s by the TTY layer.
    pub fn open_duplex<P: AsRef<Path>>(device: P, baud: u32, read_timeout: Duration) -> Result<Self> {
        Self::open_with(device.as_ref(), baud, true, Some(read_timeout))
    }

    fn open_with(path: &Path, baud: u32, read: bool, read_timeout: Option<Duration>) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true).read(read);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOCTTY);
        }

        let file = options.open(path).map_err(|e| {
            LabelerError::DeviceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

        configure_tty(&file, baud, read_timeout)?;
        debug!(device = %path.display(), baud, "Opened serial device");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Set the chunk size for large writes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }
}

impl Transport for SerialPort {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if data.len() <= self.chunk_size {
            self.file
                .write_all(data)
                .map_err(|e| LabelerError::WriteFailed(format!("{}: {}", self.path.display(), e)))?;
        } else {
            for chunk in data.chunks(self.chunk_size) {
                self.file.write_all(chunk).map_err(|e| {
                    LabelerError::WriteFailed(format!("{}: {}", self.path.display(), e))
                })?;

                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }

        self.file
            .flush()
            .map_err(|e| LabelerError::WriteFailed(format!("Flush failed: {}", e)))
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Candidate serial device paths, sorted.
///
/// Scans `/dev` for USB, ACM, on-board and RFCOMM TTYs. Returns an empty list
/// when `/dev` cannot be read.
pub fn enumerate_ports() -> Vec<String> {
    let entries = match fs::read_dir("/dev") {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut ports: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| PORT_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
        .map(|name| format!("/dev/{}", name))
        .collect();
    ports.sort();
    ports
}

/// Map a numeric baud rate to its termios speed constant.
#[cfg(unix)]
fn speed_for(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    };
    Some(speed)
}

/// Parse a baud rate argument, rejecting rates the TTY layer cannot set.
pub fn parse_baud(s: &str) -> std::result::Result<u32, String> {
    let baud: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a baud rate", s))?;
    if is_supported_baud(baud) {
        Ok(baud)
    } else {
        Err(format!("Unsupported baud rate {}", baud))
    }
}

/// Whether `baud` is one of the rates the TTY layer accepts.
pub fn is_supported_baud(baud: u32) -> bool {
    #[cfg(unix)]
    {
        speed_for(baud).is_some()
    }
    #[cfg(not(unix))]
    {
        baud > 0
    }
}

/// Configure a TTY for raw 8N1 at `baud`.
///
/// Character devices only: regular files and FIFOs (used when capturing
/// output) are left untouched.
#[cfg(unix)]
fn configure_tty(file: &File, baud: u32, read_timeout: Option<Duration>) -> Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::io::AsRawFd;

    let is_tty = file
        .metadata()
        .map(|m| m.file_type().is_char_device())
        .unwrap_or(false);
    if !is_tty {
        return Ok(());
    }

    let speed = speed_for(baud)
        .ok_or_else(|| LabelerError::DeviceUnavailable(format!("Unsupported baud rate {}", baud)))?;
    let fd = file.as_raw_fd();

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(LabelerError::DeviceUnavailable(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: disable all processing, including XON/XOFF flow control
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    termios.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;

    match read_timeout {
        Some(timeout) => {
            let tenths = (timeout.as_millis() / 100).clamp(1, 255) as libc::cc_t;
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = tenths;
        }
        None => {
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;
        }
    }

    let speed_ok = unsafe {
        libc::cfsetispeed(&mut termios, speed) == 0 && libc::cfsetospeed(&mut termios, speed) == 0
    };
    if !speed_ok {
        return Err(LabelerError::DeviceUnavailable(format!(
            "cfsetspeed({}) failed: {}",
            baud,
            io::Error::last_os_error()
        )));
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(LabelerError::DeviceUnavailable(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty(_file: &File, _baud: u32, _read_timeout: Option<Duration>) -> Result<()> {
    // On non-Unix platforms the driver keeps its own line settings
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_baud_rates() {
        for baud in [9600, 19200, 38400, 57600, 115200] {
            assert!(is_supported_baud(baud), "{}", baud);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unsupported_baud_rate() {
        assert!(!is_supported_baud(12345));
    }

    #[test]
    fn test_parse_baud() {
        assert_eq!(parse_baud("9600"), Ok(9600));
        assert_eq!(parse_baud(" 38400 "), Ok(38400));
        assert!(parse_baud("fast").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_baud_rejects_unsupported() {
        assert_eq!(parse_baud("12345"), Err("Unsupported baud rate 12345".to_string()));
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialPort::open_writer("/dev/definitely-not-a-printer", 9600).unwrap_err();
        assert!(matches!(err, LabelerError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_write_to_regular_file_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.prn");
        fs::write(&path, b"").unwrap();

        let mut port = SerialPort::open_writer(&path, 9600).unwrap();
        port.set_chunk_size(3);
        port.set_chunk_delay(Duration::ZERO);
        port.send(b"N\nP1\n").unwrap();
        drop(port);

        assert_eq!(fs::read(&path).unwrap(), b"N\nP1\n");
    }

    #[test]
    fn test_enumerate_ports_are_sorted_dev_paths() {
        let ports = enumerate_ports();
        assert!(ports.iter().all(|p| p.starts_with("/dev/")));
        let mut sorted = ports.clone();
        sorted.sort();
        assert_eq!(ports, sorted);
    }
}
