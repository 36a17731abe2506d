//! Station status published on a watch channel.

use std::fmt;
use std::path::PathBuf;

/// Why a scale-triggered cycle printed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProduct,
    NoTemplate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoProduct => f.write_str("no product"),
            SkipReason::NoTemplate => f.write_str("no template"),
        }
    }
}

/// Latest station state.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Listening {
        device: String,
    },
    AutoPrinted {
        weight: f64,
        artifact: Option<PathBuf>,
        bytes_sent: usize,
    },
    AutoSkipped(SkipReason),
    AutoFailed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Idle"),
            Status::Listening { device } => write!(f, "Listening on {}", device),
            Status::AutoPrinted {
                weight,
                artifact,
                bytes_sent,
            } => {
                write!(f, "Auto printed {:.3} lb", weight)?;
                if let Some(path) = artifact {
                    write!(f, ", saved {}", path.display())?;
                }
                if *bytes_sent > 0 {
                    write!(f, ", sent {} bytes", bytes_sent)?;
                }
                Ok(())
            }
            Status::AutoSkipped(reason) => write!(f, "Auto skipped ({})", reason),
            Status::AutoFailed(error) => write!(f, "Auto failed: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Status::Idle.to_string(), "Idle");
        assert_eq!(
            Status::Listening {
                device: "Simulate".into()
            }
            .to_string(),
            "Listening on Simulate"
        );
        assert_eq!(Status::AutoSkipped(SkipReason::NoTemplate).to_string(), "Auto skipped (no template)");
        assert_eq!(
            Status::AutoPrinted {
                weight: 4.95,
                artifact: Some(PathBuf::from("label.pdf")),
                bytes_sent: 0
            }
            .to_string(),
            "Auto printed 4.950 lb, saved label.pdf"
        );
    }
}
