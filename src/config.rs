//! Runtime configuration.
//!
//! The binary fills a [`LabelerConfig`] from command-line flags and hands it
//! to the [`TemplateLoader`](crate::template::TemplateLoader) and the
//! [`Orchestrator`](crate::orchestrator::Orchestrator). Nothing reads global
//! state.

use std::path::PathBuf;
use std::time::Duration;

use crate::printer::PrinterProfile;
use crate::scale::ScaleSettings;
use crate::transport::Endpoint;

/// Scale rate most bench scales ship with.
pub const DEFAULT_SCALE_BAUD: u32 = 9600;

/// Bound on printer transport during scale-triggered cycles.
pub const DEFAULT_AUTO_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Where weights come from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    pub endpoint: Endpoint,
    pub settings: ScaleSettings,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Simulated,
            settings: ScaleSettings::default(),
        }
    }
}

/// Where labels go.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterConfig {
    pub endpoint: Endpoint,
    pub profile: PrinterProfile,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Simulated,
            profile: PrinterProfile::default(),
        }
    }
}

/// Station configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelerConfig {
    /// Directory holding `.json` and `.prn` templates
    pub templates_dir: PathBuf,
    /// Directory PDF artifacts are written to
    pub output_dir: PathBuf,
    /// Product catalog file; `None` uses the built-in sample
    pub products: Option<PathBuf>,
    pub scale: ScaleConfig,
    pub printer: PrinterConfig,
    pub auto_send_timeout: Duration,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("."),
            products: None,
            scale: ScaleConfig::default(),
            printer: PrinterConfig::default(),
            auto_send_timeout: DEFAULT_AUTO_SEND_TIMEOUT,
        }
    }
}

impl LabelerConfig {
    /// Point the scale at an address (`Simulate`, a TTY path, or `host:port`).
    pub fn with_scale(mut self, address: &str, baud: u32) -> Self {
        self.scale.endpoint = Endpoint::parse(address, baud);
        self
    }

    /// Point the printer at an address.
    pub fn with_printer(mut self, address: &str, baud: u32) -> Self {
        self.printer.endpoint = Endpoint::parse(address, baud);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::DEFAULT_PRINTER_BAUD;

    #[test]
    fn test_defaults() {
        let config = LabelerConfig::default();
        assert_eq!(config.templates_dir, PathBuf::from("templates"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.scale.endpoint.is_simulated());
        assert!(config.printer.endpoint.is_simulated());
        assert_eq!(config.printer.profile.dpi, 203);
        assert_eq!(config.scale.settings.debounce, Duration::from_millis(1200));
        assert_eq!(config.auto_send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builders() {
        let config = LabelerConfig::default()
            .with_scale("/dev/ttyUSB1", DEFAULT_SCALE_BAUD)
            .with_printer("10.0.0.9:9100", DEFAULT_PRINTER_BAUD);
        assert_eq!(config.scale.endpoint.to_string(), "/dev/ttyUSB1@9600");
        assert_eq!(config.printer.endpoint.to_string(), "tcp://10.0.0.9:9100");
    }
}
