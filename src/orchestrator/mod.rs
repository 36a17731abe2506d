//! # Orchestrator
//!
//! Wires the scale, the content builder, the renderers and the transport
//! into print cycles.
//!
//! ## Cycle
//!
//! ```text
//! gross weight
//!     └── build content (selected product, free text)
//!           └── load selected template
//!                 └── render per template mode
//!                       ├── document ──► output_dir/label_%Y%m%d_%H%M%S.pdf
//!                       └── commands ──► printer endpoint
//! ```
//!
//! Manual actions ([`print`](Orchestrator::print)) and scale triggers go
//! through the same cycle. Scale triggers arrive as [`Event`]s on an
//! unbounded channel and are handled on the orchestrator's own task; the
//! sampling thread never touches the selection. During a triggered cycle the
//! printer send runs on a blocking worker under a timeout, and any failure
//! becomes a [`Status`] instead of an error.

pub mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::catalog::{ProductCatalog, parse_selection};
use crate::config::LabelerConfig;
use crate::content::{FreeText, LabelContent, build_content};
use crate::error::{LabelerError, Result};
use crate::render::{self, Emission, Renderer, VectorRenderer};
use crate::scale::{WeightSample, WeightSource};
use crate::template::{LayoutTemplate, TemplateLoader};
use crate::transport;

pub use status::{SkipReason, Status};

/// File name of the preview artifact.
pub const PREVIEW_FILE: &str = "preview_label.pdf";

/// Input to the orchestrator's event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A debounced scale trigger
    Weighed(WeightSample),
    Shutdown,
}

/// What the operator has chosen for the next label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub product: Option<String>,
    pub template: Option<String>,
    pub text: FreeText,
    /// Last gross weight printed or read
    pub last_gross: Option<f64>,
}

/// Result of a print cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    /// PDF written for this label, if the template produces one
    pub artifact: Option<PathBuf>,
    /// Bytes handed to the printer (0 when simulated or none)
    pub bytes_sent: usize,
}

pub struct Orchestrator {
    config: LabelerConfig,
    catalog: Arc<dyn ProductCatalog>,
    loader: TemplateLoader,
    scale: WeightSource,
    selection: Selection,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: Option<mpsc::UnboundedReceiver<Event>>,
    status: watch::Sender<Status>,
}

impl Orchestrator {
    pub fn new(config: LabelerConfig, catalog: Arc<dyn ProductCatalog>) -> Self {
        let scale = WeightSource::new(&config.scale.endpoint, config.scale.settings);
        let loader = TemplateLoader::new(config.templates_dir.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(Status::Idle);

        Self {
            config,
            catalog,
            loader,
            scale,
            selection: Selection::default(),
            events_tx,
            events_rx: Some(events_rx),
            status,
        }
    }

    /// Replace the weight source built from the configuration.
    pub fn with_weight_source(mut self, scale: WeightSource) -> Self {
        self.scale = scale;
        self
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Select a product by code or by its selection-list line.
    pub fn select_product(&mut self, line: &str) {
        self.selection.product = parse_selection(line).map(str::to_string);
    }

    pub fn select_template(&mut self, name: impl Into<String>) {
        self.selection.template = Some(name.into());
    }

    pub fn set_free_text(&mut self, text: FreeText) {
        self.selection.text = text;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Watch station status.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// Sender for posting events (e.g. [`Event::Shutdown`]) to [`run`](Self::run).
    pub fn events(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    // ========================================================================
    // MANUAL ACTIONS
    // ========================================================================

    /// # Print
    ///
    /// Full emission for the selected template at `gross` pounds. Blocks on
    /// the printer.
    ///
    /// ## Errors
    ///
    /// - `MissingSelection` / `ProductNotFound` / `MissingTemplate`
    /// - `Template` for a malformed template file
    /// - `WriteFailed` / `Io` if the PDF cannot be saved
    /// - `DeviceUnavailable` / `WriteFailed` from the printer
    pub fn print(&mut self, gross: f64) -> Result<PrintOutcome> {
        self.selection.last_gross = Some(gross);
        let emission = self.prepare(gross)?;
        let artifact = self.save_document(&emission)?;

        let bytes_sent = match &emission.commands {
            Some(payload) => transport::send(&self.config.printer.endpoint, payload)?,
            None => 0,
        };

        info!(gross, artifact = ?artifact, bytes_sent, "Label printed");
        Ok(PrintOutcome { artifact, bytes_sent })
    }

    /// # Preview
    ///
    /// Render only the PDF and write it to `preview_label.pdf` in the output
    /// directory.
    ///
    /// ## Errors
    ///
    /// As [`print`](Self::print), plus `Template` for placeholder templates,
    /// which have no vector form.
    pub fn preview(&mut self, gross: f64) -> Result<PathBuf> {
        self.selection.last_gross = Some(gross);
        let (content, template) = self.content_and_template(gross)?;

        let template = match template {
            LayoutTemplate::Vector(t) => t,
            LayoutTemplate::Placeholder(t) => {
                return Err(LabelerError::Template(format!(
                    "{}: preview is not available for placeholder templates",
                    t.name
                )));
            }
        };

        let pdf = VectorRenderer::new().render(&template, &content)?;
        let path = self.config.output_dir.join(PREVIEW_FILE);
        transport::write_file(&path, &pdf)?;
        Ok(path)
    }

    /// Take one reading from the scale. Device errors read as `0.0`.
    pub fn read_weight(&mut self) -> f64 {
        let gross = self.scale.read_once(self.config.scale.settings.read_timeout);
        self.selection.last_gross = Some(gross);
        gross
    }

    // ========================================================================
    // SCALE-TRIGGERED CYCLES
    // ========================================================================

    /// Start the weight source, forwarding its triggers to [`run`](Self::run).
    pub fn start_listening(&mut self) -> Result<()> {
        let events = self.events_tx.clone();
        self.scale.on_sample(move |sample| {
            if events.send(Event::Weighed(sample)).is_err() {
                debug!("Orchestrator gone, trigger dropped");
            }
        });
        self.scale.start()?;

        self.status.send_replace(Status::Listening {
            device: self.scale.describe(),
        });
        Ok(())
    }

    pub fn stop_listening(&mut self) {
        self.scale.stop();
        self.status.send_replace(Status::Idle);
    }

    pub fn is_listening(&self) -> bool {
        self.scale.is_running()
    }

    /// # Event Loop
    ///
    /// Handle events until [`Event::Shutdown`], then stop listening.
    pub async fn run(&mut self) {
        let Some(mut events) = self.events_rx.take() else {
            warn!("Event loop already running");
            return;
        };

        while let Some(event) = events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }

        self.stop_listening();
        self.events_rx = Some(events);
    }

    /// Handle one event. Returns `false` on shutdown.
    pub async fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Weighed(sample) => {
                let status = self.auto_cycle(sample).await;
                info!(status = %status, "Scale-triggered cycle finished");
                self.status.send_replace(status);
                true
            }
            Event::Shutdown => false,
        }
    }

    async fn auto_cycle(&mut self, sample: WeightSample) -> Status {
        let gross = sample.value;
        self.selection.last_gross = Some(gross);

        match self.auto_print(gross).await {
            Ok(outcome) => Status::AutoPrinted {
                weight: gross,
                artifact: outcome.artifact,
                bytes_sent: outcome.bytes_sent,
            },
            Err(LabelerError::MissingSelection | LabelerError::ProductNotFound(_)) => {
                Status::AutoSkipped(SkipReason::NoProduct)
            }
            Err(LabelerError::MissingTemplate(_)) => Status::AutoSkipped(SkipReason::NoTemplate),
            Err(e) => {
                warn!(gross, error = %e, "Scale-triggered print failed");
                Status::AutoFailed(e.to_string())
            }
        }
    }

    async fn auto_print(&self, gross: f64) -> Result<PrintOutcome> {
        let emission = self.prepare(gross)?;
        let artifact = self.save_document(&emission)?;

        let bytes_sent = match emission.commands {
            Some(payload) => self.send_bounded(payload).await?,
            None => 0,
        };
        Ok(PrintOutcome { artifact, bytes_sent })
    }

    /// Send on a blocking worker, giving up after the configured timeout.
    /// A send that times out keeps running on its worker until the device
    /// returns.
    async fn send_bounded(&self, payload: Vec<u8>) -> Result<usize> {
        let endpoint = self.config.printer.endpoint.clone();
        let limit: Duration = self.config.auto_send_timeout;

        let task = tokio::task::spawn_blocking(move || transport::send(&endpoint, &payload));
        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(LabelerError::WriteFailed(format!("Task error: {}", e))),
            Err(_) => Err(LabelerError::Timeout(format!(
                "printer did not accept the label within {} ms",
                limit.as_millis()
            ))),
        }
    }

    // ========================================================================
    // SHARED CYCLE STEPS
    // ========================================================================

    fn content_and_template(&self, gross: f64) -> Result<(LabelContent, LayoutTemplate)> {
        let content = build_content(
            self.catalog.as_ref(),
            self.selection.product.as_deref(),
            gross,
            &self.selection.text,
        )?;

        let name = self
            .selection
            .template
            .as_deref()
            .ok_or_else(|| LabelerError::MissingTemplate("no template selected".into()))?;
        let template = self.loader.load(name)?;
        Ok((content, template))
    }

    fn prepare(&self, gross: f64) -> Result<Emission> {
        let (content, template) = self.content_and_template(gross)?;
        debug!(product = %content.product_name, template = %template.name(), upc = %content.upc, "Rendering label");
        render::emit(&template, &content, &self.config.printer.profile)
    }

    fn save_document(&self, emission: &Emission) -> Result<Option<PathBuf>> {
        let Some(pdf) = &emission.document else {
            return Ok(None);
        };
        let name = chrono::Local::now().format("label_%Y%m%d_%H%M%S.pdf").to_string();
        let path = self.config.output_dir.join(name);
        transport::write_file(&path, pdf)?;
        Ok(Some(path))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("scale", &self.scale)
            .field("selection", &self.selection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::scale::ScaleSettings;
    use crate::template::Template;
    use std::fs;
    use std::time::Instant;

    struct Station {
        _dir: tempfile::TempDir,
        orch: Orchestrator,
    }

    fn station() -> Station {
        let dir = tempfile::tempdir().unwrap();
        let config = LabelerConfig::default()
            .with_templates_dir(dir.path().join("templates"))
            .with_output_dir(dir.path().join("out"));
        let loader = TemplateLoader::new(&config.templates_dir);
        loader.ensure_default().unwrap();
        fs::write(config.templates_dir.join("deli.prn"), "A1,1,0,3,1,1,N,\"{total_price}\"\nP1\n").unwrap();

        let mut orch = Orchestrator::new(config, Arc::new(InMemoryCatalog::with_sample()));
        orch.select_product("12345 - Chicken Breast ($2.99/lb, tare 0.050, PLU 12345)");
        orch.select_template("default_2x2.json");
        orch.set_free_text(FreeText::new("2026-10-25", "L-7"));
        Station { _dir: dir, orch }
    }

    fn sample(value: f64) -> WeightSample {
        WeightSample {
            value,
            at: Instant::now(),
        }
    }

    #[test]
    fn test_print_writes_artifact() {
        let mut s = station();
        let outcome = s.orch.print(5.0).unwrap();

        let path = outcome.artifact.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("label_") && name.ends_with(".pdf"));
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF-1.4"));
        // Simulated printer
        assert_eq!(outcome.bytes_sent, 0);
        assert_eq!(s.orch.selection().last_gross, Some(5.0));
    }

    #[test]
    fn test_print_placeholder_has_no_artifact() {
        let mut s = station();
        s.orch.select_template("deli");
        let outcome = s.orch.print(5.0).unwrap();
        assert_eq!(outcome.artifact, None);
    }

    #[test]
    fn test_preview() {
        let mut s = station();
        let path = s.orch.preview(5.0).unwrap();
        assert_eq!(path.file_name().unwrap(), PREVIEW_FILE);
        let pdf = String::from_utf8_lossy(&fs::read(&path).unwrap()).into_owned();
        assert!(pdf.contains("(Total: $14.80) Tj"));

        s.orch.select_template("deli.prn");
        assert!(matches!(s.orch.preview(5.0), Err(LabelerError::Template(_))));
    }

    #[test]
    fn test_print_errors() {
        let mut s = station();
        s.orch.select_product("99999");
        assert!(matches!(s.orch.print(1.0), Err(LabelerError::ProductNotFound(_))));

        s.orch.select_product("");
        assert!(matches!(s.orch.print(1.0), Err(LabelerError::MissingSelection)));

        s.orch.select_product("12345");
        s.orch.select_template("nope");
        assert!(matches!(s.orch.print(1.0), Err(LabelerError::MissingTemplate(_))));
    }

    #[test]
    fn test_read_weight_simulated() {
        let mut s = station();
        let w = s.orch.read_weight();
        assert!((0.5..=8.0).contains(&w));
        assert_eq!(s.orch.selection().last_gross, Some(w));
    }

    #[tokio::test]
    async fn test_triggered_cycle_prints() {
        let mut s = station();
        assert!(s.orch.handle(Event::Weighed(sample(5.0))).await);

        let status = s.orch.subscribe().borrow().clone();
        let Status::AutoPrinted { weight, artifact, .. } = status else {
            panic!("unexpected status {:?}", status);
        };
        assert_eq!(weight, 5.0);
        assert!(artifact.unwrap().exists());
    }

    #[tokio::test]
    async fn test_triggered_cycle_skips() {
        let mut s = station();
        s.orch.select_product("");
        s.orch.handle(Event::Weighed(sample(2.0))).await;
        assert_eq!(*s.orch.subscribe().borrow(), Status::AutoSkipped(SkipReason::NoProduct));

        s.orch.select_product("12345");
        s.orch.selection.template = None;
        s.orch.handle(Event::Weighed(sample(2.0))).await;
        assert_eq!(*s.orch.subscribe().borrow(), Status::AutoSkipped(SkipReason::NoTemplate));
    }

    #[tokio::test]
    async fn test_triggered_failure_keeps_listening() {
        let mut s = station();
        // Nothing listens on a port we just released
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        s.orch.config.printer.endpoint = transport::Endpoint::parse(&format!("127.0.0.1:{}", port), 0);
        s.orch.scale = WeightSource::simulated(ScaleSettings {
            simulate_interval: Duration::from_secs(3600),
            ..ScaleSettings::default()
        });

        s.orch.start_listening().unwrap();
        for _ in 0..2 {
            assert!(s.orch.handle(Event::Weighed(sample(3.0))).await);
            let status = s.orch.subscribe().borrow().clone();
            assert!(matches!(status, Status::AutoFailed(ref e) if e.contains("Device unavailable")));
            assert!(s.orch.is_listening());
        }
        s.orch.stop_listening();
        assert!(!s.orch.is_listening());
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let mut s = station();
        let events = s.orch.events();
        events.send(Event::Weighed(sample(5.0))).unwrap();
        events.send(Event::Shutdown).unwrap();

        tokio::time::timeout(Duration::from_secs(5), s.orch.run()).await.unwrap();
        assert_eq!(*s.orch.subscribe().borrow(), Status::Idle);
        assert_eq!(s.orch.selection().last_gross, Some(5.0));
    }

    #[test]
    fn test_default_template_available() {
        let s = station();
        assert!(s.orch.loader().list().unwrap().contains(&"default_2x2.json".to_string()));
        assert_eq!(
            s.orch.loader().load("default_2x2").unwrap().as_vector().unwrap().fields,
            Template::default_2x2().fields
        );
    }
}
