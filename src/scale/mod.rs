//! # Weight Source
//!
//! Produces weight samples from a scale (or a simulator) on a background
//! thread and turns the debounced ones into print triggers.
//!
//! ## Modes
//!
//! | Device | Behaviour |
//! |--------|-----------|
//! | `Simulate` | one random reading in `[0.5, 8.0]` lb every `simulate_interval` |
//! | serial / TCP | read lines, extract the first `d+.d+` token |
//!
//! ## Threading
//!
//! ```text
//! WeightSource::start()
//!     └── worker thread ──► parse ──► Debouncer ──► callback(sample)
//!                 ▲
//! WeightSource::stop() sets the stop flag, waits up to 500 ms
//! ```
//!
//! The callback runs on the worker thread. A panicking callback is logged and
//! the loop keeps sampling. Bytes are buffered until a full line arrives, so
//! a line split across a read timeout is still parsed. A TCP scale that hangs
//! up is reopened every [`RECONNECT_BACKOFF`] until it answers or the source
//! is stopped.

pub mod debounce;
pub mod link;
pub mod parse;

use std::io::{BufRead, ErrorKind};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::Endpoint;

pub use debounce::Debouncer;
pub use link::{ScaleLink, SerialLink, TcpLink};
pub use parse::parse_weight;

/// Interval between simulated readings.
pub const DEFAULT_SIMULATE_INTERVAL: Duration = Duration::from_secs(5);

/// How long a single device read may block.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Bound on waiting for the worker in [`WeightSource::stop`].
pub const JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Wait between attempts to reopen a link that hung up.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(500);

/// Simulated readings fall in this range (lb).
pub const SIMULATED_RANGE: std::ops::RangeInclusive<f64> = 0.5..=8.0;

/// Sleeps are cut into slices so a stop request is seen promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Back-off after an empty device read.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// A pending line longer than this without a newline is discarded.
const MAX_LINE: usize = 4096;

/// One accepted reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    /// Gross weight in pounds
    pub value: f64,
    pub at: Instant,
}

/// Sink for debounced samples.
pub type SampleCallback = Arc<dyn Fn(WeightSample) + Send + Sync>;

/// Timing knobs for a [`WeightSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSettings {
    pub debounce: Duration,
    pub simulate_interval: Duration,
    pub read_timeout: Duration,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            debounce: debounce::DEFAULT_WINDOW,
            simulate_interval: DEFAULT_SIMULATE_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

#[derive(Clone)]
enum Mode {
    Simulated,
    Device(Arc<dyn ScaleLink>),
}

struct Worker {
    stop: Arc<AtomicBool>,
    /// Disconnects when the worker thread returns.
    done: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Background weight sampler with debouncing.
pub struct WeightSource {
    mode: Mode,
    settings: ScaleSettings,
    debouncer: Arc<Mutex<Debouncer>>,
    callback: Option<SampleCallback>,
    worker: Option<Worker>,
}

impl WeightSource {
    /// Build a source for a parsed device address.
    pub fn new(endpoint: &Endpoint, settings: ScaleSettings) -> Self {
        let mode = match endpoint {
            Endpoint::Simulated => Mode::Simulated,
            Endpoint::Serial { path, baud } => Mode::Device(Arc::new(SerialLink::new(path.clone(), *baud))),
            Endpoint::Network { addr } => Mode::Device(Arc::new(TcpLink::new(addr.clone()))),
        };
        Self::with_mode(mode, settings)
    }

    pub fn simulated(settings: ScaleSettings) -> Self {
        Self::with_mode(Mode::Simulated, settings)
    }

    /// Build a source over any line channel.
    pub fn with_link(link: Arc<dyn ScaleLink>, settings: ScaleSettings) -> Self {
        Self::with_mode(Mode::Device(link), settings)
    }

    fn with_mode(mode: Mode, settings: ScaleSettings) -> Self {
        Self {
            mode,
            settings,
            debouncer: Arc::new(Mutex::new(Debouncer::new(settings.debounce))),
            callback: None,
            worker: None,
        }
    }

    /// Register the trigger callback. Takes effect on the next [`start`](Self::start).
    pub fn on_sample<F>(&mut self, callback: F)
    where
        F: Fn(WeightSample) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.mode, Mode::Simulated)
    }

    pub fn describe(&self) -> String {
        match &self.mode {
            Mode::Simulated => crate::transport::SIMULATED.to_string(),
            Mode::Device(link) => link.describe(),
        }
    }

    /// Whether a worker is currently sampling.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    /// Time of the last accepted trigger.
    pub fn last_trigger(&self) -> Option<Instant> {
        lock(&self.debouncer).last_accepted()
    }

    /// # Start Sampling
    ///
    /// Spawns the worker. Calling this while a worker is running does
    /// nothing.
    ///
    /// ## Errors
    ///
    /// `Io` if the OS refuses to spawn a thread.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            debug!("Weight source already running");
            return Ok(());
        }
        // A previous worker that exited on its own is reaped here
        self.stop();

        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = mpsc::channel::<()>();
        let ctx = LoopContext {
            settings: self.settings,
            debouncer: Arc::clone(&self.debouncer),
            callback: self.callback.clone(),
            stop: Arc::clone(&stop),
        };
        let mode = self.mode.clone();

        let handle = thread::Builder::new().name("weight-source".into()).spawn(move || {
            let _done = done_tx;
            match mode {
                Mode::Simulated => simulate_loop(&ctx),
                Mode::Device(link) => device_loop(&ctx, link.as_ref()),
            }
        })?;

        info!(device = %self.describe(), "Weight source started");
        self.worker = Some(Worker { stop, done, handle });
        Ok(())
    }

    /// # Stop Sampling
    ///
    /// Signals the worker and waits at most [`JOIN_TIMEOUT`] for it. A worker
    /// stuck in a device read past that bound is detached; its own stop flag
    /// keeps it from interfering with a later [`start`](Self::start).
    /// Idempotent.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::SeqCst);

        match worker.done.recv_timeout(JOIN_TIMEOUT) {
            Err(RecvTimeoutError::Disconnected) | Ok(()) => {
                if worker.handle.join().is_err() {
                    warn!("Weight source worker panicked");
                }
                info!("Weight source stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = JOIN_TIMEOUT.as_millis() as u64, "Weight source did not stop in time, detaching");
            }
        }
    }

    /// # Read Once
    ///
    /// Take a single reading without touching the debouncer or the
    /// callback. Any failure is logged and reported as `0.0`.
    pub fn read_once(&self, timeout: Duration) -> f64 {
        match &self.mode {
            Mode::Simulated => simulated_reading(),
            Mode::Device(link) => match read_line_from(link.as_ref(), timeout) {
                Ok(value) => value,
                Err(e) => {
                    warn!(device = %link.describe(), error = %e, "Manual weight read failed");
                    0.0
                }
            },
        }
    }
}

impl Drop for WeightSource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WeightSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightSource")
            .field("device", &self.describe())
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .finish()
    }
}

// ============================================================================
// WORKER LOOPS
// ============================================================================

struct LoopContext {
    settings: ScaleSettings,
    debouncer: Arc<Mutex<Debouncer>>,
    callback: Option<SampleCallback>,
    stop: Arc<AtomicBool>,
}

impl LoopContext {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleep for `total`, returning false if stop was requested meanwhile.
    fn sleep(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.stopped() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }

    fn deliver(&self, value: f64) {
        // A detached worker may still finish a read after stop()
        if self.stopped() {
            debug!(value, "Source stopped, reading dropped");
            return;
        }
        let now = Instant::now();
        if !lock(&self.debouncer).accept(now) {
            debug!(value, "Trigger debounced");
            return;
        }

        debug!(value, "Trigger accepted");
        let Some(callback) = &self.callback else {
            return;
        };
        let sample = WeightSample { value, at: now };
        if catch_unwind(AssertUnwindSafe(|| callback(sample))).is_err() {
            warn!(value, "Sample callback panicked, continuing");
        }
    }
}

fn simulate_loop(ctx: &LoopContext) {
    while ctx.sleep(ctx.settings.simulate_interval) {
        ctx.deliver(simulated_reading());
    }
}

fn device_loop(ctx: &LoopContext, link: &dyn ScaleLink) {
    let mut reader = match link.open(ctx.settings.read_timeout) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(device = %link.describe(), error = %e, "Cannot open scale, sampling stopped");
            return;
        }
    };

    while read_lines(ctx, link, reader.as_mut()) {
        warn!(device = %link.describe(), "Scale closed the connection, reconnecting");
        match reopen(ctx, link) {
            Some(fresh) => reader = fresh,
            None => return,
        }
    }
}

/// Feed complete lines to the context until stop is requested (`false`) or
/// the link hangs up (`true`).
fn read_lines(ctx: &LoopContext, link: &dyn ScaleLink, reader: &mut dyn BufRead) -> bool {
    let mut raw = Vec::new();
    while !ctx.stopped() {
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) if link.hangs_up() => {
                if !raw.is_empty() {
                    handle_line(ctx, &raw);
                }
                return true;
            }
            Ok(0) => {
                ctx.sleep(IDLE_BACKOFF);
            }
            Ok(_) if raw.ends_with(b"\n") => {
                handle_line(ctx, &raw);
                raw.clear();
            }
            // Partial line before a timeout; keep it for the next read
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                ctx.sleep(IDLE_BACKOFF);
            }
            Err(e) if link.hangs_up() => {
                warn!(device = %link.describe(), error = %e, "Scale connection lost");
                return true;
            }
            Err(e) => {
                warn!(device = %link.describe(), error = %e, "Scale read error");
                ctx.sleep(IDLE_BACKOFF);
            }
        }

        if raw.len() > MAX_LINE {
            debug!(bytes = raw.len(), "Discarding overlong scale line");
            raw.clear();
        }
    }
    false
}

fn handle_line(ctx: &LoopContext, raw: &[u8]) {
    match parse_weight(&parse::decode_line(raw)) {
        Ok(value) => ctx.deliver(value),
        Err(e) => debug!(error = %e, "Ignoring scale line"),
    }
}

/// Retry opening `link` until it succeeds or stop is requested.
fn reopen(ctx: &LoopContext, link: &dyn ScaleLink) -> Option<Box<dyn BufRead + Send>> {
    while ctx.sleep(RECONNECT_BACKOFF) {
        match link.open(ctx.settings.read_timeout) {
            Ok(reader) => {
                info!(device = %link.describe(), "Scale reconnected");
                return Some(reader);
            }
            Err(e) => debug!(device = %link.describe(), error = %e, "Scale reconnect failed"),
        }
    }
    None
}

fn read_line_from(link: &dyn ScaleLink, timeout: Duration) -> Result<f64> {
    let mut reader = link.open(timeout)?;
    let mut raw = Vec::new();
    reader.read_until(b'\n', &mut raw)?;
    parse_weight(&parse::decode_line(&raw))
}

/// Random reading rounded to 3 decimals.
fn simulated_reading() -> f64 {
    let value: f64 = rand::rng().random_range(SIMULATED_RANGE);
    (value * 1000.0).round() / 1000.0
}

fn lock(debouncer: &Mutex<Debouncer>) -> MutexGuard<'_, Debouncer> {
    debouncer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
