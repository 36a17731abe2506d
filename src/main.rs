//! # Scale Labeler CLI
//!
//! Command-line front end for a weigh-and-price label station.
//!
//! ## Usage
//!
//! ```bash
//! # Seed the default template and list what is available
//! scale-labeler templates
//!
//! # Render a label for 5 lb gross of product 12345 into label.pdf / label.prn
//! scale-labeler render --product 12345 --weight 5 --out label
//!
//! # Print using the real scale and a network printer
//! scale-labeler --scale-port /dev/ttyUSB0 --printer-port 10.0.0.9:9100 print --product 12345
//!
//! # Print automatically every time the scale settles
//! scale-labeler --scale-port /dev/ttyUSB0 listen --product 12345
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use scale_labeler::{
    LabelerError, Orchestrator, PrinterProfile,
    catalog::{InMemoryCatalog, ProductCatalog},
    config::{DEFAULT_SCALE_BAUD, LabelerConfig},
    content::{FreeText, LabelContent},
    logging,
    orchestrator::Event,
    printer::DEFAULT_PRINTER_BAUD,
    render,
    scale::SerialLink,
    template::TemplateLoader,
    transport::{self, Endpoint, serial},
};

const DEFAULT_TEST_PRINT: &str = "N\nq406\nQ406,24\nA20,20,0,2,1,1,N,\"TEST PRINT\"\nP1\n";

/// Scale Labeler - weigh, price and print labels
#[derive(Parser, Debug)]
#[command(name = "scale-labeler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding .json and .prn templates
    #[arg(long, global = true, default_value = "templates")]
    templates_dir: PathBuf,

    /// Directory label PDFs are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Product catalog (JSON array); the sample product is used when omitted
    #[arg(long, global = true, value_name = "FILE")]
    products: Option<PathBuf>,

    /// Scale device: Simulate, a TTY path, or host:port
    #[arg(long, global = true, default_value = "Simulate")]
    scale_port: String,

    #[arg(long, global = true, default_value_t = DEFAULT_SCALE_BAUD, value_parser = serial::parse_baud)]
    scale_baud: u32,

    /// Printer device: Simulate, a TTY path, or host:port
    #[arg(long, global = true, default_value = "Simulate")]
    printer_port: String,

    #[arg(long, global = true, default_value_t = DEFAULT_PRINTER_BAUD, value_parser = serial::parse_baud)]
    printer_baud: u32,

    /// Printer profile (desktop-203, desktop-300)
    #[arg(long, global = true, default_value = "desktop-203", value_parser = PrinterProfile::parse)]
    printer_profile: PrinterProfile,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Product, template and free text for one label.
#[derive(Args, Debug)]
struct LabelArgs {
    /// Product code (or a full product list line)
    #[arg(long, short)]
    product: String,

    /// Template file name or stem
    #[arg(long, short, default_value = "default_2x2")]
    template: String,

    /// Sell-by text (defaults to today)
    #[arg(long)]
    sell_by: Option<String>,

    #[arg(long, default_value = "")]
    lot: String,
}

impl LabelArgs {
    fn free_text(&self) -> FreeText {
        let sell_by = match &self.sell_by {
            Some(s) => s.clone(),
            None => FreeText::today().sell_by,
        };
        FreeText::new(sell_by, self.lot.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed the default template and list available templates
    Templates,

    /// List products in the catalog
    Products,

    /// List candidate serial ports
    Ports,

    /// Take one reading from the scale
    Read,

    /// Render a label to files without printing
    Render {
        #[command(flatten)]
        label: LabelArgs,

        /// Gross weight in pounds
        #[arg(long, short)]
        weight: f64,

        /// Output path stem; writes <stem>.pdf and/or <stem>.prn
        #[arg(long, default_value = "label")]
        out: PathBuf,
    },

    /// Write preview_label.pdf for a weight
    Preview {
        #[command(flatten)]
        label: LabelArgs,

        /// Gross weight in pounds (read from the scale when omitted)
        #[arg(long, short)]
        weight: Option<f64>,
    },

    /// Print one label
    Print {
        #[command(flatten)]
        label: LabelArgs,

        /// Gross weight in pounds (read from the scale when omitted)
        #[arg(long, short)]
        weight: Option<f64>,
    },

    /// Print a label each time the scale settles, until Ctrl-C
    Listen {
        #[command(flatten)]
        label: LabelArgs,

        /// Minimum time between triggers, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Simulated scale interval, in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Send a raw payload to the printer
    TestPrinter {
        /// Payload text (a minimal EPL test label by default)
        #[arg(long)]
        payload: Option<String>,
    },

    /// Poke the scale and show its first response line
    TestScale {
        #[arg(long, default_value = "2000")]
        timeout_ms: u64,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LabelerError> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let mut config = LabelerConfig::default()
        .with_templates_dir(&cli.templates_dir)
        .with_output_dir(&cli.output_dir)
        .with_scale(&cli.scale_port, cli.scale_baud)
        .with_printer(&cli.printer_port, cli.printer_baud);
    config.products = cli.products.clone();
    config.printer.profile = cli.printer_profile;

    match cli.command {
        Commands::Templates => {
            let loader = TemplateLoader::new(&config.templates_dir);
            loader.ensure_default()?;
            println!("Templates in {}:", loader.dir().display());
            for name in loader.list()? {
                println!("  {}", name);
            }
            Ok(())
        }

        Commands::Products => {
            for product in load_catalog(&config)?.list() {
                println!("{}", product.display_line());
            }
            Ok(())
        }

        Commands::Ports => {
            println!("{}", transport::SIMULATED);
            for port in serial::enumerate_ports() {
                println!("{}", port);
            }
            Ok(())
        }

        Commands::Read => {
            let mut station = Orchestrator::new(config.clone(), load_catalog(&config)?);
            println!("{:.3} lb", station.read_weight());
            Ok(())
        }

        Commands::Render { label, weight, out } => {
            let catalog = load_catalog(&config)?;
            let code = scale_labeler::catalog::parse_selection(&label.product)
                .ok_or(LabelerError::MissingSelection)?;
            let product = catalog
                .find(code)
                .ok_or_else(|| LabelerError::ProductNotFound(code.to_string()))?;

            let loader = TemplateLoader::new(&config.templates_dir);
            loader.ensure_default()?;
            let template = loader.load(&label.template)?;

            let content = LabelContent::build(&product, weight, &label.free_text())?;
            let emission = render::emit(&template, &content, &config.printer.profile)?;

            if let Some(pdf) = &emission.document {
                let path = out.with_extension("pdf");
                transport::write_file(&path, pdf)?;
                println!("Wrote {}", path.display());
            }
            if let Some(commands) = &emission.commands {
                let path = out.with_extension("prn");
                transport::write_file(&path, commands)?;
                println!("Wrote {}", path.display());
            }
            Ok(())
        }

        Commands::Preview { label, weight } => {
            let mut station = station(config, &label)?;
            let gross = weight.unwrap_or_else(|| station.read_weight());
            let path = station.preview(gross)?;
            println!("Preview saved to {}", path.display());
            Ok(())
        }

        Commands::Print { label, weight } => {
            let mut station = station(config, &label)?;
            let gross = weight.unwrap_or_else(|| station.read_weight());
            let outcome = station.print(gross)?;

            if let Some(path) = &outcome.artifact {
                println!("Saved {}", path.display());
            }
            println!("Printed {:.3} lb gross, {} bytes sent", gross, outcome.bytes_sent);
            Ok(())
        }

        Commands::Listen {
            label,
            debounce_ms,
            interval_secs,
        } => {
            if let Some(ms) = debounce_ms {
                config.scale.settings.debounce = Duration::from_millis(ms);
            }
            if let Some(secs) = interval_secs {
                config.scale.settings.simulate_interval = Duration::from_secs(secs);
            }
            let station = station(config, &label)?;
            listen(station)
        }

        Commands::TestPrinter { payload } => {
            let payload = payload.unwrap_or_else(|| DEFAULT_TEST_PRINT.to_string());
            let sent = transport::send(&config.printer.endpoint, payload.as_bytes())?;
            println!("Sent {} bytes to {}", sent, config.printer.endpoint);
            Ok(())
        }

        Commands::TestScale { timeout_ms } => match &config.scale.endpoint {
            Endpoint::Serial { path, baud } => {
                let link = SerialLink::new(path, *baud);
                let line = link.probe(Duration::from_millis(timeout_ms))?;
                println!("Scale answered: {:?}", line);
                Ok(())
            }
            other => Err(LabelerError::InvalidInput(format!(
                "test-scale needs a serial scale port, got {}",
                other
            ))),
        },
    }
}

fn load_catalog(config: &LabelerConfig) -> Result<Arc<dyn ProductCatalog>, LabelerError> {
    let catalog = match &config.products {
        Some(path) => InMemoryCatalog::from_json_file(path)?,
        None => InMemoryCatalog::with_sample(),
    };
    Ok(Arc::new(catalog))
}

fn station(config: LabelerConfig, label: &LabelArgs) -> Result<Orchestrator, LabelerError> {
    let catalog = load_catalog(&config)?;
    let mut station = Orchestrator::new(config, catalog);
    station.loader().ensure_default()?;
    station.select_product(&label.product);
    station.select_template(label.template.clone());
    station.set_free_text(label.free_text());
    Ok(station)
}

fn listen(mut station: Orchestrator) -> Result<(), LabelerError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async move {
        station.start_listening()?;

        let events = station.events();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = events.send(Event::Shutdown);
            }
        });

        let mut status = station.subscribe();
        tokio::spawn(async move {
            println!("{}", *status.borrow_and_update());
            while status.changed().await.is_ok() {
                println!("{}", *status.borrow_and_update());
            }
        });

        station.run().await;
        println!("Stopped");
        Ok::<(), LabelerError>(())
    })
}
