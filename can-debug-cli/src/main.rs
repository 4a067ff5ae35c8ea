//! CAN Debug CLI Application
//!
//! Command-line front end for the can-debug-decoder library:
//! - `dump` renders every described frame of a capture
//! - `serve` exposes the latest frame per identifier over HTTP
//! - `catalog` summarises a layout file

use anyhow::{Context, Result};
use can_debug_decoder::{
    Decoder, FrameEvent, FramePair, ReportConfig, ReportWriter, RuleWidth, SignalDecoder,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod server;

use config::AppConfig;
use server::{LatestFrames, ServerBuilder};

/// CAN Debug - Render CAN frames as readable reports
#[derive(Parser, Debug)]
#[command(name = "can-debug")]
#[command(about = "Decode CAN captures against message layouts", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every described frame of a capture
    Dump {
        #[command(flatten)]
        inputs: Inputs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Maximum number of frames to read
        #[arg(long, value_name = "COUNT")]
        max_frames: Option<usize>,

        /// Draw the header rule as wide as the widest header line
        #[arg(long)]
        wide_rules: bool,
    },
    /// Serve the latest frame per identifier over HTTP
    Serve {
        #[command(flatten)]
        inputs: Inputs,

        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
    },
    /// Print layout file statistics
    Catalog {
        /// TOML layout file
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct Inputs {
    /// TOML layout file
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// candump log file
    #[arg(long, value_name = "FILE")]
    capture: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Debug CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", can_debug_decoder::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    match args.command {
        Command::Dump {
            inputs,
            format,
            output,
            max_frames,
            wide_rules,
        } => {
            let mut report = config.render;
            if wide_rules {
                report = report.with_rule_width(RuleWidth::WidestHeader);
            }
            let max_frames = max_frames.or(config.capture.max_frames);
            dump_mode(&inputs, &config, format, output.as_deref(), max_frames, report)
        }
        Command::Serve { inputs, listen } => {
            let listen = listen.unwrap_or(config.server.listen);
            serve_mode(&inputs, &config, listen)
        }
        Command::Catalog { catalog } => {
            let path = require_path(catalog.as_ref(), config.catalog.path.as_ref(), "--catalog")?;
            catalog_mode(&path)
        }
    }
}

/// Dump mode - render every paired frame to stdout or a file
fn dump_mode(
    inputs: &Inputs,
    config: &AppConfig,
    format: OutputFormat,
    output: Option<&Path>,
    max_frames: Option<usize>,
    report: ReportConfig,
) -> Result<()> {
    let decoder = load_decoder(inputs, config)?;
    let capture = require_path(inputs.capture.as_ref(), config.capture.path.as_ref(), "--capture")?;
    let pairs = collect_pairs(&decoder, &capture, max_frames)?;

    let bytes = match format {
        OutputFormat::Text => {
            let outcome = ReportWriter::new(report)
                .write_reports(pairs.iter().map(FramePair::as_pair))
                .context("Failed to render reports")?;
            if !outcome.is_complete() {
                log::warn!("{} frames could not be rendered", outcome.skipped.len());
            }
            let mut body = outcome.body;
            if !body.is_empty() {
                body.push(b'\n');
            }
            body
        }
        OutputFormat::Json => {
            let messages = pairs
                .iter()
                .map(|pair| SignalDecoder::decode_message(pair.frame(), pair.descriptor()))
                .collect::<can_debug_decoder::Result<Vec<_>>>()
                .context("Failed to decode frames")?;
            let mut json = serde_json::to_vec_pretty(&messages)?;
            json.push(b'\n');
            json
        }
    };

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            file.write_all(&bytes)?;
            log::info!("Wrote {} frames to {:?}", pairs.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&bytes)?;
            lock.flush()?;
        }
    }

    Ok(())
}

/// Serve mode - keep the latest frame per identifier and serve it over HTTP
fn serve_mode(inputs: &Inputs, config: &AppConfig, listen: SocketAddr) -> Result<()> {
    let decoder = load_decoder(inputs, config)?;
    let capture = require_path(inputs.capture.as_ref(), config.capture.path.as_ref(), "--capture")?;
    let latest: LatestFrames = collect_pairs(&decoder, &capture, config.capture.max_frames)?
        .into_iter()
        .collect();
    log::info!("Serving {} message types", latest.len());
    if latest.is_empty() {
        log::warn!("No frame in {:?} matched the catalog", capture);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let handle = ServerBuilder::new(listen, Arc::new(latest))
            .with_report_config(config.render)
            .spawn()
            .await?;
        println!("Serving reports at http://{}/messages", handle.local_addr());

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        log::info!("Shutting down");
        handle.shutdown().await
    })
}

/// Catalog mode - print layout statistics
fn catalog_mode(path: &Path) -> Result<()> {
    let decoder = Decoder::from_layout_file(path)
        .with_context(|| format!("Failed to load layout file: {:?}", path))?;
    let catalog = decoder.catalog();
    let stats = catalog.stats();

    println!("Messages: {}", stats.num_messages);
    println!("Signals:  {}", stats.num_signals);
    for id in catalog.identifiers() {
        if let Some(descriptor) = catalog.get(id) {
            println!(
                "  0x{:03x} {} ({} signals)",
                id,
                descriptor.name,
                descriptor.signals.len()
            );
        }
    }

    Ok(())
}

fn load_decoder(inputs: &Inputs, config: &AppConfig) -> Result<Decoder> {
    let path = require_path(inputs.catalog.as_ref(), config.catalog.path.as_ref(), "--catalog")?;
    Decoder::from_layout_file(&path)
        .with_context(|| format!("Failed to load layout file: {:?}", path))
}

/// Read a capture and keep every frame the catalog describes
fn collect_pairs(decoder: &Decoder, capture: &Path, max_frames: Option<usize>) -> Result<Vec<FramePair>> {
    let events = decoder
        .decode_file(capture)
        .with_context(|| format!("Failed to open capture: {:?}", capture))?;

    let mut pairs = Vec::new();
    let mut unknown = 0usize;
    let mut malformed = 0usize;

    for event in events.take(max_frames.unwrap_or(usize::MAX)) {
        match event {
            Ok(FrameEvent::Paired { pair, .. }) => pairs.push(pair),
            Ok(FrameEvent::Unknown(captured)) => {
                log::debug!("No descriptor for ID 0x{:X}", captured.frame.id());
                unknown += 1;
            }
            Err(can_debug_decoder::DecoderError::IoError(e)) => {
                return Err(e).context("Failed to read capture");
            }
            Err(e) => {
                log::warn!("{}", e);
                malformed += 1;
            }
        }
    }

    log::info!(
        "Capture read: {} described, {} unknown, {} malformed",
        pairs.len(),
        unknown,
        malformed
    );
    Ok(pairs)
}

/// Prefer the CLI flag, then the config file
fn require_path(flag: Option<&PathBuf>, configured: Option<&PathBuf>, name: &str) -> Result<PathBuf> {
    flag.or(configured)
        .cloned()
        .with_context(|| format!("No {} given on the command line or in the config file", name))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
