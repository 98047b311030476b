//! log-stream - Decode error and audit event logs from a file or stdin.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use log_stream::config::{ConfigError, ConfigLoader, StreamConfig};
use log_stream::display;
use log_stream::{AuditEvent, ErrorEvent, EventStream};

#[derive(Parser)]
#[command(
    name = "log-stream",
    about = "Decode newline-delimited error and audit event logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Longest accepted event line in bytes (overrides the config file).
    #[arg(long, global = true)]
    max_line_bytes: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an error log.
    Errors(OutputArgs),
    /// Decode an audit log.
    Audit(OutputArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Log file to read; reads stdin when omitted.
    file: Option<PathBuf>,
    /// Print each line exactly as received.
    #[arg(long, conflicts_with = "json")]
    raw: bool,
    /// Print each event re-encoded as JSON.
    #[arg(long)]
    json: bool,
    /// Do not shorten long fields.
    #[arg(short, long)]
    wide: bool,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<StreamConfig, ConfigError> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(max) = cli.max_line_bytes {
        config.max_line_bytes = max;
    }
    Ok(config)
}

fn open_source(file: Option<&PathBuf>) -> io::Result<Box<dyn Read>> {
    match file {
        Some(path) => Ok(Box::new(File::open(path)?)),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// Drain a stream, printing every event. Returns `false` if it stopped on an error.
fn drain<T, F>(reader: Box<dyn Read>, config: &StreamConfig, args: &OutputArgs, print: F) -> bool
where
    T: DeserializeOwned + Default + Serialize,
    F: Fn(&T, bool),
{
    let mut stream = EventStream::<T, _>::with_config(reader, config);
    while stream.advance() {
        if args.raw {
            display::print_raw(stream.bytes());
        } else if args.json {
            match serde_json::to_string(stream.event()) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
            }
        } else {
            print(stream.event(), args.wide);
        }
    }

    tracing::info!(events = stream.events_read(), "Finished reading event log");
    match stream.err() {
        Some(err) => {
            display::print_stream_error(err);
            false
        }
        None => true,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let args = match &cli.command {
        Commands::Errors(args) | Commands::Audit(args) => args,
    };
    let reader = match open_source(args.file.as_ref()) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Failed to open event log: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ok = match &cli.command {
        Commands::Errors(args) => drain::<ErrorEvent, _>(reader, &config, args, |event, _| {
            display::print_error_event(event);
        }),
        Commands::Audit(args) => drain::<AuditEvent, _>(reader, &config, args, |event, wide| {
            display::print_audit_event(event, wide);
        }),
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
