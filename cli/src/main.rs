//! Cloud Logging CLI
//!
//! Command-line interface for writing, reading and routing Cloud Logging entries.
//!
//! # Usage
//!
//! ```bash
//! cloud-logging --help
//! cloud-logging write syslog "disk almost full" --severity warning
//! cloud-logging read --log syslog --filter 'severity>=ERROR' --limit 20
//! cloud-logging sinks create errors storage.googleapis.com/my-bucket --filter 'severity>=ERROR'
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cloud_logging::{
    ClientConfig, Entry, EntryMetadata, GetEntriesOptions, GetSinksOptions, Logging, Severity,
    Sink, SinkMetadata, WriteOptions,
};
use futures::TryStreamExt;
use serde::Serialize;

/// Cloud Logging CLI - write, read and route log entries
#[derive(Parser)]
#[command(name = "cloud-logging")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project id
    #[arg(short, long, env = "GOOGLE_CLOUD_PROJECT")]
    project: Option<String>,

    /// Service endpoint
    #[arg(long, env = "CLOUD_LOGGING_ENDPOINT")]
    endpoint: Option<String>,

    /// Emit JSON output and JSON-formatted diagnostics
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one entry to a log
    Write {
        /// Log name
        log: String,
        /// Entry text, or a JSON object with --json-payload
        message: String,
        /// Entry severity
        #[arg(short, long, value_enum, default_value_t = SeverityArg::Default)]
        severity: SeverityArg,
        /// Parse the message as a JSON object
        #[arg(long)]
        json_payload: bool,
        /// Entry label as key=value (repeatable)
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
    /// Read entries, newest first
    Read {
        /// Only entries of this log
        #[arg(long)]
        log: Option<String>,
        /// Advanced logs filter
        #[arg(short, long)]
        filter: Option<String>,
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
        /// Oldest first
        #[arg(long)]
        ascending: bool,
    },
    /// Delete a log and all of its entries
    DeleteLog {
        /// Log name
        log: String,
    },
    /// List logs that have entries
    Logs,
    /// Manage sinks
    #[command(subcommand)]
    Sinks(SinkCommands),
}

#[derive(Subcommand)]
enum SinkCommands {
    /// List sinks
    List,
    /// Create a sink
    Create {
        /// Sink name
        name: String,
        /// Destination, e.g. storage.googleapis.com/my-bucket
        destination: String,
        /// Filter selecting exported entries
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show a sink
    Get {
        /// Sink name
        name: String,
    },
    /// Delete a sink
    Delete {
        /// Sink name
        name: String,
    },
    /// Replace the filter of a sink
    SetFilter {
        /// Sink name
        name: String,
        /// New filter
        filter: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Default => Severity::Default,
            SeverityArg::Debug => Severity::Debug,
            SeverityArg::Info => Severity::Info,
            SeverityArg::Notice => Severity::Notice,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
            SeverityArg::Critical => Severity::Critical,
            SeverityArg::Alert => Severity::Alert,
            SeverityArg::Emergency => Severity::Emergency,
        }
    }
}

fn parse_label(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

/// Sink as printed by `sinks list` and `sinks get`.
#[derive(Serialize)]
struct SinkRow<'a> {
    name: &'a str,
    destination: &'a str,
    filter: Option<&'a str>,
    writer_identity: Option<&'a str>,
}

impl<'a> SinkRow<'a> {
    fn new(sink: &'a Sink) -> Self {
        let metadata = sink.metadata();
        Self {
            name: sink.name(),
            destination: metadata.map_or("", |m| m.destination.as_str()),
            filter: metadata.and_then(|m| m.filter.as_deref()),
            writer_identity: metadata.and_then(|m| m.writer_identity.as_deref()),
        }
    }
}

fn print_sink(sink: &Sink, json: bool) -> Result<()> {
    let row = SinkRow::new(sink);
    if json {
        println!("{}", serde_json::to_string(&row)?);
    } else {
        println!(
            "{}\t{}\t{}",
            row.name,
            row.destination,
            row.filter.unwrap_or("-")
        );
    }
    Ok(())
}

fn print_entry(entry: &Entry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(entry)?);
    } else {
        let meta = &entry.metadata;
        println!(
            "{} {:<9} {}: {}",
            meta.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
            meta.severity.unwrap_or_default(),
            meta.log_name
                .as_deref()
                .map(cloud_logging::names::short_name)
                .unwrap_or_default(),
            entry.payload_text()
        );
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(cli: &Cli) -> Result<Logging> {
    let mut config = ClientConfig::from_env()?;
    if let Some(project) = &cli.project {
        config = config.with_project(project.clone());
    }
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    Logging::new(config)
        .await
        .context("Failed to create Cloud Logging client")
}

async fn run(cli: Cli) -> Result<()> {
    let logging = connect(&cli).await?;

    match cli.command {
        Commands::Write {
            log,
            message,
            severity,
            json_payload,
            labels,
        } => {
            let metadata = labels.into_iter().fold(
                EntryMetadata::new().with_severity(severity.into()),
                |meta, (k, v)| meta.with_label(k, v),
            );
            let entry = if json_payload {
                let value: serde_json::Value =
                    serde_json::from_str(&message).context("Message is not valid JSON")?;
                Entry::with_metadata(metadata, value)
            } else {
                Entry::with_metadata(metadata, message)
            };
            let outcome = logging
                .log(&log)?
                .write(entry, WriteOptions::default())
                .await?;
            if outcome.dropped > 0 {
                anyhow::bail!("Entry was not written: payload must be a JSON object or string");
            }
            tracing::info!(log = %log, "Entry written");
        }
        Commands::Read {
            log,
            filter,
            limit,
            ascending,
        } => {
            let mut options = GetEntriesOptions::default().with_max_results(limit);
            if let Some(filter) = filter {
                options = options.with_filter(filter);
            }
            if ascending {
                options = options.with_order_by("timestamp asc");
            }
            let mut entries = match log {
                Some(log) => logging.log(&log)?.get_entries_stream(options),
                None => logging.get_entries_stream(options),
            };
            while let Some(entry) = entries.try_next().await? {
                print_entry(&entry, cli.json)?;
            }
        }
        Commands::DeleteLog { log } => {
            logging.log(&log)?.delete().await?;
            tracing::info!(log = %log, "Log deleted");
        }
        Commands::Logs => {
            for name in logging.list_logs().await? {
                println!("{}", cloud_logging::names::short_name(&name));
            }
        }
        Commands::Sinks(command) => run_sinks(&logging, command, cli.json).await?,
    }

    Ok(())
}

async fn run_sinks(logging: &Logging, command: SinkCommands, json: bool) -> Result<()> {
    match command {
        SinkCommands::List => {
            let mut sinks = logging.get_sinks_stream(GetSinksOptions::default());
            while let Some(sink) = sinks.try_next().await? {
                print_sink(&sink, json)?;
            }
        }
        SinkCommands::Create {
            name,
            destination,
            filter,
        } => {
            let mut metadata = SinkMetadata::new(destination);
            metadata.filter = filter;
            let sink = logging.create_sink(&name, metadata).await?;
            print_sink(&sink, json)?;
        }
        SinkCommands::Get { name } => {
            let mut sink = logging.sink(&name)?;
            sink.get_metadata().await?;
            print_sink(&sink, json)?;
        }
        SinkCommands::Delete { name } => {
            logging.sink(&name)?.delete().await?;
            tracing::info!(sink = %name, "Sink deleted");
        }
        SinkCommands::SetFilter { name, filter } => {
            let mut sink = logging.sink(&name)?;
            sink.set_filter(filter).await?;
            print_sink(&sink, json)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);
    run(cli).await
}
