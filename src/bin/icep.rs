//! ICEP CLI
//!
//! Validates artifacts and NDJSON logs, and appends to event logs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use icep::{
    Dispatcher, EventLog, ExampleOutcome, ExampleSuite, IcepConfig, SchemaError, SchemaRegistry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icep")]
#[command(about = "Validate ICEP artifacts and manage event logs")]
struct Cli {
    /// Schema directory (overrides config)
    #[arg(long, global = true)]
    schemas: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an ICEP artifact or NDJSON event log
    Validate {
        /// Path to JSON or JSONL payload
        path: PathBuf,
        /// Override schema name (e.g. intent.json)
        #[arg(long)]
        schema: Option<String>,
    },

    /// Operate on ICEP event logs
    EventLog {
        #[command(subcommand)]
        command: EventLogCommands,
    },

    /// List loaded schemas and their lookup keys
    Schemas,

    /// Validate the example payloads in a directory
    CheckExamples {
        /// Examples directory (defaults to config)
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum EventLogCommands {
    /// Append an event
    Append {
        /// Path to log file
        #[arg(long)]
        log: PathBuf,
        /// Path to event JSON
        #[arg(long)]
        event: PathBuf,
    },

    /// Validate an event log
    Validate {
        /// Path to log file
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) if e.is_validation_failure() => {
            eprintln!("Validation failed: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs one command; `Ok(false)` means the command reported failures itself.
fn run(cli: Cli) -> Result<bool, SchemaError> {
    let config = IcepConfig::load_from(cli.config.as_deref())?;
    let schema_dir = cli.schemas.clone().unwrap_or_else(|| config.schema_dir());
    let registry = SchemaRegistry::load(&schema_dir)?;
    let dispatcher = Dispatcher::new(&registry);

    match cli.command {
        Commands::Validate { path, schema } => {
            let report = dispatcher.validate_path(&path, schema.as_deref())?;
            println!(
                "OK  {} ({} record(s) against {})",
                path.display(),
                report.records,
                report.schema
            );
            Ok(true)
        }

        Commands::EventLog { command } => match command {
            EventLogCommands::Append { log, event } => {
                let raw = std::fs::read(&event)?;
                EventLog::new(&registry, &log)
                    .with_sync(config.event_log.sync)
                    .append_slice(&raw)?;
                println!("Appended {} to {}", event.display(), log.display());
                Ok(true)
            }
            EventLogCommands::Validate { log } => {
                let records = EventLog::new(&registry, &log).validate()?;
                println!("OK  {} ({} event(s))", log.display(), records);
                Ok(true)
            }
        },

        Commands::Schemas => {
            print_schemas(&registry);
            Ok(true)
        }

        Commands::CheckExamples { dir } => {
            let dir = dir.unwrap_or_else(|| config.examples_dir());
            check_examples(&dispatcher, &dir)
        }
    }
}

fn print_schemas(registry: &SchemaRegistry) {
    println!("Schemas in {}", registry.root().display());
    println!("Fingerprint: {}", registry.fingerprint());
    if registry.is_empty() {
        println!("  (none)");
        return;
    }
    for doc in registry.documents() {
        let title = doc.title().unwrap_or("-");
        println!("  {} {}", doc.file_name, title);
        if let Some(id) = &doc.id {
            println!("    $id  {}", id);
        }
        println!("    uri  {}", doc.uri);
    }
}

fn check_examples(dispatcher: &Dispatcher<'_>, dir: &Path) -> Result<bool, SchemaError> {
    let report = ExampleSuite::default().run(dispatcher, dir)?;

    for (entry, outcome) in &report.results {
        match outcome {
            ExampleOutcome::Passed => println!("OK  {}", entry.file_name),
            ExampleOutcome::Skipped => println!("SKIP {} (missing)", entry.file_name),
            ExampleOutcome::Failed(message) => println!("FAIL {}: {}", entry.file_name, message),
        }
    }

    let failures = report.failures();
    if failures > 0 {
        println!("Validation failures: {}", failures);
    }
    Ok(failures == 0)
}
