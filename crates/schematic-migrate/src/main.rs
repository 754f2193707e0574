//! schematic-migrate CLI
//!
//! Command-line tool for comparing relational schema snapshots.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use schematic_migrate::prelude::*;

/// Schema diffing and migration synthesis for relational databases.
#[derive(Parser)]
#[command(name = "schematic-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server applied to names that omit one.
    #[arg(long, env = "SCHEMATIC_DEFAULT_SERVER", global = true)]
    default_server: Option<String>,

    /// Database applied to names that omit one.
    #[arg(long, env = "SCHEMATIC_DEFAULT_DATABASE", global = true)]
    default_database: Option<String>,

    /// Schema applied to names that omit one.
    #[arg(long, env = "SCHEMATIC_DEFAULT_SCHEMA", global = true)]
    default_schema: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the operations that migrate the existing schema to the target.
    Diff {
        /// Snapshot of the existing schema (JSON).
        #[arg(short, long)]
        existing: PathBuf,

        /// Snapshot of the target schema (JSON).
        #[arg(short, long)]
        target: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Replay the operations and check that they reach the target.
        #[arg(long)]
        verify: bool,
    },

    /// Exit with a non-zero status when the schemas differ.
    Check {
        /// Snapshot of the existing schema (JSON).
        #[arg(short, long)]
        existing: PathBuf,

        /// Snapshot of the target schema (JSON).
        #[arg(short, long)]
        target: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One description per line.
    Text,
    /// The operations as a JSON array.
    Json,
}

impl Cli {
    /// Identifier defaults from the command line, if any were given.
    fn identifier_defaults(&self) -> Option<IdentifierDefaults> {
        if self.default_server.is_none()
            && self.default_database.is_none()
            && self.default_schema.is_none()
        {
            return None;
        }
        Some(IdentifierDefaults {
            server: self.default_server.clone(),
            database: self.default_database.clone(),
            schema: self.default_schema.clone(),
        })
    }
}

fn load_snapshots(
    existing: &Path,
    target: &Path,
    defaults: Option<&IdentifierDefaults>,
) -> anyhow::Result<(SchemaSnapshot, SchemaSnapshot)> {
    let mut existing = SchemaSnapshot::from_json_file(existing)?;
    let mut target = SchemaSnapshot::from_json_file(target)?;
    if let Some(defaults) = defaults {
        existing.identifier_defaults = defaults.clone();
        target.identifier_defaults = defaults.clone();
    }
    Ok((existing, target))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    let cli_defaults = cli.identifier_defaults();
    let registry = ResolverRegistry::with_defaults();

    match cli.command {
        Commands::Diff {
            existing,
            target,
            format,
            verify,
        } => {
            let (existing, target) = load_snapshots(&existing, &target, cli_defaults.as_ref())?;
            let differ = RelationalDatabaseDiffer::new(
                DifferOptions::new()
                    .with_identifier_defaults(existing.identifier_defaults.clone()),
            );

            let operations = differ.diff(&existing, &target, &registry, &cancel).await?;
            info!(operations = operations.len(), "Computed migration");

            match format {
                OutputFormat::Text => {
                    for operation in &operations {
                        println!("{}", operation.description());
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&operations)?);
                }
            }

            if verify {
                let mut state = SchemaState::from_snapshot(existing);
                state.apply_all(&operations)?;
                if differ.has_differences(state.snapshot(), &target, &registry)? {
                    anyhow::bail!("Replayed migration does not reach the target schema");
                }
                info!("Verified: replayed migration reaches the target schema");
            }
        }

        Commands::Check { existing, target } => {
            let (existing, target) = load_snapshots(&existing, &target, cli_defaults.as_ref())?;
            let differ = RelationalDatabaseDiffer::new(
                DifferOptions::new()
                    .with_identifier_defaults(existing.identifier_defaults.clone()),
            );

            if differ.has_differences(&existing, &target, &registry)? {
                info!("Schemas differ");
                return Ok(ExitCode::FAILURE);
            }
            info!("Schemas are identical");
        }
    }

    Ok(ExitCode::SUCCESS)
}
