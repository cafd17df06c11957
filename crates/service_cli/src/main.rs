//! storage-valuer - Command Line Valuation of Commodity Storage
//!
//! # Commands
//!
//! - `storage-valuer value` - LSMC valuation with deltas, profile and trigger prices
//! - `storage-valuer intrinsic` - Intrinsic valuation against the forward curve
//! - `storage-valuer check` - Load and validate a configuration file
//!
//! Every command reads the TOML file given by `--config`. Logging goes to
//! stderr; `RUST_LOG` takes precedence over `--verbose` and the file's
//! `log_level`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::value::ValueOptions;
use commands::OutputFormat;
use config::{LogLevel, ValuerConfig};

/// Commodity storage valuation CLI
#[derive(Parser)]
#[command(name = "storage-valuer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "storage-valuer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value the facility by least-squares Monte Carlo
    Value {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the number of Monte Carlo paths
        #[arg(short, long)]
        num_paths: Option<usize>,

        /// Override the simulation seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Keep per-path simulation panels in the result
        #[arg(long)]
        panels: bool,
    },

    /// Value the facility against the forward curve only
    Intrinsic {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a configuration file
    Check,
}

/// Log level from the config file, if it can be read; errors surface later.
fn configured_level(cli: &Cli) -> LogLevel {
    if cli.verbose {
        return LogLevel::Debug;
    }
    ValuerConfig::from_file(&cli.config)
        .and_then(|mut config| config.apply_env().map(|_| config.log_level))
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured_level(&cli).as_filter_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Value {
            format,
            output,
            num_paths,
            seed,
            panels,
        } => {
            let options = ValueOptions {
                format,
                output: output.as_deref(),
                num_paths,
                seed,
                panels,
            };
            commands::value::run(&cli.config, &options)?
        }
        Commands::Intrinsic { format, output } => commands::intrinsic::run(&cli.config, format, output.as_deref())?,
        Commands::Check => commands::check::run(&cli.config)?,
    }
    Ok(())
}
