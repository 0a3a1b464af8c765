//! packbound CLI tool.
//!
//! Usage:
//! ```bash
//! packbound check [OPTIONS] [PATH]
//! packbound update-baseline [PATH]
//! packbound init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Package boundary checker for large modular codebases
#[derive(Parser)]
#[command(name = "packbound")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the project configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check package boundaries
    Check {
        /// Project root to check (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Disable the extraction cache for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Recompute all violations and persist them as the accepted baseline
    UpdateBaseline {
        /// Project root to update (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Disable the extraction cache for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Initialize a starter configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-offense compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            no_cache,
        } => commands::check::run(&path, format, no_cache, cli.config.as_deref()),
        Commands::UpdateBaseline { path, no_cache } => {
            commands::update::run(&path, no_cache, cli.config.as_deref())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
