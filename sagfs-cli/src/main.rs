// SPDX-License-Identifier: AGPL-3.0-or-later
//! sagfs CLI
//!
//! Drives a local storage plugin from the command line.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sagfs")]
#[command(author, version, about = "sagfs - storage plugin driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Plugin configuration file (TOML)
    #[arg(short, long, global = true, conflicts_with = "root")]
    config: Option<PathBuf>,

    /// Dataset root directory, instead of a configuration file
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata for a path as JSON
    Stat {
        path: String,
    },

    /// List directory contents
    #[command(alias = "dir")]
    Ls {
        #[arg(default_value = "/")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Display file contents
    Cat {
        path: String,

        /// Byte offset to start from
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Number of bytes to read (defaults to the rest of the file)
        #[arg(long)]
        size: Option<usize>,
    },

    /// Check whether a path exists
    Exists {
        path: String,
    },

    /// Check whether a path is a directory
    IsDir {
        path: String,
    },

    /// Print change batches under the dataset root until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match commands::load_config(cli.config.as_deref(), cli.root.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Stat { path } => commands::stat(&config, &path, cli.verbose).await,
        Commands::Ls { path, long, human } => commands::ls(&config, &path, long, human).await,
        Commands::Cat { path, offset, size } => commands::cat(&config, &path, offset, size).await,
        Commands::Exists { path } => commands::exists(&config, &path).await,
        Commands::IsDir { path } => commands::is_dir(&config, &path).await,
        Commands::Watch => commands::watch(&config, cli.verbose).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
