//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Backing data file (overrides `store.data_path`)
    #[arg(short, long, value_name = "PATH")]
    pub data: Option<PathBuf>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in any field, ignoring case
    pub query: String,

    /// Backing data file (overrides `store.data_path`)
    #[arg(short, long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Predict command arguments.
#[derive(Debug, Args)]
pub struct PredictCommand {
    /// Flammability class of the material (e.g. Low, Medium, High)
    pub flammability_class: String,
}

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned summary lines
    #[default]
    Table,
    /// Full rows as comma-delimited text with a header
    Csv,
    /// JSON array of records
    Json,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate (default: standard location)
        file: Option<PathBuf>,
    },
}
