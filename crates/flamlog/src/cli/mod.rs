//! Command-line interface for flamlog.
//!
//! This module provides the CLI structure for the `flamlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, OutputFormat, PredictCommand, SearchCommand, ServeCommand};

/// flamlog - Record and browse flammability-test results
///
/// Serves a small web application over a single delimited data file, and
/// offers the same search and prediction from the command line.
#[derive(Debug, Parser)]
#[command(name = "flamlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server
    Serve(ServeCommand),

    /// Search records from the command line
    Search(SearchCommand),

    /// Predict pass/fail for a flammability class
    Predict(PredictCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Config(ConfigCommand::Path),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "flamlog");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["flamlog", "serve"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert!(cmd.bind.is_none());
                assert!(cmd.data.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "flamlog",
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--data",
            "records.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:8080"));
                assert_eq!(cmd.data, Some(PathBuf::from("records.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_format() {
        let cli = Cli::try_parse_from(["flamlog", "search", "foam", "-f", "json"]).unwrap();
        match cli.command {
            Command::Search(cmd) => {
                assert_eq!(cmd.query, "foam");
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from(["flamlog", "predict", "Low"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Predict(PredictCommand { ref flammability_class }) if flammability_class == "Low"
        ));
    }

    #[test]
    fn test_parse_with_config_and_verbose() {
        let cli =
            Cli::try_parse_from(["flamlog", "-c", "/custom/config.toml", "-vv", "config", "path"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 2);
    }
}
