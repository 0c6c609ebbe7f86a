//! `flamlog` - CLI for the flammability records web application
//!
//! This binary runs the web server and offers command-line access to search
//! and prediction.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use flamlog::cli::{Cli, Command, ConfigCommand, OutputFormat, SearchCommand, ServeCommand};
use flamlog::store::csv;
use flamlog::{init_logging, predict, Config, RecordStore, COLUMNS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd).await,
        Command::Search(search_cmd) => handle_search(&config, &search_cmd),
        Command::Predict(predict_cmd) => {
            println!("{}", predict(&predict_cmd.flammability_class));
            Ok(())
        }
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_serve(
    mut config: Config,
    cmd: ServeCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(data) = cmd.data {
        config.store.data_path = data;
    }
    config.validate()?;

    let store = Arc::new(RecordStore::open_or_empty(config.data_path()));
    flamlog::web::serve(config.bind_addr()?, store).await?;
    Ok(())
}

fn handle_search(config: &Config, cmd: &SearchCommand) -> Result<(), Box<dyn std::error::Error>> {
    let path = cmd.data.as_ref().unwrap_or(config.data_path());
    let store = RecordStore::open(path)?;
    let matches = store.filter(&cmd.query);

    match cmd.format {
        OutputFormat::Table => {
            for m in &matches {
                let r = &m.record;
                println!(
                    "{:>4}  {:<30} {:<10} {}",
                    m.index, r.material_name, r.flammability_class, r.pass_fail
                );
            }
            println!();
            println!("{} of {} records matched", matches.len(), store.len());
        }
        OutputFormat::Csv => {
            let mut out = String::new();
            csv::write_row(&mut out, COLUMNS);
            for m in &matches {
                csv::write_row(&mut out, m.record.fields());
            }
            print!("{out}");
        }
        OutputFormat::Json => {
            let records: Vec<_> = matches.iter().map(|m| &m.record).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Store]");
                println!("  Data path:          {}", config.data_path().display());
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
