use anyhow::Result;
use clap::Parser;
use colored::*;
use log::{error, info};

use fleet_import::cli::commands::{
    handle_import_command, handle_settings_command, handle_sites_command, handle_template_command,
};
use fleet_import::cli::{Cli, Commands};
use fleet_import::config::Config;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging() {
        eprintln!("{} could not open log file: {}", "Warning:".yellow(), e);
    }

    let cli = Cli::parse();
    info!("Starting fleet-import");

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    // Truncated on each run
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("fleet-import.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import(args) => {
            let config = Config::load()?.with_env_overrides();
            handle_import_command(args, &config).await
        }
        Commands::Sites(args) => {
            let config = Config::load()?.with_env_overrides();
            handle_sites_command(args, &config).await
        }
        Commands::Template(args) => {
            let config = Config::load()?.with_env_overrides();
            handle_template_command(args, &config).await
        }
        Commands::Settings(args) => handle_settings_command(args),
    }
}
