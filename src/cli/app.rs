use super::commands::import::ImportCommands;
use super::commands::settings::SettingsCommands;
use super::commands::sites::SitesCommands;
use super::commands::template::TemplateCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fleet-import")]
#[command(about = "Bulk-import vehicle spreadsheets into the fleet database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preview and import a workbook of vehicles
    Import(ImportCommands),
    /// List the sites vehicles can be assigned to
    Sites(SitesCommands),
    /// Write a blank import template with one sheet per site
    Template(TemplateCommands),
    /// Application settings management
    Settings(SettingsCommands),
}
