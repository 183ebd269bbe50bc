use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::config::{Config, SETTING_KEYS};

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show current settings
    Show,
    /// Print the config file location
    Path,
    /// Set the value of a specific setting
    Set {
        /// Setting name (e.g. import.batch_size)
        name: String,
        /// Setting value
        value: String,
    },
}

pub fn handle_settings_command(args: SettingsCommands) -> Result<()> {
    match args.command {
        SettingsSubcommands::Show => {
            // Show the file as saved, without environment overrides
            let config = Config::load()?;
            print_settings(&config);
        }
        SettingsSubcommands::Path => {
            println!("{}", Config::get_config_path()?.display());
        }
        SettingsSubcommands::Set { name, value } => {
            let mut config = Config::load()?;
            config.set_value(&name, &value)?;
            config.save()?;
            println!("{} {} updated", "✓".green(), name.bold());
        }
    }
    Ok(())
}

fn print_settings(config: &Config) {
    for key in SETTING_KEYS {
        println!("{:<28} {}", key.bold(), display_value(config, key));
    }
    if !config.aliases.is_empty() {
        println!();
        println!("{}", "Extra aliases:".bold());
        for alias in &config.aliases {
            println!("  {} -> {}", alias.keyword, alias.site);
        }
    }
}

fn display_value(config: &Config, key: &str) -> String {
    let unset = || "(not set)".dimmed().to_string();
    match key {
        "store.url" => config.store.url.clone().unwrap_or_else(unset),
        "store.api_key" => config
            .store
            .api_key
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(unset),
        "store.vehicles_table" => config.store.vehicles_table.clone(),
        "store.sites_table" => config.store.sites_table.clone(),
        "store.site_name_column" => config.store.site_name_column.clone(),
        "import.batch_size" => config.import.batch_size.to_string(),
        "import.max_error_messages" => config.import.max_error_messages.to_string(),
        "import.expiry_warning_days" => config.import.expiry_warning_days.to_string(),
        _ => unset(),
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
