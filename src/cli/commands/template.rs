use anyhow::Result;
use clap::Args;
use colored::*;
use log::warn;
use std::path::PathBuf;

use super::sites::resolve_sites;
use crate::config::Config;
use crate::import::write_template;

#[derive(Args)]
pub struct TemplateCommands {
    /// Where to write the .xlsx template
    pub output: PathBuf,

    /// Read sites from a local .json or .toml file instead of the store
    #[arg(long)]
    pub sites: Option<PathBuf>,

    /// Write a single generic sheet without contacting the store
    #[arg(long, conflicts_with = "sites")]
    pub offline: bool,
}

pub async fn handle_template_command(args: TemplateCommands, config: &Config) -> Result<()> {
    let sites = if args.offline {
        Vec::new()
    } else {
        resolve_sites(args.sites.as_deref(), config).await?
    };

    if sites.is_empty() {
        warn!("Writing template without site sheets");
    }

    write_template(&sites, &args.output)?;
    println!(
        "{} Template written to {} ({} site sheet(s))",
        "✓".green(),
        args.output.display().to_string().cyan(),
        sites.len()
    );
    Ok(())
}
