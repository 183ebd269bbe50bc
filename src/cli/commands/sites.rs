use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::import::Site;
use crate::import::site_matcher::load_sites_file;
use crate::store::{RecordStore, RestStore};
use crate::ui::report;

#[derive(Args)]
pub struct SitesCommands {
    /// Read sites from a local .json or .toml file instead of the store
    #[arg(long)]
    pub sites: Option<PathBuf>,
}

pub async fn handle_sites_command(args: SitesCommands, config: &Config) -> Result<()> {
    let sites = resolve_sites(args.sites.as_deref(), config).await?;
    report::print_sites(&sites);
    Ok(())
}

/// Load the site registry from `sites_file` when given, otherwise from the store
pub async fn resolve_sites(sites_file: Option<&Path>, config: &Config) -> Result<Vec<Site>> {
    if let Some(path) = sites_file {
        println!("📄 Reading sites from: {}", path.display().to_string().cyan());
        return load_sites_file(path);
    }

    let store = RestStore::from_settings(&config.store)?;
    debug!("Fetching sites from {}", store.base_url());
    let sites = store
        .fetch_sites()
        .await
        .context("Could not load the site registry")?;
    info!("Loaded {} site(s) from the store", sites.len());
    Ok(sites)
}
