pub mod handler;

use clap::Args;
use std::path::PathBuf;

pub use handler::handle_import_command;

#[derive(Args)]
pub struct ImportCommands {
    /// Workbook to import (.xlsx or .xls)
    pub file: PathBuf,

    /// Read sites from a local .json or .toml file instead of the store
    #[arg(long)]
    pub sites: Option<PathBuf>,

    /// Assign a sheet to a site, overriding the automatic match (SHEET=SITE, by id or name)
    #[arg(long, value_name = "SHEET=SITE")]
    pub map: Vec<String>,

    /// Leave a sheet out of the import
    #[arg(long, value_name = "SHEET")]
    pub ignore: Vec<String>,

    /// Show the preview without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Commit without interactive prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Override the configured batch size for this run
    #[arg(long)]
    pub batch_size: Option<usize>,
}
