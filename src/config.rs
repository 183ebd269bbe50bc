use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::import::{DEFAULT_BATCH_SIZE, SiteAlias, SiteMatcher};
use crate::import::documents::DEFAULT_WARNING_DAYS;
use crate::import::preview::DEFAULT_MAX_ERRORS;
use crate::store::constants::{DEFAULT_SITE_NAME_COLUMN, DEFAULT_SITES_TABLE, DEFAULT_VEHICLES_TABLE};

pub const ENV_STORE_URL: &str = "FLEET_STORE_URL";
pub const ENV_STORE_KEY: &str = "FLEET_STORE_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_vehicles_table")]
    pub vehicles_table: String,
    #[serde(default = "default_sites_table")]
    pub sites_table: String,
    #[serde(default = "default_site_name_column")]
    pub site_name_column: String,
}

fn default_vehicles_table() -> String {
    DEFAULT_VEHICLES_TABLE.to_string()
}

fn default_sites_table() -> String {
    DEFAULT_SITES_TABLE.to_string()
}

fn default_site_name_column() -> String {
    DEFAULT_SITE_NAME_COLUMN.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            vehicles_table: default_vehicles_table(),
            sites_table: default_sites_table(),
            site_name_column: default_site_name_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_error_messages")]
    pub max_error_messages: usize,
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: i64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_error_messages() -> usize {
    DEFAULT_MAX_ERRORS
}

fn default_expiry_warning_days() -> i64 {
    DEFAULT_WARNING_DAYS
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_error_messages: default_max_error_messages(),
            expiry_warning_days: default_expiry_warning_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub import: ImportSettings,
    /// Extra sheet-name aliases, checked after the built-in table
    #[serde(default)]
    pub aliases: Vec<SiteAlias>,
}

/// Keys accepted by `settings set`
pub const SETTING_KEYS: &[&str] = &[
    "store.url",
    "store.api_key",
    "store.vehicles_table",
    "store.sites_table",
    "store.site_name_column",
    "import.batch_size",
    "import.max_error_messages",
    "import.expiry_warning_days",
];

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("fleet-import");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.validate()?;
        debug!("Loaded config with {} extra alias(es)", config.aliases.len());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            bail!("import.batch_size must be greater than 0");
        }
        if self.import.expiry_warning_days < 0 {
            bail!("import.expiry_warning_days must not be negative");
        }
        Ok(())
    }

    /// Overlay store credentials from the environment (and a `.env` file, if present)
    pub fn with_env_overrides(mut self) -> Self {
        dotenvy::dotenv().ok();
        self.apply_env_overrides(|key| std::env::var(key).ok());
        self
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty()) {
            debug!("Store URL taken from {}", ENV_STORE_URL);
            self.store.url = Some(url);
        }
        if let Some(key) = lookup(ENV_STORE_KEY).filter(|v| !v.trim().is_empty()) {
            debug!("Store API key taken from {}", ENV_STORE_KEY);
            self.store.api_key = Some(key);
        }
    }

    /// Update one setting by dotted key; the change is validated but not saved
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "store.url" => self.store.url = Some(value.to_string()),
            "store.api_key" => self.store.api_key = Some(value.to_string()),
            "store.vehicles_table" => self.store.vehicles_table = value.to_string(),
            "store.sites_table" => self.store.sites_table = value.to_string(),
            "store.site_name_column" => self.store.site_name_column = value.to_string(),
            "import.batch_size" => {
                self.import.batch_size = value
                    .parse()
                    .with_context(|| format!("Invalid batch size '{}'", value))?
            }
            "import.max_error_messages" => {
                self.import.max_error_messages = value
                    .parse()
                    .with_context(|| format!("Invalid error message limit '{}'", value))?
            }
            "import.expiry_warning_days" => {
                self.import.expiry_warning_days = value
                    .parse()
                    .with_context(|| format!("Invalid number of days '{}'", value))?
            }
            _ => bail!(
                "Unknown setting '{}'. Available settings: {}",
                key,
                SETTING_KEYS.join(", ")
            ),
        }
        self.validate()
    }

    pub fn matcher(&self) -> SiteMatcher {
        SiteMatcher::new().with_extra_aliases(self.aliases.iter().cloned())
    }
}
