use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// A registered organizational site that owns imported vehicles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    #[serde(deserialize_with = "deserialize_site_id")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
}

impl Site {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSiteId {
    Text(String),
    Integer(i64),
}

fn deserialize_site_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawSiteId::deserialize(deserializer)? {
        RawSiteId::Text(id) => id,
        RawSiteId::Integer(id) => id.to_string(),
    })
}

#[derive(Deserialize)]
struct SitesFile {
    sites: Vec<Site>,
}

/// Load a site registry from a `.json` list or a `.toml` file of `[[sites]]` tables
pub fn load_sites_file<P: AsRef<Path>>(path: P) -> Result<Vec<Site>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sites file: {:?}", path))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    let sites = match extension.as_str() {
        "json" => serde_json::from_str::<Vec<Site>>(&content)
            .with_context(|| format!("Failed to parse sites file: {:?}", path))?,
        "toml" => {
            toml::from_str::<SitesFile>(&content)
                .with_context(|| format!("Failed to parse sites file: {:?}", path))?
                .sites
        }
        _ => bail!("Unsupported sites file {:?}: expected .json or .toml", path),
    };

    debug!("Loaded {} site(s) from {:?}", sites.len(), path);
    Ok(sites)
}

/// Sheet-name keyword to canonical site-name fragment, checked in order
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("SCP ICA", "San Cristobal del Peru Ica"),
    ("SCP LIMA", "San Cristobal del Peru Lima"),
    ("SCP AREQUIPA", "San Cristobal del Peru Arequipa"),
    ("SCP CHINCHA", "San Cristobal del Peru Chincha"),
    ("SCP PISCO", "San Cristobal del Peru Pisco"),
    ("SCP", "San Cristobal del Peru"),
    ("GSC", "Grupo San Cristobal"),
];

/// One alias entry, stored normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAlias {
    pub keyword: String,
    pub site: String,
}

impl SiteAlias {
    pub fn new(keyword: &str, site: &str) -> Self {
        Self {
            keyword: normalize_name(keyword),
            site: normalize_name(site),
        }
    }
}

/// Guesses which registered site a sheet belongs to
#[derive(Debug, Clone)]
pub struct SiteMatcher {
    aliases: Vec<SiteAlias>,
}

impl Default for SiteMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteMatcher {
    /// Matcher using only the built-in alias table
    pub fn new() -> Self {
        Self {
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(keyword, site)| SiteAlias::new(keyword, site))
                .collect(),
        }
    }

    /// Append extra aliases after the built-in ones
    pub fn with_extra_aliases<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = SiteAlias>,
    {
        self.aliases.extend(
            extra
                .into_iter()
                .map(|alias| SiteAlias::new(&alias.keyword, &alias.site))
                .filter(|alias| !alias.keyword.is_empty() && !alias.site.is_empty()),
        );
        self
    }

    pub fn aliases(&self) -> &[SiteAlias] {
        &self.aliases
    }

    /// Return the id of the site `sheet_name` most likely refers to.
    ///
    /// Direct matching against the registry always wins over the alias table;
    /// `None` means the operator has to pick the site.
    pub fn match_site(&self, sheet_name: &str, sites: &[Site]) -> Option<String> {
        let sheet = normalize_name(sheet_name);
        if sheet.is_empty() {
            return None;
        }

        if let Some(site) = find_direct(&sheet, sites) {
            debug!("Sheet '{}' matched site '{}' directly", sheet_name, site.name);
            return Some(site.id.clone());
        }

        for alias in &self.aliases {
            if !sheet.contains(&alias.keyword) {
                continue;
            }
            if let Some(site) = find_substring(&alias.site, sites) {
                debug!(
                    "Sheet '{}' matched site '{}' through alias '{}'",
                    sheet_name, site.name, alias.keyword
                );
                return Some(site.id.clone());
            }
        }

        debug!("Sheet '{}' left unmatched", sheet_name);
        None
    }
}

/// Trim and uppercase a sheet or site name for comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

fn find_direct<'a>(needle: &str, sites: &'a [Site]) -> Option<&'a Site> {
    sites
        .iter()
        .find(|site| normalize_name(&site.name) == needle)
        .or_else(|| find_substring(needle, sites))
}

fn find_substring<'a>(needle: &str, sites: &'a [Site]) -> Option<&'a Site> {
    sites.iter().find(|site| {
        let name = normalize_name(&site.name);
        !name.is_empty() && (name.contains(needle) || needle.contains(&name))
    })
}
