use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::time::Duration;

use super::constants::{self, headers};
use super::{RecordStore, StoreError};
use crate::config::StoreSettings;
use crate::import::Site;

/// Client for a hosted Postgres REST endpoint
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    sites_table: String,
    site_name_column: String,
    http_client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        // No request timeout: a slow insert is left to finish or fail on its own.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(headers::USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            sites_table: constants::DEFAULT_SITES_TABLE.to_string(),
            site_name_column: constants::DEFAULT_SITE_NAME_COLUMN.to_string(),
            http_client,
        })
    }

    /// Build a client from the `[store]` settings
    pub fn from_settings(settings: &StoreSettings) -> Result<Self> {
        let Some(url) = settings.url.as_deref().filter(|url| !url.trim().is_empty()) else {
            bail!("No store URL configured. Set FLEET_STORE_URL or run 'fleet-import settings set store.url <URL>'.");
        };
        let Some(api_key) = settings.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            bail!("No store API key configured. Set FLEET_STORE_KEY or run 'fleet-import settings set store.api_key <KEY>'.");
        };

        let mut store = Self::new(url, api_key)?;
        store.sites_table = settings.sites_table.clone();
        store.site_name_column = settings.site_name_column.clone();
        Ok(store)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(headers::API_KEY, &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch_sites(&self) -> Result<Vec<Site>, StoreError> {
        let url = constants::table_endpoint(&self.base_url, &self.sites_table);
        let select = format!("id,{}", self.site_name_column);
        debug!("GET {} select={}", url, select);

        let response = self
            .authorized(self.http_client.get(&url))
            .header("Accept", headers::CONTENT_TYPE_JSON)
            .query(&[("select", select.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::new(e.to_string()).with_status(status))?;

        if !(200..300).contains(&status) {
            return Err(store_error_from_body(status, &body));
        }

        let rows: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| StoreError::new(format!("Invalid site list: {}", e)).with_status(status))?;

        Ok(sites_from_rows(&rows, &self.site_name_column))
    }

    async fn insert_rows(&self, collection: &str, rows: &[Value]) -> Result<(), StoreError> {
        let url = constants::table_endpoint(&self.base_url, collection);
        debug!("POST {} ({} rows)", url, rows.len());

        let response = self
            .authorized(self.http_client.post(&url))
            .header("Content-Type", headers::CONTENT_TYPE_JSON)
            .header("Prefer", headers::PREFER_RETURN_MINIMAL)
            .json(rows)
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::new(e.to_string()).with_status(status))?;
        let error = store_error_from_body(status, &body);
        warn!("Insert into '{}' failed with HTTP {}: {}", collection, status, error);
        Err(error)
    }
}

/// Decode the store's JSON error body, falling back to the raw text
pub fn store_error_from_body(status: u16, body: &str) -> StoreError {
    let parsed = serde_json::from_str::<StoreError>(body)
        .ok()
        .filter(|error| !error.message.trim().is_empty());

    let error = match parsed {
        Some(error) => error,
        None if body.trim().is_empty() => StoreError::new(format!("HTTP {}", status)),
        None => StoreError::new(body.trim()),
    };
    error.with_status(status)
}

fn sites_from_rows(rows: &[Value], name_column: &str) -> Vec<Site> {
    rows.iter()
        .filter_map(|row| {
            let id = match row.get("id")? {
                Value::String(id) => id.clone(),
                Value::Number(id) => id.to_string(),
                _ => return None,
            };
            let name = row.get(name_column)?.as_str()?.to_string();
            Some(Site { id, name })
        })
        .collect()
}
