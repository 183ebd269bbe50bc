//! External record store
//!
//! The import only needs two things from the hosted database: the list of
//! registered sites and a bulk "insert rows into a collection" call. Both
//! live behind [`RecordStore`] so the pipeline can be driven against any
//! backend; [`RestStore`] talks to a hosted Postgres REST endpoint.

pub mod constants;
pub mod rest;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::import::Site;

pub use rest::RestStore;

/// Structured error reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StoreError {
    /// Human-readable message, surfaced to the operator verbatim
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    /// HTTP status when the error came over the wire
    #[serde(skip)]
    pub status: Option<u16>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Registered sites, in the store's order
    async fn fetch_sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Insert all `rows` into `collection` in a single request
    async fn insert_rows(&self, collection: &str, rows: &[Value]) -> Result<(), StoreError>;
}
