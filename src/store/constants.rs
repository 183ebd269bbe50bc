//! Endpoint and header constants for the hosted Postgres REST API

/// REST path prefix under the project URL
pub const REST_PATH: &str = "/rest/v1";

pub const DEFAULT_VEHICLES_TABLE: &str = "vehiculos";
pub const DEFAULT_SITES_TABLE: &str = "sedes";
pub const DEFAULT_SITE_NAME_COLUMN: &str = "nombre";

pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Project key header expected alongside the bearer token
    pub const API_KEY: &str = "apikey";

    /// Skip echoing inserted rows back
    pub const PREFER_RETURN_MINIMAL: &str = "return=minimal";

    pub const USER_AGENT: &str = "fleet-import/0.1";
}

/// Build the endpoint for a table
pub fn table_endpoint(base_url: &str, table: &str) -> String {
    format!(
        "{}{}/{}",
        base_url.trim_end_matches('/'),
        REST_PATH,
        urlencoding::encode(table)
    )
}
