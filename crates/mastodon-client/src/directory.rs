//! Instance directory client
//!
//! This module fetches the list of known Mastodon instances from the
//! instances.social directory API. The endpoint is paginated with a
//! `min_id` cursor; pages are fetched sequentially and concatenated in
//! API-delivered order.

use crate::rest::{RestClient, RestClientConfig, RestError, RestRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default directory list endpoint
pub const DEFAULT_API_URL: &str = "https://instances.social/api/1.0/instances/list";

/// Default number of instances requested per page
const PAGE_SIZE: u32 = 500;

/// Safety valve against a cursor that never terminates
const MAX_PAGES: usize = 1000;

/// Default retry budget for network-class failures per page
const MAX_RETRIES: usize = 3;

/// Errors that can occur while querying the directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The bearer token was rejected; fatal for a collection run
    #[error("Directory authentication failed: {0}")]
    Auth(String),

    /// Transport or upstream failure
    #[error("Directory request failed: {0}")]
    Network(RestError),

    /// The pagination cursor stopped advancing
    #[error("Pagination cursor did not advance past {0}")]
    StuckCursor(String),
}

impl From<RestError> for DirectoryError {
    fn from(err: RestError) -> Self {
        if err.is_unauthorized() {
            DirectoryError::Auth(err.message().to_string())
        } else {
            DirectoryError::Network(err)
        }
    }
}

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Filters forwarded to the directory API as query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFilters {
    /// Minimum number of active users for an instance to be listed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_active_users: Option<u64>,
    /// Minimum Mastodon version (e.g., "4.0")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
}

/// A known instance as reported by the directory
///
/// Only the hostname is interpreted; everything else the directory reports
/// (user counts, uptime, version, ...) is carried as opaque metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Instance hostname (e.g., "mastodon.social")
    pub name: String,
    /// Opaque directory metadata, passed through untouched
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// One page of the directory listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    /// Instances on this page, in API-delivered order
    pub instances: Vec<InstanceRecord>,
    /// Cursor information for the next page
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

/// Pagination block of a directory response
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    /// Total instances matching the query
    #[serde(default)]
    pub total: Option<u64>,
    /// Cursor for the next page; absent on the last page
    #[serde(default)]
    pub next_id: Option<String>,
}

/// Configuration for the directory client
#[derive(Debug, Clone)]
pub struct DirectoryClientConfig {
    /// Directory list endpoint URL
    pub api_url: String,
    /// Bearer token for the directory API
    pub token: String,
    /// Instances requested per page
    pub page_size: u32,
    /// Retries per page on network-class failures
    pub max_retries: usize,
    /// Query filters
    pub filters: DirectoryFilters,
}

impl DirectoryClientConfig {
    /// Create a new configuration with the default endpoint
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            page_size: PAGE_SIZE,
            max_retries: MAX_RETRIES,
            filters: DirectoryFilters::default(),
        }
    }

    /// Override the endpoint URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the retry budget per page
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set query filters
    pub fn with_filters(mut self, filters: DirectoryFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Client for the instances.social directory API
pub struct DirectoryClient {
    rest: RestClient,
    config: DirectoryClientConfig,
}

impl DirectoryClient {
    /// Create a new directory client
    pub fn new(rest_config: RestClientConfig, config: DirectoryClientConfig) -> Self {
        Self {
            rest: RestClient::new(rest_config),
            config,
        }
    }

    /// Fetch a single page of the directory listing
    ///
    /// Network-class failures (transport errors, 5xx, 429) are retried with
    /// exponential backoff up to the configured budget; auth and other
    /// application errors are not.
    pub async fn fetch_page(&self, min_id: Option<&str>) -> Result<ListResponse> {
        let mut request = RestRequest::get(&self.config.api_url)
            .bearer(&self.config.token)
            .param("count", self.config.page_size.to_string());

        if let Some(min_active_users) = self.config.filters.min_active_users {
            request = request.param("min_active_users", min_active_users.to_string());
        }
        if let Some(min_version) = &self.config.filters.min_version {
            request = request.param("min_version", min_version.clone());
        }
        if let Some(cursor) = min_id {
            request = request.param("min_id", cursor);
        }

        let response = self
            .rest
            .get_json_with_retry::<ListResponse>(request, self.config.max_retries)
            .await?;
        Ok(response)
    }

    /// Fetch the full directory listing, following pagination cursors
    ///
    /// Instances are returned in API-delivered order across pages. A cursor
    /// that stops advancing aborts the walk rather than looping forever.
    pub async fn fetch_all(&self) -> Result<Vec<InstanceRecord>> {
        let mut instances = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(cursor.as_deref()).await?;

            tracing::debug!(
                page_len = page.instances.len(),
                total = instances.len() + page.instances.len(),
                "Fetched directory page"
            );

            if page.instances.is_empty() {
                break;
            }
            instances.extend(page.instances);

            let next = page.pagination.and_then(|p| p.next_id);
            match next {
                Some(next_id) => {
                    if cursor.as_deref() == Some(next_id.as_str()) {
                        return Err(DirectoryError::StuckCursor(next_id));
                    }
                    cursor = Some(next_id);
                }
                None => break,
            }
        }

        tracing::info!(count = instances.len(), "Directory listing complete");
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_record_metadata_is_opaque() {
        let json = r#"{
            "name": "mastodon.social",
            "users": "1200000",
            "up": true,
            "info": {"short_description": "The original server"}
        }"#;

        let record: InstanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "mastodon.social");
        assert_eq!(
            record.metadata.get("users"),
            Some(&serde_json::json!("1200000"))
        );
        assert_eq!(record.metadata.get("up"), Some(&serde_json::json!(true)));

        // Round-trips with the metadata flattened back to the top level
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back.get("name"), Some(&serde_json::json!("mastodon.social")));
        assert_eq!(back.get("up"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_list_response_without_pagination() {
        let json = r#"{"instances": [{"name": "a.example"}]}"#;
        let response: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.instances.len(), 1);
        assert!(response.pagination.is_none());
    }

    #[test]
    fn test_list_response_with_cursor() {
        let json = r#"{
            "instances": [{"name": "a.example"}, {"name": "b.example"}],
            "pagination": {"total": 4, "next_id": "b.example"}
        }"#;
        let response: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.instances.len(), 2);
        let page = response.pagination.unwrap();
        assert_eq!(page.total, Some(4));
        assert_eq!(page.next_id.as_deref(), Some("b.example"));
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: DirectoryError = RestError::new(401, "ApiError", "invalid token").into();
        assert!(matches!(err, DirectoryError::Auth(_)));

        let err: DirectoryError = RestError::new(503, "Unknown", "down").into();
        assert!(matches!(err, DirectoryError::Network(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = DirectoryClientConfig::new("token123")
            .with_api_url("https://directory.example/api/1.0/instances/list")
            .with_page_size(50)
            .with_filters(DirectoryFilters {
                min_active_users: Some(10),
                min_version: Some("4.0".to_string()),
            });

        assert_eq!(config.token, "token123");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.filters.min_active_users, Some(10));
    }
}
