//! Domain-block list client
//!
//! This module fetches an instance's public moderation block list from
//! `/api/v1/instance/domain_blocks`. Many instances do not expose the
//! endpoint at all, and some serve an HTML page instead of a proper 404,
//! so the endpoint is probed with a HEAD request before the JSON body is
//! fetched.

use crate::rest::{network_retry, RestClient, RestClientConfig, RestError, RestRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public block-list endpoint path on a Mastodon instance
pub const DOMAIN_BLOCKS_PATH: &str = "/api/v1/instance/domain_blocks";

/// Default retry budget for network-class failures per instance
const MAX_RETRIES: usize = 2;

/// Errors that can occur while fetching a block list
#[derive(Debug, Error)]
pub enum BlocklistError {
    /// The instance does not expose a public block list (404/403 or
    /// a non-JSON response); callers treat this as zero events
    #[error("Instance {0} does not expose a public block list")]
    NotExposed(String),

    /// Transport or upstream failure
    #[error("Block list request failed for {host}: {source}")]
    Network {
        /// Instance the request was addressed to
        host: String,
        /// Underlying REST error
        source: RestError,
    },
}

/// Result type for block-list operations
pub type Result<T> = std::result::Result<T, BlocklistError>;

/// Severity of a domain block
///
/// The taxonomy is defined by the upstream API and open-ended; values this
/// client does not recognize map to [`BlockSeverity::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockSeverity {
    /// Full defederation: accounts and content removed
    Suspend,
    /// Limited: content hidden from users not following the account
    Silence,
    /// Media attachments are dropped
    RejectMedia,
    /// Unrecognized severity value
    #[serde(other)]
    #[default]
    Unknown,
}

impl BlockSeverity {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockSeverity::Suspend => "suspend",
            BlockSeverity::Silence => "silence",
            BlockSeverity::RejectMedia => "reject_media",
            BlockSeverity::Unknown => "unknown",
        }
    }

    /// Parse from the wire/storage representation
    pub fn from_str(s: &str) -> Self {
        match s {
            "suspend" => BlockSeverity::Suspend,
            "silence" => BlockSeverity::Silence,
            "reject_media" => BlockSeverity::RejectMedia,
            _ => BlockSeverity::Unknown,
        }
    }
}

/// One entry of an instance's public block list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainBlock {
    /// Blocked domain; may be partially obfuscated by the instance
    #[serde(default)]
    pub domain: Option<String>,
    /// SHA-256 digest of the blocked domain
    #[serde(default)]
    pub digest: Option<String>,
    /// Block severity
    #[serde(default)]
    pub severity: BlockSeverity,
    /// Public comment explaining the block
    #[serde(default)]
    pub comment: Option<String>,
}

/// Configuration for the block-list client
#[derive(Debug, Clone)]
pub struct BlocklistClientConfig {
    /// URL scheme used to address instances ("https" outside of tests)
    pub scheme: String,
    /// Retries per instance on network-class failures
    pub max_retries: usize,
}

impl Default for BlocklistClientConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            max_retries: MAX_RETRIES,
        }
    }
}

impl BlocklistClientConfig {
    /// Override the URL scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the retry budget per instance
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Client for the per-instance public block-list endpoint
pub struct BlocklistClient {
    rest: RestClient,
    config: BlocklistClientConfig,
}

impl BlocklistClient {
    /// Create a new block-list client
    pub fn new(rest_config: RestClientConfig, config: BlocklistClientConfig) -> Self {
        Self {
            rest: RestClient::new(rest_config),
            config,
        }
    }

    /// Endpoint URL for a given instance hostname
    fn endpoint(&self, host: &str) -> String {
        format!("{}://{}{}", self.config.scheme, host, DOMAIN_BLOCKS_PATH)
    }

    /// Fetch the public block list of an instance
    ///
    /// Returns [`BlocklistError::NotExposed`] when the endpoint is missing,
    /// forbidden, or serves something other than JSON. Network-class
    /// failures are retried with exponential backoff before the instance is
    /// given up on.
    pub async fn fetch(&self, host: &str) -> Result<Vec<DomainBlock>> {
        let url = self.endpoint(host);

        let content_type = network_retry(self.config.max_retries, || {
            self.rest.probe_content_type(RestRequest::get(&url))
        })
        .await
        .map_err(|e| self.classify(host, e))?;

        if !content_type.contains("application/json") {
            tracing::debug!(host, content_type, "Block list endpoint is not JSON");
            return Err(BlocklistError::NotExposed(host.to_string()));
        }

        let blocks = self
            .rest
            .get_json_with_retry::<Vec<DomainBlock>>(
                RestRequest::get(&url),
                self.config.max_retries,
            )
            .await
            .map_err(|e| self.classify(host, e))?;

        Ok(blocks)
    }

    fn classify(&self, host: &str, err: RestError) -> BlocklistError {
        if err.is_not_found() {
            BlocklistError::NotExposed(host.to_string())
        } else {
            BlocklistError::Network {
                host: host.to_string(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serde() {
        let block: DomainBlock =
            serde_json::from_str(r#"{"domain": "spam.example", "severity": "suspend"}"#).unwrap();
        assert_eq!(block.severity, BlockSeverity::Suspend);

        let block: DomainBlock =
            serde_json::from_str(r#"{"domain": "x.example", "severity": "reject_media"}"#).unwrap();
        assert_eq!(block.severity, BlockSeverity::RejectMedia);
    }

    #[test]
    fn test_severity_unknown_fallback() {
        let block: DomainBlock =
            serde_json::from_str(r#"{"domain": "x.example", "severity": "quarantine"}"#).unwrap();
        assert_eq!(block.severity, BlockSeverity::Unknown);
    }

    #[test]
    fn test_severity_round_trip() {
        for severity in [
            BlockSeverity::Suspend,
            BlockSeverity::Silence,
            BlockSeverity::RejectMedia,
            BlockSeverity::Unknown,
        ] {
            assert_eq!(BlockSeverity::from_str(severity.as_str()), severity);
        }
    }

    #[test]
    fn test_domain_block_minimal() {
        // Instances that obfuscate domains publish only the digest
        let block: DomainBlock = serde_json::from_str(
            r#"{"domain": null, "digest": "abc123", "severity": "silence"}"#,
        )
        .unwrap();
        assert!(block.domain.is_none());
        assert_eq!(block.digest.as_deref(), Some("abc123"));
        assert!(block.comment.is_none());
    }

    #[test]
    fn test_endpoint_url() {
        let client = BlocklistClient::new(
            RestClientConfig::default(),
            BlocklistClientConfig::default(),
        );
        assert_eq!(
            client.endpoint("mastodon.social"),
            "https://mastodon.social/api/v1/instance/domain_blocks"
        );

        let client = BlocklistClient::new(
            RestClientConfig::default(),
            BlocklistClientConfig::default().with_scheme("http"),
        );
        assert_eq!(
            client.endpoint("127.0.0.1:8080"),
            "http://127.0.0.1:8080/api/v1/instance/domain_blocks"
        );
    }
}
