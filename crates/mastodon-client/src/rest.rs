//! REST client implementation
//!
//! This module implements the small JSON-over-HTTP client shared by the
//! directory and blocklist clients. It provides request/response types,
//! error handling, and retry logic for network-class failures.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Types
// =============================================================================

/// REST error with HTTP status and message
///
/// This represents errors returned from REST endpoints, including both
/// network failures and application-level errors.
///
/// # Examples
/// ```
/// use mastodon_client::rest::RestError;
///
/// let error = RestError::new(404, "NotFound", "Record not found");
/// assert_eq!(error.status(), 404);
/// assert!(!error.is_network_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestError {
    /// HTTP status code (0 for transport failures)
    status: u16,
    /// Error code (e.g., "Unauthorized", "NotFound")
    error: String,
    /// Human-readable error message
    message: String,
}

impl RestError {
    /// Create a new REST error
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a network-related error that should be retried
    ///
    /// Status 0 is a transport failure before any HTTP response arrived.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self.status,
            0 | 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524
        )
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        self.is_network_error()
    }

    /// Check if this error means the resource is missing or access is denied
    pub fn is_not_found(&self) -> bool {
        matches!(self.status, 403 | 404 | 410)
    }

    /// Check if this error means the caller's credentials were rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401)
    }
}

impl std::fmt::Display for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "REST error {}: {} - {}",
            self.status, self.error, self.message
        )
    }
}

impl std::error::Error for RestError {}

/// Standard error response body shape used by Mastodon-family APIs
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    error: String,
}

// =============================================================================
// Request Types
// =============================================================================

/// A GET request to a REST endpoint
///
/// Represents a request with its absolute URL, query parameters, and headers.
#[derive(Debug, Clone)]
pub struct RestRequest {
    /// Absolute endpoint URL
    pub url: String,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
}

impl RestRequest {
    /// Create a new GET request for an absolute URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            headers: HashMap::new(),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a bearer token as an Authorization header
    pub fn bearer(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("NetMod/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl RestClientConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Retry Logic with Exponential Backoff
// =============================================================================

use std::future::Future;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: usize,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the delay for a given retry attempt
    fn calculate_delay(&self, attempt: usize) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(delay_ms as u64);

        // Cap at max_delay
        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Retry an async operation with a configurable retry policy
///
/// # Arguments
/// * `config` - Retry configuration
/// * `should_retry` - Function to determine if an error should be retried
/// * `operation` - The async operation to retry
pub async fn retry<F, Fut, T, E>(
    config: RetryConfig,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempts += 1;

                if !should_retry(&err) {
                    return Err(err);
                }

                if attempts > config.max_retries {
                    return Err(err);
                }

                let delay = config.calculate_delay(attempts - 1);
                sleep(delay).await;
            }
        }
    }
}

/// Convenience function to retry network-class failures
pub async fn network_retry<F, Fut, T>(max_retries: usize, operation: F) -> Result<T, RestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RestError>>,
{
    let config = RetryConfig::new(max_retries);
    retry(config, |err: &RestError| err.is_network_error(), operation).await
}

// =============================================================================
// REST Client Implementation
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// REST client used by the directory and blocklist clients
///
/// # Examples
/// ```
/// use mastodon_client::rest::{RestClient, RestClientConfig, RestRequest};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new(RestClientConfig::default());
///
///     let request = RestRequest::get("https://mastodon.social/api/v1/instance");
///     let info: serde_json::Value = client.get_json(request).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    /// HTTP client
    client: ReqwestClient,
    /// Configuration
    config: RestClientConfig,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(config: RestClientConfig) -> Self {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Execute a GET request and deserialize the JSON response body
    pub async fn get_json<T>(&self, request: RestRequest) -> Result<T, RestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut req = self.client.get(&request.url);

        for (key, value) in &request.params {
            req = req.query(&[(key, value)]);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let response = req.send().await.map_err(|e| {
            RestError::new(0, "NetworkError", format!("Request failed: {}", e))
        })?;

        self.parse_response(response).await
    }

    /// Execute a GET request with retry on network-class failures
    pub async fn get_json_with_retry<T>(
        &self,
        request: RestRequest,
        max_retries: usize,
    ) -> Result<T, RestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        network_retry(max_retries, || self.get_json(request.clone())).await
    }

    /// Probe an endpoint with a HEAD request and return its content type
    ///
    /// Many instances serve HTML at API paths instead of a proper 404; the
    /// callers use the content type to decide whether a JSON body is worth
    /// fetching at all.
    pub async fn probe_content_type(&self, request: RestRequest) -> Result<String, RestError> {
        let mut req = self.client.head(&request.url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let response = req.send().await.map_err(|e| {
            RestError::new(0, "NetworkError", format!("Request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(RestError::new(
                status,
                "Unknown",
                format!("HTTP {} from HEAD probe", status),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(content_type)
    }

    /// Parse a reqwest response into a deserialized body or a RestError
    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<T, RestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();

            // Mastodon-family APIs report errors as {"error": "..."}
            if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&error_body) {
                return Err(RestError::new(status, "ApiError", body.error));
            } else {
                return Err(RestError::new(
                    status,
                    "Unknown",
                    format!("HTTP {}: {}", status, error_body),
                ));
            }
        }

        let body = response.text().await.map_err(|e| {
            RestError::new(0, "ParseError", format!("Failed to read response: {}", e))
        })?;

        let data: T = serde_json::from_str(&body).map_err(|e| {
            RestError::new(0, "ParseError", format!("Failed to parse JSON: {}", e))
        })?;

        Ok(data)
    }

    /// Get the client configuration
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod retry_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let config = RetryConfig::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            config,
            |_: &String| true,
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("success")
                }
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_retries() {
        let config = RetryConfig::new(3).with_initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            config,
            |_: &String| true,
            || {
                let c = counter_clone.clone();
                async move {
                    let count = c.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err("temporary error".to_string())
                    } else {
                        Ok("success")
                    }
                }
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let config = RetryConfig::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            config,
            |err: &String| !err.contains("permanent"),
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("permanent error".to_string())
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1); // Only tried once
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let config = RetryConfig::new(2).with_initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            config,
            |_: &String| true,
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("always fails".to_string())
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3); // Initial + 2 retries
    }

    #[tokio::test]
    async fn test_network_retry_with_network_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = network_retry(2, || {
            let c = counter_clone.clone();
            async move {
                let count = c.fetch_add(1, Ordering::SeqCst);
                if count < 1 {
                    Err(RestError::new(503, "ServiceUnavailable", "Service down"))
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_network_retry_with_application_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<String, RestError> = network_retry(2, || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(RestError::new(401, "Unauthorized", "Invalid token"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1); // Not retried
    }

    #[test]
    fn test_retry_config_calculate_delay() {
        let config = RetryConfig::new(3)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(config.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(400));
        assert_eq!(config.calculate_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(1));

        // After enough attempts, should cap at max_delay
        assert_eq!(config.calculate_delay(10), Duration::from_secs(1));
    }
}
