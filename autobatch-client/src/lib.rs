//! Autobatch batch gateway client
//!
//! A small, type-safe HTTP client for a batch-compute gateway, plus the
//! [`BackendClient`] capability trait the orchestrator drives. Any compute
//! backend that can submit, describe and terminate jobs can stand behind it.
//!
//! # Example
//!
//! ```no_run
//! use autobatch_client::{BackendClient, BatchClient};
//! use autobatch_core::domain::job::JobHandle;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), autobatch_client::ClientError> {
//!     let client = BatchClient::new("http://localhost:8080", "eu-west-2");
//!
//!     let status = client.get_status(&JobHandle::new("4b9d0c")).await?;
//!     println!("job is {}", status);
//!     Ok(())
//! }
//! ```

mod backend;
pub mod error;
mod jobs;
#[cfg(test)]
mod stub;

// Re-export commonly used types
pub use backend::BackendClient;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Header carrying the compute region on every gateway request
pub const REGION_HEADER: &str = "x-batch-region";

/// HTTP client for the batch gateway API
///
/// Endpoints are grouped as:
/// - Submission (`POST /v1/jobs`)
/// - Description (`GET /v1/jobs/{id}`)
/// - Termination (`POST /v1/jobs/{id}/terminate`)
#[derive(Debug, Clone)]
pub struct BatchClient {
    /// Base URL of the gateway (e.g., "http://localhost:8080")
    base_url: String,
    /// Compute region the jobs run in
    region: String,
    /// HTTP client instance
    client: Client,
}

impl BatchClient {
    /// Create a new gateway client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the gateway API
    /// * `region` - Region identifier forwarded with every request
    ///
    /// # Example
    /// ```
    /// use autobatch_client::BatchClient;
    ///
    /// let client = BatchClient::new("http://localhost:8080", "eu-west-2");
    /// ```
    pub fn new(base_url: impl Into<String>, region: impl Into<String>) -> Self {
        Self::with_client(base_url, region, Client::new())
    }

    /// Create a new gateway client with a custom HTTP client
    ///
    /// Network timeouts belong here, not to the orchestrator.
    ///
    /// # Example
    /// ```
    /// use autobatch_client::BatchClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = BatchClient::with_client("http://localhost:8080", "eu-west-2", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        region: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            region: region.into(),
            client,
        }
    }

    /// Get the base URL of the gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the region requests are tagged with
    pub fn region(&self) -> &str {
        &self.region
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BatchClient::new("http://localhost:8080", "eu-west-2");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.region(), "eu-west-2");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = BatchClient::new("http://localhost:8080/", "eu-west-2");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = BatchClient::with_client("http://localhost:8080", "us-east-1", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
