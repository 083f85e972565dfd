//! Configuration module
//!
//! Handles CLI configuration: where the batch gateway lives and which region
//! requests are scoped to.

use anyhow::{Context, Result};
use autobatch_client::BatchClient;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the batch gateway
    pub backend_url: String,

    /// Compute region jobs run in
    pub region: String,

    /// Timeout of a single gateway request
    pub request_timeout: Duration,
}

impl Config {
    /// Builds a gateway client for one-off commands
    pub fn client(&self) -> Result<BatchClient> {
        let http_client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(BatchClient::with_client(
            self.backend_url.clone(),
            self.region.clone(),
            http_client,
        ))
    }
}
