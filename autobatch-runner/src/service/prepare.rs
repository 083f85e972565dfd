//! Prepare step
//!
//! Produces the ordered descriptor list for a run.

use async_trait::async_trait;
use autobatch_core::domain::descriptor::JobDescriptor;
use std::path::PathBuf;
use tracing::info;

use super::error::ServiceError;

/// Source of job descriptors
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Returns the descriptors for this run, in submission order
    async fn prepare(&self) -> Result<Vec<JobDescriptor>, ServiceError>;
}

/// Reads descriptors from a JSON array on disk
pub struct JsonFileDescriptorSource {
    path: PathBuf,
}

impl JsonFileDescriptorSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DescriptorSource for JsonFileDescriptorSource {
    async fn prepare(&self) -> Result<Vec<JobDescriptor>, ServiceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ServiceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let descriptors: Vec<JobDescriptor> =
            serde_json::from_str(&raw).map_err(|source| ServiceError::Json {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Loaded {} descriptor(s) from {}",
            descriptors.len(),
            self.path.display()
        );
        Ok(descriptors)
    }
}

/// Hands out a fixed descriptor list
pub struct StaticDescriptorSource {
    descriptors: Vec<JobDescriptor>,
}

impl StaticDescriptorSource {
    pub fn new(descriptors: Vec<JobDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait]
impl DescriptorSource for StaticDescriptorSource {
    async fn prepare(&self) -> Result<Vec<JobDescriptor>, ServiceError> {
        Ok(self.descriptors.clone())
    }
}
