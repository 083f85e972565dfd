//! Combine step
//!
//! Receives the annotated descriptor list after a successful run.

use async_trait::async_trait;
use autobatch_core::domain::report::RunReport;
use std::path::PathBuf;
use tracing::info;

use super::error::ServiceError;

/// Consumer of a completed run
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn combine(&self, report: &RunReport) -> Result<(), ServiceError>;
}

/// Writes the run report as pretty-printed JSON
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResultSink for JsonReportSink {
    async fn combine(&self, report: &RunReport) -> Result<(), ServiceError> {
        let body = serde_json::to_vec_pretty(report).map_err(|source| ServiceError::Json {
            path: self.path.clone(),
            source,
        })?;

        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| ServiceError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Wrote report for run {} to {}",
            report.run_id,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobatch_core::domain::descriptor::JobDescriptor;
    use autobatch_core::domain::report::{AnnotatedDescriptor, DescriptorOutcome};

    #[tokio::test]
    async fn test_writes_report_file() {
        let path = std::env::temp_dir().join(format!("autobatch-{}.json", uuid::Uuid::new_v4()));
        let report = RunReport {
            run_id: uuid::Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
            descriptors: vec![AnnotatedDescriptor {
                descriptor: JobDescriptor::new("out/0").mark_done(),
                outcome: DescriptorOutcome::Skipped,
            }],
        };

        JsonReportSink::new(&path).combine(&report).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let parsed: RunReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.run_id, report.run_id);
        assert_eq!(parsed.descriptors[0].outcome, DescriptorOutcome::Skipped);
    }
}
