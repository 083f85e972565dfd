//! Backend capability trait
//!
//! The three operations the orchestrator needs from a compute backend.

use async_trait::async_trait;
use autobatch_core::domain::job::{JobHandle, JobStatus};
use autobatch_core::dto::job::SubmitJobRequest;
use tracing::{debug, warn};

use crate::BatchClient;
use crate::error::{ClientError, Result};

/// Capability set consumed by the orchestrator
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Submits one job and returns its handle
    ///
    /// Failures are never retried by the caller.
    async fn submit(&self, request: &SubmitJobRequest) -> Result<JobHandle>;

    /// Queries the current status of one job
    ///
    /// Statuses the orchestrator does not track come back as
    /// [`JobStatus::Unknown`].
    async fn get_status(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Best-effort bulk termination
    ///
    /// Idempotent: terminal or vanished jobs are skipped without error.
    async fn terminate(&self, handles: &[JobHandle], reason: &str) -> Result<()>;
}

#[async_trait]
impl BackendClient for BatchClient {
    async fn submit(&self, request: &SubmitJobRequest) -> Result<JobHandle> {
        let response = self.submit_job(request).await?;
        debug!("Submitted job {} ({})", response.job_id, response.job_name);
        Ok(JobHandle::from(response.job_id))
    }

    async fn get_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let description = self.describe_job(handle.as_str()).await?;
        Ok(description.job_status())
    }

    async fn terminate(&self, handles: &[JobHandle], reason: &str) -> Result<()> {
        let mut last_error: Option<ClientError> = None;

        for handle in handles {
            match self.terminate_job(handle.as_str(), reason).await {
                Ok(()) => debug!("Terminated job {}", handle),
                Err(e) if e.is_not_found() => {
                    debug!("Job {} no longer exists, nothing to terminate", handle)
                }
                Err(e) => {
                    warn!("Failed to terminate job {}: {}", handle, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubGateway;

    /// 404 for `gone`, 500 for `broken`, 200 for everything else
    async fn gateway() -> StubGateway {
        StubGateway::start(|_, path: &str| {
            if path.starts_with("/v1/jobs/gone") {
                (404, r#"{"message": "job gone not found"}"#.to_string())
            } else if path.starts_with("/v1/jobs/broken") {
                (500, r#"{"message": "internal error"}"#.to_string())
            } else {
                (200, String::new())
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_terminate_skips_vanished_jobs() {
        let gateway = gateway().await;
        let client = BatchClient::new(gateway.url(), "eu-west-2");

        let handles = [JobHandle::new("gone"), JobHandle::new("live")];
        assert!(client.terminate(&handles, "cleanup").await.is_ok());

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, "POST");
        assert_eq!(requests[1].path, "/v1/jobs/live/terminate");
        assert_eq!(requests[1].body, r#"{"reason":"cleanup"}"#);
        assert_eq!(requests[1].header("x-batch-region"), Some("eu-west-2"));
    }

    #[tokio::test]
    async fn test_terminate_same_job_twice() {
        let gateway = gateway().await;
        let client = BatchClient::new(gateway.url(), "eu-west-2");
        let handles = [JobHandle::new("live")];

        assert!(client.terminate(&handles, "first").await.is_ok());
        assert!(client.terminate(&handles, "second").await.is_ok());
        assert_eq!(gateway.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_terminate_tries_every_job_and_reports_failure() {
        let gateway = gateway().await;
        let client = BatchClient::new(gateway.url(), "eu-west-2");

        let handles = [
            JobHandle::new("broken"),
            JobHandle::new("gone"),
            JobHandle::new("live"),
        ];
        let err = client.terminate(&handles, "deadline").await.unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 500, .. }));
        let paths: Vec<_> = gateway.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/v1/jobs/broken/terminate",
                "/v1/jobs/gone/terminate",
                "/v1/jobs/live/terminate",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_status_collapses_untracked_states() {
        let gateway = StubGateway::start(|_, path: &str| {
            let status = if path.ends_with("/done") {
                "SUCCEEDED"
            } else {
                "RUNNABLE"
            };
            (
                200,
                format!(r#"{{"jobId": "x", "status": "{}"}}"#, status),
            )
        })
        .await;
        let client = BatchClient::new(gateway.url(), "eu-west-2");

        let done = client.get_status(&JobHandle::new("done")).await.unwrap();
        let queued = client.get_status(&JobHandle::new("queued")).await.unwrap();

        assert_eq!(done, JobStatus::Succeeded);
        assert_eq!(queued, JobStatus::Unknown);
        assert_eq!(gateway.requests()[0].method, "GET");
        assert_eq!(gateway.requests()[0].path, "/v1/jobs/done");
    }

    #[tokio::test]
    async fn test_get_status_of_vanished_job_is_not_found() {
        let gateway = gateway().await;
        let client = BatchClient::new(gateway.url(), "eu-west-2");

        let err = client.get_status(&JobHandle::new("gone")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_terminate_nothing_is_a_no_op() {
        let client = BatchClient::new("http://127.0.0.1:9", "eu-west-2");
        assert!(client.terminate(&[], "nothing to do").await.is_ok());
    }
}
