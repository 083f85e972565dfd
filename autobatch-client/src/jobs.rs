//! Job endpoints of the batch gateway

use crate::error::{ClientError, Result};
use crate::{BatchClient, REGION_HEADER};
use autobatch_core::dto::job::{
    JobDescription, SubmitJobRequest, SubmitJobResponse, TerminateJobRequest,
};

impl BatchClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a job to the queue named in the request
    ///
    /// # Returns
    /// The gateway's acknowledgement, carrying the new job id
    pub async fn submit_job(&self, req: &SubmitJobRequest) -> Result<SubmitJobResponse> {
        validate_submission(req)?;

        let url = format!("{}/v1/jobs", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(REGION_HEADER, &self.region)
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Describe a job by id
    pub async fn describe_job(&self, job_id: &str) -> Result<JobDescription> {
        let url = format!("{}/v1/jobs/{}", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .header(REGION_HEADER, &self.region)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Terminate a single job
    ///
    /// The gateway treats terminating a finished job as a no-op.
    pub async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<()> {
        let url = format!("{}/v1/jobs/{}/terminate", self.base_url, job_id);
        let response = self
            .client
            .post(&url)
            .header(REGION_HEADER, &self.region)
            .json(&TerminateJobRequest {
                reason: reason.to_string(),
            })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

/// Rejects submissions the gateway would refuse anyway
pub(crate) fn validate_submission(req: &SubmitJobRequest) -> Result<()> {
    if req.job_definition.trim().is_empty() {
        return Err(ClientError::InvalidRequest(
            "job definition cannot be empty".to_string(),
        ));
    }
    if req.job_queue.trim().is_empty() {
        return Err(ClientError::InvalidRequest(
            "job queue cannot be empty".to_string(),
        ));
    }
    if let Some(kv) = req
        .container_overrides
        .environment
        .iter()
        .find(|kv| kv.name.is_empty() || kv.name.contains('='))
    {
        return Err(ClientError::InvalidRequest(format!(
            "invalid environment variable name '{}'",
            kv.name
        )));
    }
    Ok(())
}
