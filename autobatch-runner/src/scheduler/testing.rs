//! Scripted backend for orchestrator tests
//!
//! Each submission consumes the next script in line. A script is the
//! sequence of replies returned by successive status queries for that job;
//! the last reply repeats forever.

use async_trait::async_trait;
use autobatch_client::{BackendClient, ClientError, Result};
use autobatch_core::domain::job::{JobHandle, JobStatus};
use autobatch_core::dto::job::SubmitJobRequest;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// One reply to a status query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Status(JobStatus),
    QueryError,
}

impl From<JobStatus> for Reply {
    fn from(status: JobStatus) -> Self {
        Reply::Status(status)
    }
}

#[derive(Debug, Clone)]
pub struct TerminateCall {
    pub handles: Vec<JobHandle>,
    pub reason: String,
}

#[derive(Default)]
struct State {
    pending_scripts: VecDeque<Vec<Reply>>,
    scripts: HashMap<JobHandle, VecDeque<Reply>>,
    submissions: Vec<SubmitJobRequest>,
    status_queries: usize,
    terminate_calls: Vec<TerminateCall>,
    /// Jobs actually killed by a terminate call
    killed: HashSet<JobHandle>,
    fail_submission_at: Option<usize>,
    reuse_handle_at: Option<usize>,
}

#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<State>,
    submit_delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new<I, S, R>(scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = R>,
        R: Into<Reply>,
    {
        let pending_scripts = scripts
            .into_iter()
            .map(|script| script.into_iter().map(Into::into).collect())
            .collect();
        Self {
            state: Mutex::new(State {
                pending_scripts,
                ..State::default()
            }),
            submit_delay: None,
        }
    }

    /// Every job succeeds on its first query
    pub fn all_succeed(count: usize) -> Self {
        Self::new((0..count).map(|_| [JobStatus::Succeeded]))
    }

    /// Sleeps before every submission is acknowledged
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Rejects the n-th submission (0-based)
    pub fn failing_submission_at(self, index: usize) -> Self {
        self.state.lock().unwrap().fail_submission_at = Some(index);
        self
    }

    /// Answers the n-th submission (n > 0) with the previous job's handle
    pub fn reusing_handle_at(self, index: usize) -> Self {
        self.state.lock().unwrap().reuse_handle_at = Some(index);
        self
    }

    pub fn submissions(&self) -> Vec<SubmitJobRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().unwrap().status_queries
    }

    pub fn terminate_calls(&self) -> Vec<TerminateCall> {
        self.state.lock().unwrap().terminate_calls.clone()
    }

    pub fn killed(&self) -> HashSet<JobHandle> {
        self.state.lock().unwrap().killed.clone()
    }
}

fn current(script: &VecDeque<Reply>) -> Reply {
    script
        .front()
        .copied()
        .unwrap_or(Reply::Status(JobStatus::Succeeded))
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    async fn submit(&self, request: &SubmitJobRequest) -> Result<JobHandle> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let index = state.submissions.len();
        if state.fail_submission_at == Some(index) {
            return Err(ClientError::api_error(400, "invalid job definition"));
        }

        if index > 0 && state.reuse_handle_at == Some(index) {
            state.submissions.push(request.clone());
            return Ok(JobHandle::new(format!("job-{}", index - 1)));
        }

        let handle = JobHandle::new(format!("job-{}", index));
        let script = state
            .pending_scripts
            .pop_front()
            .unwrap_or_else(|| vec![Reply::Status(JobStatus::Succeeded)]);
        state.scripts.insert(handle.clone(), script.into());
        state.submissions.push(request.clone());
        Ok(handle)
    }

    async fn get_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_queries += 1;

        let script = state
            .scripts
            .get_mut(handle)
            .ok_or_else(|| ClientError::NotFound(handle.to_string()))?;
        let reply = if script.len() > 1 {
            script.pop_front().unwrap_or(Reply::QueryError)
        } else {
            current(script)
        };

        match reply {
            Reply::Status(status) => Ok(status),
            Reply::QueryError => Err(ClientError::api_error(503, "throttled")),
        }
    }

    async fn terminate(&self, handles: &[JobHandle], reason: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.terminate_calls.push(TerminateCall {
            handles: handles.to_vec(),
            reason: reason.to_string(),
        });

        for handle in handles {
            let Some(script) = state.scripts.get(handle) else {
                continue;
            };
            let terminal = matches!(current(script), Reply::Status(s) if s.is_terminal());
            if terminal || state.killed.contains(handle) {
                continue;
            }
            state.killed.insert(handle.clone());
            state
                .scripts
                .insert(handle.clone(), VecDeque::from([Reply::Status(JobStatus::Failed)]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobatch_core::domain::descriptor::JobDescriptor;

    use crate::scheduler::JobTemplate;

    fn request() -> SubmitJobRequest {
        JobTemplate::new("def", "name", "queue").request_for(&JobDescriptor::new("out"))
    }

    #[tokio::test]
    async fn test_script_advances_then_repeats() {
        let backend = ScriptedBackend::new([vec![
            Reply::QueryError,
            JobStatus::Running.into(),
            JobStatus::Succeeded.into(),
        ]]);
        let handle = backend.submit(&request()).await.unwrap();

        assert!(backend.get_status(&handle).await.is_err());
        assert_eq!(backend.get_status(&handle).await.unwrap(), JobStatus::Running);
        assert_eq!(backend.get_status(&handle).await.unwrap(), JobStatus::Succeeded);
        assert_eq!(backend.get_status(&handle).await.unwrap(), JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_terminate_twice_on_terminal_job_is_a_no_op() {
        let backend = ScriptedBackend::all_succeed(1);
        let handle = backend.submit(&request()).await.unwrap();

        assert!(backend.terminate(&[handle.clone()], "first").await.is_ok());
        assert!(backend.terminate(&[handle.clone()], "second").await.is_ok());

        assert!(backend.killed().is_empty());
        assert_eq!(backend.get_status(&handle).await.unwrap(), JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_terminate_kills_running_job_once() {
        let backend = ScriptedBackend::new([[JobStatus::Running]]);
        let handle = backend.submit(&request()).await.unwrap();

        backend.terminate(&[handle.clone()], "stop").await.unwrap();
        backend.terminate(&[handle.clone()], "stop").await.unwrap();

        assert_eq!(backend.killed().len(), 1);
        assert_eq!(backend.get_status(&handle).await.unwrap(), JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_terminate_unknown_handle_does_not_raise() {
        let backend = ScriptedBackend::default();
        assert!(backend
            .terminate(&[JobHandle::new("gone")], "cleanup")
            .await
            .is_ok());
    }
}
