//! Job status polling.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::client::EpmError;

/// Status code the service reports while a job is still running.
pub const IN_PROGRESS: i64 = -1;
/// Status code of a job that completed without errors.
pub const COMPLETED: i64 = 0;

#[derive(Debug, Clone, serde::Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: i64,
    pub descriptive_status: String,
    /// Full job details as returned by the service
    pub details: Value,
}

impl JobStatus {
    pub fn is_in_progress(&self) -> bool {
        self.status == IN_PROGRESS
    }

    pub fn is_success(&self) -> bool {
        self.status == COMPLETED
    }
}

/// Anything that can report a job's current status.
pub trait JobStatusSource {
    fn job_status(&self, job_id: &str) -> Result<JobStatus, EpmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between polls while the job is in progress
    pub interval: Duration,
    /// Polls allowed before giving up; `0` still polls once
    pub max_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_retries: 30,
        }
    }
}

/// Poll until the job leaves the in-progress state.
///
/// Returns the first terminal status, whether it succeeded or not. A failed
/// status request ends polling immediately with that error.
pub fn poll_job<S: JobStatusSource + ?Sized>(
    source: &S,
    job_id: &str,
    policy: PollPolicy,
) -> Result<JobStatus, EpmError> {
    let mut polls = 0u32;
    loop {
        let status = source.job_status(job_id)?;
        polls += 1;
        info!(
            job_id,
            status = status.status,
            descriptive_status = %status.descriptive_status,
            "job status"
        );

        if !status.is_in_progress() {
            return Ok(status);
        }
        if polls >= policy.max_retries {
            error!(job_id, polls, "job still in progress, giving up");
            return Err(EpmError::RetriesExhausted {
                job_id: job_id.to_string(),
                polls,
                last_status: status.descriptive_status,
            });
        }
        thread::sleep(policy.interval);
    }
}
