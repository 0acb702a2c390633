//! Planning-service API client.
//!
//! Data-slice export/import and job submission with status polling, over
//! the service's REST API with basic auth.
//!
//! No retries on failed requests. Polling only waits on jobs that report
//! themselves in progress.

mod client;
mod jobs;

pub use client::{parse_payload, Connection, EpmClient, EpmError, JobHandle};
pub use jobs::{poll_job, JobStatus, JobStatusSource, PollPolicy, COMPLETED, IN_PROGRESS};
