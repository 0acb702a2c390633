//! Planning-service HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers data-slice export/import and job submission/status.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::jobs::{JobStatus, JobStatusSource};

/// Error type for planning-service operations.
#[derive(Debug, Error)]
pub enum EpmError {
    /// Connection settings are missing or unusable
    #[error("configuration error: {0}")]
    Config(String),
    /// Network error
    #[error("network error: {0}")]
    Network(String),
    /// HTTP error with status code
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// Response body was not the expected JSON
    #[error("parse error: {0}")]
    Parse(String),
    /// A caller-supplied JSON payload did not parse; nothing was sent
    #[error("malformed JSON payload: {0}")]
    InvalidPayload(String),
    /// The job was still running after the last allowed poll
    #[error("job {job_id} still in progress after {polls} poll(s) (last status: {last_status})")]
    RetriesExhausted {
        job_id: String,
        polls: u32,
        last_status: String,
    },
}

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct Connection {
    pub base_url: String,
    pub api_version: String,
    pub application: String,
    pub username: String,
    pub password: String,
}

/// A submitted job.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Full submission response
    pub details: Value,
}

/// Planning-service API client (blocking).
#[derive(Clone)]
pub struct EpmClient {
    http: reqwest::blocking::Client,
    app_base: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for EpmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpmClient")
            .field("app_base", &self.app_base)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Parse a caller-supplied JSON string.
pub fn parse_payload(raw: &str) -> Result<Value, EpmError> {
    serde_json::from_str(raw).map_err(|e| EpmError::InvalidPayload(e.to_string()))
}

/// A job id may come back as a number or a string.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl EpmClient {
    pub fn new(conn: Connection) -> Result<Self, EpmError> {
        for (name, value) in [
            ("base_url", &conn.base_url),
            ("api_version", &conn.api_version),
            ("application", &conn.application),
            ("username", &conn.username),
        ] {
            if value.trim().is_empty() {
                return Err(EpmError::Config(format!("{name} is not set")));
            }
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("slicecheck/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EpmError::Config(format!("failed to create HTTP client: {e}")))?;

        let app_base = format!(
            "{}/rest/{}/applications/{}",
            conn.base_url.trim_end_matches('/'),
            conn.api_version,
            conn.application
        );

        Ok(Self {
            http,
            app_base,
            username: conn.username,
            password: conn.password,
        })
    }

    /// `POST …/plantypes/{plan_type}/exportdataslice`
    pub fn export_data_slice(&self, plan_type: &str, payload: &Value) -> Result<Value, EpmError> {
        let url = format!("{}/plantypes/{}/exportdataslice", self.app_base, plan_type);
        self.post_json(&url, payload)
    }

    /// `POST …/plantypes/{plan_type}/importdataslice`
    pub fn import_data_slice(&self, plan_type: &str, payload: &Value) -> Result<Value, EpmError> {
        let url = format!("{}/plantypes/{}/importdataslice", self.app_base, plan_type);
        self.post_json(&url, payload)
    }

    /// `POST …/jobs`, returning the new job's id.
    pub fn submit_job(
        &self,
        job_type: &str,
        job_name: &str,
        parameters: Option<&Value>,
    ) -> Result<JobHandle, EpmError> {
        let url = format!("{}/jobs", self.app_base);
        let mut body = json!({ "jobType": job_type, "jobName": job_name });
        if let Some(params) = parameters {
            body["parameters"] = params.clone();
        }

        let details = self.post_json(&url, &body)?;
        let job_id = id_text(&details["jobId"])
            .ok_or_else(|| EpmError::Parse("missing jobId in job submission response".into()))?;
        debug!(job_id = %job_id, job_type, job_name, "job submitted");
        Ok(JobHandle { job_id, details })
    }

    /// `GET …/jobs/{job_id}`
    pub fn job_status(&self, job_id: &str) -> Result<JobStatus, EpmError> {
        let url = format!("{}/jobs/{}", self.app_base, job_id);
        let details = self.get_json(&url)?;
        let status = details["status"]
            .as_i64()
            .ok_or_else(|| EpmError::Parse("missing status in job details".into()))?;
        let descriptive_status = details["descriptiveStatus"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string();
        Ok(JobStatus {
            job_id: job_id.to_string(),
            status,
            descriptive_status,
            details,
        })
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get_json(&self, url: &str) -> Result<Value, EpmError> {
        let request = self.http.get(url);
        self.send(request, url)
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, EpmError> {
        let request = self.http.post(url).json(body);
        self.send(request, url)
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder, url: &str) -> Result<Value, EpmError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .map_err(|e| EpmError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            error!(url, status, body = %body, "planning service request failed");
            return Err(EpmError::Http(status, body));
        }

        response.json().map_err(|e| EpmError::Parse(e.to_string()))
    }
}

impl JobStatusSource for EpmClient {
    fn job_status(&self, job_id: &str) -> Result<JobStatus, EpmError> {
        EpmClient::job_status(self, job_id)
    }
}
