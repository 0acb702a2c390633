//! Planning-service commands: data slices and jobs.
//!
//! `slicecheck export-data-slice`  : POST an export payload, print the grid
//! `slicecheck import-data-slice`  : POST an import payload, print the reply
//! `slicecheck run-job`            : submit a job and poll until it finishes

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use slicecheck_config::{get_password, EpmSettings};
use slicecheck_epm_client::{parse_payload, poll_job, Connection, EpmClient, EpmError, PollPolicy};
use slicecheck_io::grid_json_to_csv;
use tracing::{debug, info};

use crate::exit_codes::*;
use crate::{CliError, EpmArgs};

pub struct JobArgs {
    pub job_type: String,
    pub job_name: String,
    pub parameters: Option<String>,
    pub poll_interval: Option<u64>,
    pub max_retries: Option<u32>,
    pub no_wait: bool,
}

// ── Data slices ─────────────────────────────────────────────────────

pub fn cmd_export_data_slice(
    conn: &EpmArgs,
    plan_type: Option<String>,
    payload: &str,
    as_csv: bool,
    output: Option<PathBuf>,
    settings: &EpmSettings,
) -> Result<(), CliError> {
    let plan_type = resolve_plan_type(plan_type, settings)?;
    let payload = load_json_arg(payload)?;
    let client = connect(conn, settings)?;

    let data = client
        .export_data_slice(&plan_type, &payload)
        .map_err(epm_error)?;

    let text = if as_csv {
        grid_json_to_csv(&data).map_err(|e| CliError::new(grid_exit_code(&e), e.to_string()))?
    } else {
        to_json_line(&data)?
    };

    match output {
        Some(path) => {
            fs::write(&path, &text).map_err(|e| {
                CliError::new(EXIT_INPUT, format!("cannot write {}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), "data slice written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

pub fn cmd_import_data_slice(
    conn: &EpmArgs,
    plan_type: Option<String>,
    payload: &str,
    settings: &EpmSettings,
) -> Result<(), CliError> {
    let plan_type = resolve_plan_type(plan_type, settings)?;
    let payload = load_json_arg(payload)?;
    let client = connect(conn, settings)?;

    let reply = client
        .import_data_slice(&plan_type, &payload)
        .map_err(epm_error)?;
    print!("{}", to_json_line(&reply)?);
    Ok(())
}

// ── Jobs ────────────────────────────────────────────────────────────

pub fn cmd_run_job(
    conn: &EpmArgs,
    job: JobArgs,
    settings: &EpmSettings,
    quiet: bool,
) -> Result<(), CliError> {
    let parameters = job.parameters.as_deref().map(load_json_arg).transpose()?;
    let client = connect(conn, settings)?;

    let handle = client
        .submit_job(&job.job_type, &job.job_name, parameters.as_ref())
        .map_err(epm_error)?;
    info!(job_id = %handle.job_id, job_type = %job.job_type, job_name = %job.job_name, "job submitted");

    if job.no_wait {
        print!("{}", to_json_line(&handle)?);
        return Ok(());
    }

    let policy = PollPolicy {
        interval: Duration::from_secs(job.poll_interval.unwrap_or(settings.poll_interval_secs)),
        max_retries: job.max_retries.unwrap_or(settings.max_retries),
    };
    if !quiet {
        eprintln!(
            "job {} submitted; polling every {}s (at most {} time(s))",
            handle.job_id,
            policy.interval.as_secs(),
            policy.max_retries.max(1)
        );
    }

    let status = poll_job(&client, &handle.job_id, policy).map_err(|e| match e {
        EpmError::RetriesExhausted { .. } => epm_error(e)
            .with_hint("raise --max-retries or --poll-interval, or check the job in the service console"),
        other => epm_error(other),
    })?;
    print!("{}", to_json_line(&status)?);

    if status.is_success() {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_EPM_JOB_FAILED,
            format!(
                "job {} finished with status {} ({})",
                status.job_id, status.status, status.descriptive_status
            ),
        ))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Flags over `[epm]` settings, plus the password lookup.
fn resolve_connection(args: &EpmArgs, settings: &EpmSettings) -> Result<Connection, CliError> {
    let pick = |flag: &Option<String>, setting: &Option<String>, name: &str| {
        flag.clone()
            .or_else(|| setting.clone())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                CliError::new(EXIT_EPM_CONFIG, format!("planning service {} is not set", name))
                    .with_hint(format!("pass --{} or set [epm] {} in the config file", name.replace('_', "-"), name))
            })
    };

    let base_url = pick(&args.base_url, &settings.base_url, "base_url")?;
    let application = pick(&args.application, &settings.application, "application")?;
    let username = pick(&args.username, &settings.username, "username")?;
    let api_version = args
        .api_version
        .clone()
        .unwrap_or_else(|| settings.api_version.clone());

    let password = match &args.password {
        Some(p) => p.clone(),
        None => {
            let lookup = get_password(&settings.password_env, &username);
            debug!(source = lookup.source.as_str(), "password lookup");
            lookup.secret.ok_or_else(|| {
                CliError::new(EXIT_EPM_CONFIG, format!("no password found for {}", username))
                    .with_hint(format!(
                        "set ${} or store it in the system keychain",
                        settings.password_env
                    ))
            })?
        }
    };

    Ok(Connection {
        base_url,
        api_version,
        application,
        username,
        password,
    })
}

fn connect(args: &EpmArgs, settings: &EpmSettings) -> Result<EpmClient, CliError> {
    let conn = resolve_connection(args, settings)?;
    EpmClient::new(conn).map_err(epm_error)
}

fn resolve_plan_type(flag: Option<String>, settings: &EpmSettings) -> Result<String, CliError> {
    flag.or_else(|| settings.plan_type.clone())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            CliError::new(EXIT_EPM_CONFIG, "plan type is not set")
                .with_hint("pass --plan-type or set [epm] plan_type in the config file")
        })
}

/// A JSON argument is either inline JSON or the path of a file holding it.
fn load_json_arg(raw: &str) -> Result<Value, CliError> {
    let path = Path::new(raw);
    let text = if path.is_file() {
        fs::read_to_string(path).map_err(|e| {
            CliError::new(EXIT_INPUT, format!("cannot read {}: {}", path.display(), e))
        })?
    } else {
        raw.to_string()
    };
    parse_payload(&text).map_err(epm_error)
}

fn to_json_line<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    let mut text =
        serde_json::to_string_pretty(value).map_err(|e| CliError::new(EXIT_USAGE, e.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn epm_error(err: EpmError) -> CliError {
    let code = epm_exit_code(&err);
    let err_hint = match &err {
        EpmError::Http(401, _) | EpmError::Http(403, _) => {
            Some("check the username and password for the planning service")
        }
        EpmError::Network(_) => Some("check --base-url and network access"),
        _ => None,
    };
    let cli_err = CliError::new(code, err.to_string());
    match err_hint {
        Some(h) => cli_err.with_hint(h),
        None => cli_err,
    }
}
