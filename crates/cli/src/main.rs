// slicecheck CLI - reconcile planning extracts and talk to the planning service

mod compare;
mod epm;
mod exit_codes;
mod grid;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use slicecheck_config::{ConfigError, Settings};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "slicecheck")]
#[command(about = "Keyed reconciliation of planning extracts, with planning-service data slices and jobs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/slicecheck/config.toml)
    #[arg(long, global = true, env = "SLICECHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Only log errors and skip progress notes on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile two extracts and write the comparison workbook
    #[command(after_help = "\
Examples:
  slicecheck compare --source planning.csv --target ledger.csv --dims Entity,Account
  slicecheck compare --source a.csv --target b.csv --source-headers 2 --target-headers 1 --dims Entity
  slicecheck compare --source a.xlsx --source-sheet Export --target b.csv --dims Entity --json

Exit codes:
  0  extracts identical (200)
  1  extracts differ (412), report written
  3  malformed header    4  missing dimension
  5  report write failed 6  input unreadable   7  CSV error")]
    Compare {
        /// Source extract (CSV, or XLSX/XLS/ODS)
        #[arg(long)]
        source: PathBuf,

        /// Target extract (CSV, or XLSX/XLS/ODS)
        #[arg(long)]
        target: PathBuf,

        /// Sheet to read when the source is a workbook (default: first)
        #[arg(long)]
        source_sheet: Option<String>,

        /// Sheet to read when the target is a workbook (default: first)
        #[arg(long)]
        target_sheet: Option<String>,

        /// Report destination [config: compare.output]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Header rows in the source extract [config: compare.source_header_rows]
        #[arg(long)]
        source_headers: Option<usize>,

        /// Header rows in the target extract [config: compare.target_header_rows]
        #[arg(long)]
        target_headers: Option<usize>,

        /// Comma-separated dimension names [config: compare.dimensions]
        #[arg(long)]
        dims: Option<String>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Flatten planning-grid JSON to CSV
    #[command(after_help = "\
Examples:
  slicecheck json-to-csv --file export.json --output export.csv
  slicecheck export-data-slice --payload slice.json | slicecheck json-to-csv --file -")]
    JsonToCsv {
        /// Grid JSON as a string
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        json_data: Option<String>,

        /// File holding grid JSON (`-` for stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write CSV here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Build a planning-grid import payload from CSV
    #[command(after_help = "\
Examples:
  slicecheck csv-to-json --file budget.csv \\
      --pov-dimensions Scenario,Version --pov-members Budget,Working \\
      --col-dimensions Period --row-dimensions Entity,Account")]
    CsvToJson {
        /// CSV file: row dimension columns, then one column per column-member
        #[arg(long)]
        file: PathBuf,

        /// Comma-separated POV dimensions
        #[arg(long, default_value = "")]
        pov_dimensions: String,

        /// Comma-separated POV members, one per POV dimension
        #[arg(long, default_value = "")]
        pov_members: String,

        /// Comma-separated column dimensions
        #[arg(long, default_value = "")]
        col_dimensions: String,

        /// Comma-separated row dimensions
        #[arg(long)]
        row_dimensions: String,

        /// Write JSON here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export a data slice from the planning service
    ExportDataSlice {
        #[command(flatten)]
        conn: EpmArgs,

        /// Plan type [config: epm.plan_type]
        #[arg(long)]
        plan_type: Option<String>,

        /// Export payload: a JSON string or a path to a JSON file
        #[arg(long)]
        payload: String,

        /// Write the response as CSV instead of JSON
        #[arg(long)]
        csv: bool,

        /// Write the result here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Import a data slice into the planning service
    ImportDataSlice {
        #[command(flatten)]
        conn: EpmArgs,

        /// Plan type [config: epm.plan_type]
        #[arg(long)]
        plan_type: Option<String>,

        /// Import payload: a JSON string or a path to a JSON file
        #[arg(long)]
        payload: String,
    },

    /// Submit a job and wait for it to finish
    #[command(after_help = "\
Examples:
  slicecheck run-job --job-type RULES --job-name Aggregate
  slicecheck run-job --job-type RULES --job-name Copy --parameters '{\"Scenario\":\"Actual\"}'
  slicecheck run-job --job-type CUBE_REFRESH --job-name Refresh --no-wait

Exit codes:
  0  job completed   53  still running after --max-retries polls   54  job failed")]
    RunJob {
        #[command(flatten)]
        conn: EpmArgs,

        /// Job type, e.g. RULES
        #[arg(long)]
        job_type: String,

        /// Job name
        #[arg(long)]
        job_name: String,

        /// Job parameters: a JSON string or a path to a JSON file
        #[arg(long)]
        parameters: Option<String>,

        /// Seconds between status polls [config: epm.poll_interval_secs]
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Polls before giving up [config: epm.max_retries]
        #[arg(long)]
        max_retries: Option<u32>,

        /// Print the job id and return without polling
        #[arg(long)]
        no_wait: bool,
    },
}

/// Planning-service connection flags; each overrides its `[epm]` setting.
#[derive(Args, Debug, Clone, Default)]
pub struct EpmArgs {
    /// Service base URL [config: epm.base_url]
    #[arg(long)]
    pub base_url: Option<String>,

    /// REST API version [config: epm.api_version]
    #[arg(long)]
    pub api_version: Option<String>,

    /// Application name [config: epm.application]
    #[arg(long)]
    pub application: Option<String>,

    /// Username [config: epm.username]
    #[arg(long)]
    pub username: Option<String>,

    /// Password (default: $EPM_PASSWORD or the system keychain)
    #[arg(long)]
    pub password: Option<String>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        " ",
        env!("TARGET"),
        ")"
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| {
        let log_file = cli.log_file.clone().or_else(|| settings.logging.file.clone());
        let _guard = logging::init(&settings.logging.level, cli.quiet, log_file.as_deref())
            .map_err(CliError::args)?;
        run(cli.command, &settings, cli.quiet)
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, CliError> {
    Settings::load(path).map_err(|e| {
        let hint = match &e {
            ConfigError::Read { .. } => "check the --config path".to_string(),
            ConfigError::Parse { .. } => {
                format!("see {} for the expected layout", Settings::config_path_display())
            }
        };
        CliError::args(e.to_string()).with_hint(hint)
    })
}

fn run(command: Commands, settings: &Settings, quiet: bool) -> Result<(), CliError> {
    match command {
        Commands::Compare {
            source,
            target,
            source_sheet,
            target_sheet,
            output,
            source_headers,
            target_headers,
            dims,
            json,
        } => compare::cmd_compare(
            compare::CompareArgs {
                source,
                target,
                source_sheet,
                target_sheet,
                output,
                source_headers,
                target_headers,
                dims,
                json,
                quiet,
            },
            &settings.compare,
        ),
        Commands::JsonToCsv { json_data, file, output } => {
            grid::cmd_json_to_csv(json_data, file, output)
        }
        Commands::CsvToJson {
            file,
            pov_dimensions,
            pov_members,
            col_dimensions,
            row_dimensions,
            output,
        } => grid::cmd_csv_to_json(
            file,
            &pov_dimensions,
            &pov_members,
            &col_dimensions,
            &row_dimensions,
            output,
        ),
        Commands::ExportDataSlice { conn, plan_type, payload, csv, output } => {
            epm::cmd_export_data_slice(&conn, plan_type, &payload, csv, output, &settings.epm)
        }
        Commands::ImportDataSlice { conn, plan_type, payload } => {
            epm::cmd_import_data_slice(&conn, plan_type, &payload, &settings.epm)
        }
        Commands::RunJob {
            conn,
            job_type,
            job_name,
            parameters,
            poll_interval,
            max_retries,
            no_wait,
        } => epm::cmd_run_job(
            &conn,
            epm::JobArgs {
                job_type,
                job_name,
                parameters,
                poll_interval,
                max_retries,
                no_wait,
            },
            &settings.epm,
            quiet,
        ),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Exit with `code` without printing anything.
    pub fn silent(code: u8) -> Self {
        Self::new(code, String::new())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
