//! `slicecheck compare`: two extracts in, one comparison workbook out.

use std::path::PathBuf;

use slicecheck_config::CompareSettings;
use slicecheck_io::grid::parse_list;
use slicecheck_io::{
    compare_files, CompareError, CompareErrorKind, CompareOutcome, ExtractRef, StatusCode,
};
use slicecheck_recon::MissingDimension;
use tracing::info;

use crate::exit_codes::{compare_exit_code, EXIT_DIFFS, EXIT_USAGE};
use crate::CliError;

/// Row parse errors listed individually before switching to a count.
const MAX_LISTED_ROW_ERRORS: usize = 10;

pub struct CompareArgs {
    pub source: PathBuf,
    pub target: PathBuf,
    pub source_sheet: Option<String>,
    pub target_sheet: Option<String>,
    pub output: Option<PathBuf>,
    pub source_headers: Option<usize>,
    pub target_headers: Option<usize>,
    pub dims: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

/// Flags over config: each unset flag falls back to its `[compare]` value.
struct Resolved {
    output: PathBuf,
    source_header_rows: usize,
    target_header_rows: usize,
    dimensions: Vec<String>,
}

fn resolve(args: &CompareArgs, settings: &CompareSettings) -> Resolved {
    Resolved {
        output: args.output.clone().unwrap_or_else(|| settings.output.clone()),
        source_header_rows: args.source_headers.unwrap_or(settings.source_header_rows),
        target_header_rows: args.target_headers.unwrap_or(settings.target_header_rows),
        dimensions: match &args.dims {
            Some(raw) => parse_list(raw),
            None => settings.dimensions.clone(),
        },
    }
}

pub fn cmd_compare(args: CompareArgs, settings: &CompareSettings) -> Result<(), CliError> {
    for (label, path) in [("source", &args.source), ("target", &args.target)] {
        if !path.exists() {
            return Err(CliError::new(
                EXIT_USAGE,
                format!("{} extract not found: {}", label, path.display()),
            ));
        }
    }

    let resolved = resolve(&args, settings);
    info!(
        source = %args.source.display(),
        target = %args.target.display(),
        output = %resolved.output.display(),
        dimensions = ?resolved.dimensions,
        "comparing extracts"
    );

    let source = ExtractRef::new(&args.source).with_sheet(args.source_sheet.as_deref());
    let target = ExtractRef::new(&args.target).with_sheet(args.target_sheet.as_deref());
    let outcome = compare_files(
        source,
        target,
        &resolved.output,
        resolved.source_header_rows,
        resolved.target_header_rows,
        &resolved.dimensions,
    )
    .map_err(compare_error)?;

    if args.json {
        let text = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::new(EXIT_USAGE, e.to_string()))?;
        println!("{}", text);
    }
    if !args.quiet {
        report(&outcome);
    }

    match outcome.status {
        StatusCode::ExactMatch => Ok(()),
        _ => Err(CliError::silent(EXIT_DIFFS)),
    }
}

/// Human summary on stderr.
fn report(outcome: &CompareOutcome) {
    let s = &outcome.summary;
    let verdict = match outcome.status {
        StatusCode::ExactMatch => "identical",
        _ => "differ",
    };
    eprintln!(
        "{} ({}): {} joined row(s), {} failing, {} hidden; report written to {}",
        verdict,
        outcome.status,
        s.recon.joined_rows,
        s.recon.failing_rows,
        s.hidden_rows,
        outcome.output.display()
    );

    let count = outcome.row_error_count();
    if count == 0 {
        return;
    }
    eprintln!(
        "note: skipped {} malformed row(s) ({} source, {} target)",
        count,
        outcome.source_row_errors.len(),
        outcome.target_row_errors.len()
    );
    for err in outcome
        .source_row_errors
        .iter()
        .chain(&outcome.target_row_errors)
        .take(MAX_LISTED_ROW_ERRORS)
    {
        eprintln!("  {}", err);
    }
    if count > MAX_LISTED_ROW_ERRORS {
        eprintln!("  ... and {} more", count - MAX_LISTED_ROW_ERRORS);
    }
}

fn compare_error(err: CompareError) -> CliError {
    let code = compare_exit_code(&err);
    let hint = match err.missing_dimension() {
        Some(MissingDimension::NoneDeclared) => {
            Some("pass --dims or set [compare] dimensions in the config file")
        }
        Some(MissingDimension::Absent { .. }) => {
            Some("dimension names label the leading columns; declare no more than the extract has")
        }
        None if err.kind() == CompareErrorKind::ColumnCollision => {
            Some("rename the dimension column; rowfailure and <metric>_source/_target/_variance/_notes are taken")
        }
        None => None,
    };
    let err = CliError::new(code, format!("{} ({})", err, err.status()));
    match hint {
        Some(h) => err.with_hint(h),
        None => err,
    }
}
