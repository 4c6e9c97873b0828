use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vwrcap_core::{DecodedFrame, Report, VwrError, VwrFileSource};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VWRCAP_BUILD_COMMIT"),
    ")\ncommit: ",
    env!("VWRCAP_BUILD_COMMIT_FULL"),
    "\nbuilt: ",
    env!("VWRCAP_BUILD_DATE"),
);

const EXAMPLES: &str = "Examples:\n  vwrcap capture analyse capture.vwr -o report.json\n  vwrcap capture analyze capture.vwr --stdout --pretty\n  vwrcap capture frames capture.vwr --limit 10";

#[derive(Parser, Debug)]
#[command(name = "vwrcap")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder and analyzer for vendor capture logs (.vwr).",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on capture-log inputs.
    Capture {
        #[command(subcommand)]
        command: CaptureCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CaptureCommands {
    /// Analyse a capture log and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = EXAMPLES)]
    Analyse {
        /// Path to a .vwr file (a glob matching exactly one file is accepted)
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any frame carries an FCS, decrypt or retry error
        #[arg(long)]
        strict: bool,
    },
    /// Print decoded frames as JSON lines.
    Frames {
        /// Path to a .vwr file
        input: PathBuf,

        /// Decode the single record starting at this byte offset
        #[arg(long)]
        offset: Option<u64>,

        /// Stop after this many frames
        #[arg(long, conflicts_with = "offset")]
        limit: Option<usize>,

        /// Include the payload as a hex string
        #[arg(long)]
        payload: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Capture { command } => match command {
            CaptureCommands::Analyse {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
            } => cmd_capture_analyse(AnalyseArgs {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
            }),
            CaptureCommands::Frames {
                input,
                offset,
                limit,
                payload,
            } => cmd_capture_frames(&input, offset, limit, payload),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn format_error(err: VwrError, input: &Path) -> CliError {
    match err {
        VwrError::FormatMismatch => CliError::new(
            format!("not a recognised capture log: {}", input.display()),
            Some("no known hardware revision matched the first frame record".to_string()),
        ),
        err => CliError::new(format!("{}: {err}", input.display()), None),
    }
}

struct AnalyseArgs {
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
}

fn cmd_capture_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = match (args.stdout, args.report) {
        (true, _) => None,
        (false, Some(path)) => Some(path),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };
    if let Some(report_path) = report_path.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let rep = vwrcap_core::analyze_vwr_file(&resolved_input).map_err(|err| match err {
        vwrcap_core::AnalysisError::Source(vwrcap_core::SourceError::FormatMismatch) => {
            format_error(VwrError::FormatMismatch, &resolved_input)
        }
        err => CliError::new(format!("capture analysis failed: {err}"), None),
    })?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if args.strict {
        let errors = frame_error_count(&rep);
        if errors > 0 {
            return Err(CliError::new(
                format!("{errors} frame errors detected"),
                Some("inspect capture_summary in the report".to_string()),
            ));
        }
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    if let Some(report_dir) = report_dir {
        let file_name = report_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
        if report_dir.join(file_name) == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

fn frame_error_count(rep: &Report) -> u64 {
    rep.capture_summary
        .as_ref()
        .map(|summary| summary.fcs_errors + summary.decrypt_errors + summary.retry_errors)
        .unwrap_or(0)
}

fn cmd_capture_frames(
    input: &Path,
    offset: Option<u64>,
    limit: Option<usize>,
    payload: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(input)?;
    validate_input_file(&resolved_input)?;
    let mut source =
        VwrFileSource::open(&resolved_input).map_err(|err| format_error(err, &resolved_input))?;
    debug!(revision = %source.revision(), "decoding frames");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(offset) = offset {
        let frame = source
            .read_frame_at(offset)
            .map_err(|err| format_error(err, &resolved_input))?;
        return write_frame(&mut out, frame, payload);
    }

    let mut written = 0usize;
    while limit.is_none_or(|limit| written < limit) {
        let frame = match source
            .next_frame()
            .map_err(|err| format_error(err, &resolved_input))?
        {
            Some(frame) => frame,
            None => break,
        };
        write_frame(&mut out, frame, payload)?;
        written += 1;
    }
    Ok(())
}

fn write_frame<W: Write>(out: &mut W, mut frame: DecodedFrame, payload: bool) -> Result<(), CliError> {
    if !payload {
        frame.payload.clear();
    }
    let line = serde_json::to_string(&frame).context("JSON serialization failed")?;
    writeln!(out, "{line}").context("Failed to write frame")?;
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .vwr capture log".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .vwr capture log".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "vwr" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .vwr file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .vwr".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!("multiple files match pattern '{}' ({} matches)", pattern, count);
            let listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str("; matches: ");
            message.push_str(&listed);
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
