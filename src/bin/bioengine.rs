//! BioEngine CLI - Command-line interface for BioEngine Analytics
//!
//! Commands:
//! - dashboard: Compute the dashboard payload for a filter selection
//! - acwr: Compute workload ratios
//! - normalize: Show the normalized label for raw activity types
//! - calendar: Group a month's activities by day
//! - validate: Validate activity and biometric records
//! - doctor: Diagnose configuration and environment

use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bioengine_analytics::config::EngineConfig;
use bioengine_analytics::encoder::{AcwrPayload, SnapshotEncoder};
use bioengine_analytics::filters::FilterSelection;
use bioengine_analytics::normalizer::ActivityNormalizer;
use bioengine_analytics::pipeline::{AnalyticsEngine, DashboardQuery};
use bioengine_analytics::schema::{de::parse_timestamp, RecordAdapter, ValidationResult};
use bioengine_analytics::types::{ActivityRecord, BiometricRecord};
use bioengine_analytics::{EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// BioEngine - activity analytics for the training dashboard
#[derive(Parser)]
#[command(name = "bioengine")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Classify activities, compute workload ratios and dashboard views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Dataset inputs shared by the data commands
#[derive(clap::Args)]
struct DataArgs {
    /// Activities JSON file (use - for stdin)
    #[arg(short, long)]
    activities: PathBuf,

    /// Biometrics JSON file
    #[arg(short, long)]
    biometrics: Option<PathBuf>,

    /// Treat unparseable inputs as empty instead of failing
    #[arg(long)]
    lenient: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard payload for a filter selection
    Dashboard {
        #[command(flatten)]
        data: DataArgs,

        /// Date window: all, 7d, 30d, 90d, week, month, 3months, year
        #[arg(long, default_value = "all")]
        date: String,

        /// Activity type label (e.g. "Trail Running") or all
        #[arg(long = "type", default_value = "all")]
        activity_type: String,

        /// Metric ranking (e.g. dist_top10, pace_max) or none
        #[arg(long, default_value = "none")]
        metric: String,

        /// Table page (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Move the date window back (negative) or forward by whole periods
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        shift: i32,

        /// Reference date (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        reference: Option<String>,

        /// Rows per page
        #[arg(long, env = "BIOENGINE_PAGE_SIZE")]
        page_size: Option<usize>,

        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the payload
        #[arg(long)]
        pretty: bool,
    },

    /// Compute workload ratios (acute:chronic)
    Acwr {
        #[command(flatten)]
        data: DataArgs,

        /// Reference date (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        reference: Option<String>,
    },

    /// Show the normalized label for raw activity types
    Normalize {
        /// Raw type strings; reads one per line from stdin when omitted
        types: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Group a month's activities by day
    Calendar {
        #[command(flatten)]
        data: DataArgs,

        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },

    /// Validate activity and biometric records
    Validate {
        #[command(flatten)]
        data: DataArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine readable
fn init_tracing() {
    let filter = EnvFilter::try_from_env("BIOENGINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), BioCliError> {
    match cli.command {
        Commands::Dashboard {
            data,
            date,
            activity_type,
            metric,
            page,
            shift,
            reference,
            page_size,
            config,
            pretty,
        } => {
            let filters = FilterSelection {
                date: date.parse()?,
                activity_type: activity_type.parse()?,
                metric: metric.parse()?,
            };
            let mut config = load_config(config.as_deref())?;
            if let Some(size) = page_size {
                config.page_size = size;
                config.validate()?;
            }
            let reference = filters.date.shift(resolve_reference(reference.as_deref())?, shift);
            cmd_dashboard(&data, config, filters, page, reference, pretty)
        }

        Commands::Acwr { data, reference } => {
            let reference = resolve_reference(reference.as_deref())?;
            cmd_acwr(&data, reference)
        }

        Commands::Normalize { types, json } => cmd_normalize(types, json),

        Commands::Calendar { data, year, month } => {
            let today = Utc::now();
            cmd_calendar(&data, year.unwrap_or(today.year()), month.unwrap_or(today.month()))
        }

        Commands::Validate { data, json } => cmd_validate(&data, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_dashboard(
    data: &DataArgs,
    config: EngineConfig,
    filters: FilterSelection,
    page: usize,
    reference: DateTime<Utc>,
    pretty: bool,
) -> Result<(), BioCliError> {
    let (activities, biometrics) = load_data(data)?;

    let mut engine = AnalyticsEngine::with_config(config);
    engine.load(activities, biometrics);

    let query = DashboardQuery {
        filters,
        page,
        reference,
    };
    let payload = SnapshotEncoder::new().encode(&engine.dashboard(&query));

    if pretty {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", serde_json::to_string(&payload)?);
    }
    Ok(())
}

fn cmd_acwr(data: &DataArgs, reference: DateTime<Utc>) -> Result<(), BioCliError> {
    let (activities, biometrics) = load_data(data)?;

    let mut engine = AnalyticsEngine::with_config(EngineConfig::from_env()?);
    engine.load(activities, biometrics);

    let payload = AcwrPayload::from(&engine.acwr(reference));
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn cmd_normalize(types: Vec<String>, json: bool) -> Result<(), BioCliError> {
    let types = if types.is_empty() {
        if atty::is(atty::Stream::Stdin) {
            return Err(BioCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        types
    };

    let mappings: Vec<TypeMapping> = types
        .into_iter()
        .map(|raw| TypeMapping {
            label: ActivityNormalizer::normalize_type(&raw).to_string(),
            raw,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&mappings)?);
    } else {
        for mapping in &mappings {
            println!("{} -> {}", mapping.raw, mapping.label);
        }
    }
    Ok(())
}

fn cmd_calendar(data: &DataArgs, year: i32, month: u32) -> Result<(), BioCliError> {
    let (activities, biometrics) = load_data(data)?;

    let mut engine = AnalyticsEngine::new();
    engine.load(activities, biometrics);

    let calendar = engine.calendar(year, month)?;
    println!("{}", serde_json::to_string_pretty(&calendar)?);
    Ok(())
}

fn cmd_validate(data: &DataArgs, json: bool) -> Result<(), BioCliError> {
    let (activities, biometrics) = load_data(data)?;

    let activity_results = RecordAdapter::validate_activities(&activities);
    let biometric_results = RecordAdapter::validate_biometrics(&biometrics);

    let report = ValidationReport {
        total_activities: activities.len(),
        invalid_activities: activity_results.len(),
        total_biometrics: biometrics.len(),
        invalid_biometrics: biometric_results.len(),
        errors: error_details("activity", &activity_results)
            .chain(error_details("biometric", &biometric_results))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!(
            "Activities: {} total, {} invalid",
            report.total_activities, report.invalid_activities
        );
        println!(
            "Biometrics: {} total, {} invalid",
            report.total_biometrics, report.invalid_biometrics
        );

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - {} {} (index {}): {}",
                    err.kind,
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    let invalid = report.invalid_activities + report.invalid_biometrics;
    if invalid > 0 {
        Err(BioCliError::ValidationFailed(invalid))
    } else {
        Ok(())
    }
}

fn error_details<'a>(
    kind: &'static str,
    results: &'a [ValidationResult],
) -> impl Iterator<Item = ValidationErrorDetail> + 'a {
    results.iter().flat_map(move |result| {
        result.errors.iter().map(move |error| ValidationErrorDetail {
            kind,
            index: result.index,
            record_id: result.record_id.as_ref().map(|id| id.to_string()),
            error: error.to_string(),
        })
    })
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), BioCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, ENGINE_VERSION),
    });

    checks.push(match EngineConfig::from_env() {
        Ok(config) => DoctorCheck {
            name: "environment".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "page size {}, windows {}/{} days",
                config.page_size, config.acute_window_days, config.chronic_window_days
            ),
        },
        Err(e) => DoctorCheck {
            name: "environment".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(path) = config {
        let check = if !path.exists() {
            DoctorCheck {
                name: "config_file".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(_) => DoctorCheck {
                        name: "config_file".to_string(),
                        status: CheckStatus::Ok,
                        message: "Config file valid".to_string(),
                    },
                    Err(e) => DoctorCheck {
                        name: "config_file".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config_file".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (interactive mode)".to_string()
        } else {
            "stdin is a pipe (ready for - inputs)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("BioEngine Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(BioCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, BioCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_data(data: &DataArgs) -> Result<(Vec<ActivityRecord>, Vec<BiometricRecord>), BioCliError> {
    let activities_json = read_input(&data.activities)?;
    let biometrics_json = match &data.biometrics {
        Some(path) => read_input(path)?,
        None => "[]".to_string(),
    };

    if data.lenient {
        return Ok((
            RecordAdapter::parse_activities_or_empty(&activities_json),
            RecordAdapter::parse_biometrics_or_empty(&biometrics_json),
        ));
    }
    Ok((
        RecordAdapter::parse_activities(&activities_json)?,
        RecordAdapter::parse_biometrics(&biometrics_json)?,
    ))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, BioCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::from_env()?),
    }
}

fn resolve_reference(raw: Option<&str>) -> Result<DateTime<Utc>, BioCliError> {
    match raw {
        Some(raw) => Ok(parse_timestamp(raw)?),
        None => Ok(Utc::now()),
    }
}

// Error types

#[derive(Debug)]
enum BioCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoInput,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for BioCliError {
    fn from(e: io::Error) -> Self {
        BioCliError::Io(e)
    }
}

impl From<EngineError> for BioCliError {
    fn from(e: EngineError) -> Self {
        BioCliError::Engine(e)
    }
}

impl From<serde_json::Error> for BioCliError {
    fn from(e: serde_json::Error) -> Self {
        BioCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BioCliError> for CliError {
    fn from(e: BioCliError) -> Self {
        match e {
            BioCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BioCliError::Engine(e) => engine_error(e),
            BioCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BioCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No activity types given".to_string(),
                hint: Some("Pass types as arguments or pipe them on stdin".to_string()),
            },
            BioCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Invalid records are still usable; fields that fail are ignored".to_string()),
            },
            BioCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn engine_error(e: EngineError) -> CliError {
    let (code, hint) = match &e {
        EngineError::ParseError(_) | EngineError::JsonError(_) => (
            "PARSE_ERROR",
            "Inputs must be a JSON array of records, or an object with a data array; try --lenient",
        ),
        EngineError::InvalidFilter(_) => (
            "INVALID_FILTER",
            "Date: all|7d|30d|90d|week|month|3months|year; metric: none|weight_max|dist_top10|pace_max|...",
        ),
        EngineError::InvalidConfig(_) => (
            "INVALID_CONFIG",
            "Check BIOENGINE_* variables or the --config file",
        ),
        EngineError::DateParseError(_) => (
            "INVALID_DATE",
            "Use RFC 3339 (2025-06-01T08:00:00Z) or YYYY-MM-DD",
        ),
        EngineError::InvalidMonth { .. } => ("INVALID_MONTH", "Month must be between 1 and 12"),
        EngineError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct TypeMapping {
    raw: String,
    label: String,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_activities: usize,
    invalid_activities: usize,
    total_biometrics: usize,
    invalid_biometrics: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    kind: &'static str,
    index: usize,
    record_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
