//! CLI entry point for the student alarm pipeline.
//!
//! With no arguments it runs the grade filter, the attendance filter and the
//! alarm aggregator in order against the current installation root.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use student_alarm::{Layout, Selection, Stage, output, pipeline};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "student_alarm")]
#[command(about = "Flags students with low grades or poor attendance", long_about = None)]
struct Cli {
    /// Installation root containing data/ and output/ (defaults to $STUDENT_ALARM_ROOT or .)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Number of student alarms shown after a run
    #[arg(long, global = true, default_value_t = 5)]
    preview: usize,

    /// Print the run summary as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all stages in order (default)
    Run,
    /// Filter data/grades.csv into output/grade_alarm.csv
    Grades,
    /// Filter data/attendance_time.csv into output/attendance_alarm.csv
    Attendance,
    /// Merge the filtered files into output/student_alarm.csv
    Alarms,
}

impl Commands {
    fn selection(&self) -> Selection {
        match self {
            Commands::Run => Selection::All,
            Commands::Grades => Selection::Only(Stage::GradeFilter),
            Commands::Attendance => Selection::Only(Stage::AttendanceFilter),
            Commands::Alarms => Selection::Only(Stage::AlarmAggregator),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    let layout = match cli.root {
        Some(root) => Layout::new(root),
        None => Layout::from_env(),
    };
    let selection = cli
        .command
        .as_ref()
        .map(Commands::selection)
        .unwrap_or(Selection::All);

    let summary = pipeline::run(&layout, selection);

    output::print_pretty(&summary);
    if cli.json {
        output::print_json(&summary)?;
    } else {
        output::print_summary(&summary, cli.preview);
    }

    info!(failed = summary.has_failures(), "Run finished");
    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/student_alarm.log".to_string());

    let file_appender = file_appender(Path::new(&log_file_path))?;
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Daily rolling appender for `log_file_path`. Fails instead of panicking
/// when the log directory cannot be created.
fn file_appender(log_file_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("student_alarm.log"));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_file_name.to_string_lossy().into_owned())
        .build(log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;
    Ok(appender)
}
