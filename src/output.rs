//! Output formatting and persistence for stage results.
//!
//! Supports writing CSV tables, a text run summary, and JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::AlarmError;
use crate::pipeline::{RunSummary, StageOutcome};
use crate::records::StudentAlarm;

/// Writes `rows` as a CSV table with the given header row.
///
/// The header is written even when `rows` is empty. The table is serialized
/// in memory, written to a sibling `.tmp` file and renamed into place, so a
/// failure never leaves a partial file at `path`.
pub fn write_table<R: Serialize>(path: &Path, headers: &[&str], rows: &[R]) -> Result<(), AlarmError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AlarmError::Unknown(e.to_string()))?;

    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    debug!(path = %path.display(), rows = rows.len(), bytes = bytes.len(), "Table written");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Logs the run summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &RunSummary) {
    debug!("{:#?}", summary);
}

/// Prints the run summary as pretty-printed JSON to stdout.
pub fn print_json(summary: &RunSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Prints the human-readable run summary to stdout, followed by a preview of
/// at most `preview` student alarms.
pub fn print_summary(summary: &RunSummary, preview: usize) {
    print!("{}", render_summary(summary, preview));
}

pub fn render_summary(summary: &RunSummary, preview: usize) -> String {
    let mut out = String::new();

    for report in &summary.stages {
        match &report.outcome {
            StageOutcome::Completed { rows, output } => {
                out.push_str(&format!(
                    "{} complete: {}\n",
                    report.stage,
                    report.stage.describe_rows(*rows)
                ));
                out.push_str(&format!("  saved to {}\n", output.display()));
            }
            StageOutcome::Failed {
                kind,
                message,
                hint,
            } => {
                out.push_str(&format!("{} failed ({kind}): {message}\n", report.stage));
                if let Some(hint) = hint {
                    out.push_str(&format!("  {hint}\n"));
                }
            }
            StageOutcome::Skipped { reason } => {
                out.push_str(&format!("{} skipped: {reason}\n", report.stage));
            }
        }
    }

    if let Some(alarms) = &summary.student_alarms {
        if !alarms.is_empty() && preview > 0 {
            out.push_str("\n=== Student alarm preview ===\n");
            out.push_str(&render_preview(alarms, preview));
        }
    }

    out
}

fn render_preview(alarms: &[StudentAlarm], limit: usize) -> String {
    let width = alarms
        .iter()
        .take(limit)
        .map(|a| a.student_id.len())
        .max()
        .unwrap_or(0)
        .max("student_id".len());

    let mut out = format!("{:<width$}  type\n", "student_id");
    for alarm in alarms.iter().take(limit) {
        out.push_str(&format!(
            "{:<width$}  {} ({})\n",
            alarm.student_id,
            alarm.alarm_type.code(),
            alarm.alarm_type.label()
        ));
    }
    if alarms.len() > limit {
        out.push_str(&format!("... {} more\n", alarms.len() - limit));
    }
    out
}
