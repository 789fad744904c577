//! The three pipeline stages.
//!
//! The grade and attendance filters share [`run_filter`]; the aggregator in
//! [`student_alarm`] reads both filtered files back and classifies students.

pub mod attendance;
pub mod grade;
pub mod student_alarm;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::AlarmError;
use crate::output::write_table;
use crate::records::AlarmSource;
use crate::table::read_table;

/// Keeps the rows that cross their threshold, projected, in input order.
pub fn filter_alarms<R: AlarmSource>(rows: impl IntoIterator<Item = R>) -> Vec<R::Alarm> {
    rows.into_iter().filter_map(R::into_alarm).collect()
}

/// Reads `input`, filters it and writes the alarm rows to `output`.
///
/// `output_dir` is created before anything is read, so it exists even when
/// the stage fails.
pub(crate) fn run_filter<R: AlarmSource>(
    input: &Path,
    output_dir: &Path,
    output: &Path,
) -> Result<Vec<R::Alarm>, AlarmError> {
    fs::create_dir_all(output_dir)?;

    let rows: Vec<R> = read_table(input, R::REQUIRED_COLUMNS)?;
    let total = rows.len();
    let alarms = filter_alarms(rows);

    write_table(output, R::ALARM_COLUMNS, &alarms)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        total,
        flagged = alarms.len(),
        "Filter applied"
    );
    Ok(alarms)
}
