//! Alarm aggregation and classification.
//!
//! Counts flagged rows per student in each filtered file, applies the
//! minimum-count thresholds and classifies every student that qualifies for
//! at least one alarm.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::Layout;
use crate::error::AlarmError;
use crate::output::write_table;
use crate::records::{AlarmType, StudentAlarm, StudentRef, compare_student_ids};
use crate::table::read_table;
use crate::thresholds::{ATTENDANCE_MIN_COUNT, GRADE_MIN_COUNT};

/// Merges `output/attendance_alarm.csv` and `output/grade_alarm.csv` into
/// `output/student_alarm.csv`.
///
/// Fails with [`AlarmError::NotFound`] naming the first missing input; the
/// attendance file is checked first. Nothing is written on failure.
#[tracing::instrument(skip(layout), fields(root = %layout.root().display()))]
pub fn process_student_alarm(layout: &Layout) -> Result<Vec<StudentAlarm>, AlarmError> {
    let attendance: Vec<StudentRef> =
        read_table(&layout.attendance_alarm_output(), StudentRef::REQUIRED_COLUMNS)?;
    let grades: Vec<StudentRef> =
        read_table(&layout.grade_alarm_output(), StudentRef::REQUIRED_COLUMNS)?;

    let alarms = build_student_alarms(
        attendance.iter().map(|r| r.student_id.as_str()),
        grades.iter().map(|r| r.student_id.as_str()),
    );

    let output = layout.student_alarm_output();
    write_table(&output, StudentAlarm::COLUMNS, &alarms)?;

    info!(
        attendance_rows = attendance.len(),
        grade_rows = grades.len(),
        students = alarms.len(),
        output = %output.display(),
        "Student alarms written"
    );
    Ok(alarms)
}

/// Number of occurrences of each student id.
pub fn count_by_student<'a>(ids: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Classifies every student meeting either count threshold.
///
/// Returns one row per qualifying student, sorted by student id.
pub fn build_student_alarms<'a>(
    attendance_ids: impl IntoIterator<Item = &'a str>,
    grade_ids: impl IntoIterator<Item = &'a str>,
) -> Vec<StudentAlarm> {
    let attendance_counts = count_by_student(attendance_ids);
    let grade_counts = count_by_student(grade_ids);

    // (attendance alarm, grade alarm)
    let mut flags: HashMap<&str, (bool, bool)> = HashMap::new();

    for (id, count) in &attendance_counts {
        if *count >= ATTENDANCE_MIN_COUNT {
            flags.entry(*id).or_default().0 = true;
        }
    }
    for (id, count) in &grade_counts {
        if *count >= GRADE_MIN_COUNT {
            flags.entry(*id).or_default().1 = true;
        }
    }

    debug!(
        attendance_students = attendance_counts.len(),
        grade_students = grade_counts.len(),
        flagged = flags.len(),
        "Counts thresholded"
    );

    let mut alarms: Vec<StudentAlarm> = flags
        .into_iter()
        .filter_map(|(id, (attendance, grade))| {
            AlarmType::classify(attendance, grade).map(|alarm_type| StudentAlarm {
                student_id: id.to_string(),
                alarm_type,
            })
        })
        .collect();

    alarms.sort_by(|a, b| compare_student_ids(&a.student_id, &b.student_id));
    alarms
}
