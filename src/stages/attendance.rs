//! Attendance filter: flags sessions with status below 1.

use crate::config::Layout;
use crate::error::AlarmError;
use crate::records::{AttendanceAlarmRecord, AttendanceRecord};
use crate::stages::run_filter;

/// Filters `data/attendance_time.csv` into `output/attendance_alarm.csv`.
#[tracing::instrument(skip(layout), fields(root = %layout.root().display()))]
pub fn process_attendance(layout: &Layout) -> Result<Vec<AttendanceAlarmRecord>, AlarmError> {
    run_filter::<AttendanceRecord>(
        &layout.attendance_input(),
        &layout.output_dir(),
        &layout.attendance_alarm_output(),
    )
}
