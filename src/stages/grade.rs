//! Grade filter: flags assignments scored below 50.

use crate::config::Layout;
use crate::error::AlarmError;
use crate::records::{GradeAlarmRecord, GradeRecord};
use crate::stages::run_filter;

/// Filters `data/grades.csv` into `output/grade_alarm.csv`.
#[tracing::instrument(skip(layout), fields(root = %layout.root().display()))]
pub fn process_grades(layout: &Layout) -> Result<Vec<GradeAlarmRecord>, AlarmError> {
    run_filter::<GradeRecord>(
        &layout.grades_input(),
        &layout.output_dir(),
        &layout.grade_alarm_output(),
    )
}
