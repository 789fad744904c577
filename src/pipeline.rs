//! Sequential stage runner.
//!
//! Each stage error is caught at the stage boundary, logged, recorded in the
//! [`RunSummary`] and turned into an absent result. The aggregator only runs
//! when both filters produced a result.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Layout;
use crate::error::AlarmError;
use crate::records::StudentAlarm;
use crate::stages::{attendance, grade, student_alarm};
use crate::thresholds::{SCORE_ALARM_BELOW, STATUS_ALARM_BELOW};

const AGGREGATOR_HINT: &str = "run the grade and attendance filters first";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GradeFilter,
    AttendanceFilter,
    AlarmAggregator,
}

impl Stage {
    /// Short description of a successful result.
    pub fn describe_rows(self, rows: usize) -> String {
        match self {
            Stage::GradeFilter => format!("{rows} record(s) with score < {SCORE_ALARM_BELOW}"),
            Stage::AttendanceFilter => format!("{rows} record(s) with status < {STATUS_ALARM_BELOW}"),
            Stage::AlarmAggregator => format!("{rows} student(s) flagged"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GradeFilter => "Grade filter",
            Stage::AttendanceFilter => "Attendance filter",
            Stage::AlarmAggregator => "Alarm aggregator",
        };
        f.write_str(name)
    }
}

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Stage),
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed {
        rows: usize,
        output: PathBuf,
    },
    Failed {
        kind: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<&'static str>,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// What happened during one invocation.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub stages: Vec<StageReport>,
    /// Present only when the aggregator ran and succeeded.
    pub student_alarms: Option<Vec<StudentAlarm>>,
}

impl RunSummary {
    fn new(layout: &Layout) -> Self {
        Self {
            generated_at: Utc::now(),
            root: layout.root().to_path_buf(),
            stages: Vec::new(),
            student_alarms: None,
        }
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.stages
            .iter()
            .any(|r| matches!(r.outcome, StageOutcome::Failed { .. }))
    }

    /// Records a stage result and converts it into an optional value.
    fn settle<T>(
        &mut self,
        stage: Stage,
        output: PathBuf,
        result: Result<Vec<T>, AlarmError>,
    ) -> Option<Vec<T>> {
        match result {
            Ok(rows) => {
                info!(%stage, rows = rows.len(), output = %output.display(), "Stage complete");
                self.stages.push(StageReport {
                    stage,
                    outcome: StageOutcome::Completed {
                        rows: rows.len(),
                        output,
                    },
                });
                Some(rows)
            }
            Err(e) => {
                error!(%stage, kind = e.kind(), error = %e, "Stage failed");
                let hint = match (&e, stage) {
                    (AlarmError::NotFound { .. }, Stage::AlarmAggregator) => Some(AGGREGATOR_HINT),
                    _ => None,
                };
                self.stages.push(StageReport {
                    stage,
                    outcome: StageOutcome::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                        hint,
                    },
                });
                None
            }
        }
    }

    fn skip(&mut self, stage: Stage, reason: String) {
        warn!(%stage, %reason, "Stage skipped");
        self.stages.push(StageReport {
            stage,
            outcome: StageOutcome::Skipped { reason },
        });
    }
}

/// Runs the selected stages against `layout` in order.
#[tracing::instrument(skip(layout), fields(root = %layout.root().display()))]
pub fn run(layout: &Layout, selection: Selection) -> RunSummary {
    let mut summary = RunSummary::new(layout);

    match selection {
        Selection::All => {
            let grades = summary.settle(
                Stage::GradeFilter,
                layout.grade_alarm_output(),
                grade::process_grades(layout),
            );
            let attendance = summary.settle(
                Stage::AttendanceFilter,
                layout.attendance_alarm_output(),
                attendance::process_attendance(layout),
            );

            match (grades, attendance) {
                (Some(_), Some(_)) => run_aggregator(layout, &mut summary),
                (grades, _) => {
                    let missing = if grades.is_none() {
                        Stage::GradeFilter
                    } else {
                        Stage::AttendanceFilter
                    };
                    summary.skip(
                        Stage::AlarmAggregator,
                        format!("{missing} produced no result"),
                    );
                }
            }
        }
        Selection::Only(Stage::GradeFilter) => {
            summary.settle(
                Stage::GradeFilter,
                layout.grade_alarm_output(),
                grade::process_grades(layout),
            );
        }
        Selection::Only(Stage::AttendanceFilter) => {
            summary.settle(
                Stage::AttendanceFilter,
                layout.attendance_alarm_output(),
                attendance::process_attendance(layout),
            );
        }
        Selection::Only(Stage::AlarmAggregator) => run_aggregator(layout, &mut summary),
    }

    summary
}

fn run_aggregator(layout: &Layout, summary: &mut RunSummary) {
    summary.student_alarms = summary.settle(
        Stage::AlarmAggregator,
        layout.student_alarm_output(),
        student_alarm::process_student_alarm(layout),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn seed(root: &Path, grades: Option<&str>, attendance: Option<&str>) {
        let layout = Layout::new(root);
        fs::create_dir_all(layout.data_dir()).unwrap();
        if let Some(content) = grades {
            fs::write(layout.grades_input(), content).unwrap();
        }
        if let Some(content) = attendance {
            fs::write(layout.attendance_input(), content).unwrap();
        }
    }

    const GRADES: &str = "student_id,course_id,assignment_title,score\nS1,C1,A1,40\nS2,C1,A1,60\n";
    const ATTENDANCE: &str =
        "student_id,course_id,date,status\nS1,C1,d1,0\nS1,C1,d2,0\nS1,C1,d3,0\nS2,C1,d1,1\n";

    #[test]
    fn test_full_run_completes_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), Some(GRADES), Some(ATTENDANCE));
        let summary = run(&Layout::new(dir.path()), Selection::All);

        assert!(!summary.has_failures());
        assert_eq!(summary.stages.len(), 3);
        assert!(matches!(
            summary.outcome(Stage::GradeFilter),
            Some(StageOutcome::Completed { rows: 1, .. })
        ));
        assert!(matches!(
            summary.outcome(Stage::AttendanceFilter),
            Some(StageOutcome::Completed { rows: 3, .. })
        ));
        let alarms = summary.student_alarms.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].student_id, "S1");
    }

    #[test]
    fn test_failed_filter_skips_aggregator() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), Some(GRADES), None);
        let layout = Layout::new(dir.path());
        let summary = run(&layout, Selection::All);

        assert!(summary.has_failures());
        match summary.outcome(Stage::AttendanceFilter) {
            Some(StageOutcome::Failed { kind, .. }) => assert_eq!(*kind, "NotFoundError"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match summary.outcome(Stage::AlarmAggregator) {
            Some(StageOutcome::Skipped { reason }) => {
                assert_eq!(reason, "Attendance filter produced no result");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(summary.student_alarms.is_none());
        assert!(layout.grade_alarm_output().exists());
        assert!(!layout.student_alarm_output().exists());
    }

    #[test]
    fn test_empty_filter_result_still_runs_aggregator() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            dir.path(),
            Some("student_id,course_id,assignment_title,score\nS1,C1,A1,90\n"),
            Some("student_id,course_id,date,status\nS1,C1,d1,1\n"),
        );
        let layout = Layout::new(dir.path());
        let summary = run(&layout, Selection::All);

        assert_eq!(summary.student_alarms, Some(Vec::new()));
        let content = fs::read_to_string(layout.student_alarm_output()).unwrap();
        assert_eq!(content, "student_id,type\n");
    }

    #[test]
    fn test_aggregator_alone_reports_hint() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(
            &Layout::new(dir.path()),
            Selection::Only(Stage::AlarmAggregator),
        );

        match summary.outcome(Stage::AlarmAggregator) {
            Some(StageOutcome::Failed { kind, hint, message }) => {
                assert_eq!(*kind, "NotFoundError");
                assert_eq!(*hint, Some(AGGREGATOR_HINT));
                assert!(message.contains("attendance_alarm.csv"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_single_stage_selection_runs_only_that_stage() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), Some(GRADES), Some(ATTENDANCE));
        let layout = Layout::new(dir.path());
        let summary = run(&layout, Selection::Only(Stage::GradeFilter));

        assert_eq!(summary.stages.len(), 1);
        assert!(layout.grade_alarm_output().exists());
        assert!(!layout.attendance_alarm_output().exists());
    }

    #[test]
    fn test_summary_serializes_with_status_tag() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), Some(GRADES), Some(ATTENDANCE));
        let summary = run(&Layout::new(dir.path()), Selection::All);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["stages"][0]["stage"], "grade_filter");
        assert_eq!(json["stages"][0]["status"], "completed");
        assert_eq!(json["stages"][0]["rows"], 1);
        assert_eq!(json["student_alarms"][0]["type"], 2);
    }
}
