//! Row types for the input, filtered and aggregated tables.

use std::cmp::Ordering;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::thresholds::{SCORE_ALARM_BELOW, STATUS_ALARM_BELOW};

/// An input row that can be flagged and projected to an alarm row.
///
/// Both threshold filters run the same read-filter-write procedure; the
/// record type supplies the schema and the predicate.
pub trait AlarmSource: DeserializeOwned {
    type Alarm: Serialize;

    /// Columns the input file must carry. Extra columns are ignored.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Header row of the filtered output file.
    const ALARM_COLUMNS: &'static [&'static str];

    /// Returns the projected alarm row if this record crosses its threshold.
    fn into_alarm(self) -> Option<Self::Alarm>;
}

/// One row of `grades.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeRecord {
    pub student_id: String,
    pub course_id: String,
    pub assignment_title: String,
    #[serde(default, deserialize_with = "numeric")]
    pub score: Option<f64>,
}

/// One row of `grade_alarm.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeAlarmRecord {
    pub student_id: String,
    pub course_id: String,
    pub assignment_title: String,
}

impl AlarmSource for GradeRecord {
    type Alarm = GradeAlarmRecord;

    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["student_id", "course_id", "assignment_title", "score"];
    const ALARM_COLUMNS: &'static [&'static str] =
        &["student_id", "course_id", "assignment_title"];

    fn into_alarm(self) -> Option<GradeAlarmRecord> {
        match self.score {
            Some(score) if score < SCORE_ALARM_BELOW => Some(GradeAlarmRecord {
                student_id: self.student_id,
                course_id: self.course_id,
                assignment_title: self.assignment_title,
            }),
            _ => None,
        }
    }
}

/// One row of `attendance_time.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub course_id: String,
    pub date: String,
    #[serde(default, deserialize_with = "numeric")]
    pub status: Option<f64>,
}

/// One row of `attendance_alarm.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceAlarmRecord {
    pub student_id: String,
    pub course_id: String,
    pub date: String,
}

impl AlarmSource for AttendanceRecord {
    type Alarm = AttendanceAlarmRecord;

    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["student_id", "course_id", "date", "status"];
    const ALARM_COLUMNS: &'static [&'static str] = &["student_id", "course_id", "date"];

    fn into_alarm(self) -> Option<AttendanceAlarmRecord> {
        match self.status {
            Some(status) if status < STATUS_ALARM_BELOW => Some(AttendanceAlarmRecord {
                student_id: self.student_id,
                course_id: self.course_id,
                date: self.date,
            }),
            _ => None,
        }
    }
}

/// The only column the aggregator reads back from a filtered file.
#[derive(Debug, Deserialize)]
pub struct StudentRef {
    pub student_id: String,
}

impl StudentRef {
    pub const REQUIRED_COLUMNS: &'static [&'static str] = &["student_id"];
}

/// Why a student was flagged. Written as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmType {
    AttendanceOnly,
    GradeOnly,
    Both,
}

impl AlarmType {
    /// Classifies a student from its two qualification flags.
    pub fn classify(attendance: bool, grade: bool) -> Option<Self> {
        match (attendance, grade) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::AttendanceOnly),
            (false, true) => Some(Self::GradeOnly),
            (false, false) => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::AttendanceOnly => 0,
            Self::GradeOnly => 1,
            Self::Both => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AttendanceOnly => "attendance",
            Self::GradeOnly => "grade",
            Self::Both => "attendance+grade",
        }
    }
}

impl Serialize for AlarmType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One row of `student_alarm.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentAlarm {
    pub student_id: String,
    #[serde(rename = "type")]
    pub alarm_type: AlarmType,
}

impl StudentAlarm {
    pub const COLUMNS: &'static [&'static str] = &["student_id", "type"];
}

/// Orders student ids: integers numerically and before any other id, the
/// rest as plain text. Ties between equal integers ("7" and "007") fall back
/// to text so the order stays total.
pub fn compare_student_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Parses a numeric cell. Empty cells are missing values.
fn numeric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid numeric value {text:?}"))),
    }
}
