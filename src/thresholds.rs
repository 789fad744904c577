//! Fixed alarm thresholds.

/// A grade row is flagged when its score is strictly below this value.
pub const SCORE_ALARM_BELOW: f64 = 50.0;

/// An attendance row is flagged when its status is strictly below this value.
pub const STATUS_ALARM_BELOW: f64 = 1.0;

/// Flagged attendance rows a student needs before raising an attendance alarm.
pub const ATTENDANCE_MIN_COUNT: usize = 3;

/// Flagged grade rows a student needs before raising a grade alarm.
pub const GRADE_MIN_COUNT: usize = 1;
