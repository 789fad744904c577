//! Installation layout.
//!
//! All stage inputs and outputs live at fixed paths below an installation
//! root:
//!
//! ```text
//! <root>/data/grades.csv
//! <root>/data/attendance_time.csv
//! <root>/output/grade_alarm.csv
//! <root>/output/attendance_alarm.csv
//! <root>/output/student_alarm.csv
//! ```

use std::path::{Path, PathBuf};

/// Environment variable naming the installation root.
pub const ROOT_ENV: &str = "STUDENT_ALARM_ROOT";

const DATA_DIR: &str = "data";
const OUTPUT_DIR: &str = "output";

const GRADES_FILE: &str = "grades.csv";
const ATTENDANCE_FILE: &str = "attendance_time.csv";
const GRADE_ALARM_FILE: &str = "grade_alarm.csv";
const ATTENDANCE_ALARM_FILE: &str = "attendance_alarm.csv";
const STUDENT_ALARM_FILE: &str = "student_alarm.csv";

/// Resolves the conventional file paths relative to an installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Uses `STUDENT_ALARM_ROOT` when set, otherwise the current directory.
    pub fn from_env() -> Self {
        let root = std::env::var(ROOT_ENV).unwrap_or_else(|_| ".".to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    pub fn grades_input(&self) -> PathBuf {
        self.data_dir().join(GRADES_FILE)
    }

    pub fn attendance_input(&self) -> PathBuf {
        self.data_dir().join(ATTENDANCE_FILE)
    }

    pub fn grade_alarm_output(&self) -> PathBuf {
        self.output_dir().join(GRADE_ALARM_FILE)
    }

    pub fn attendance_alarm_output(&self) -> PathBuf {
        self.output_dir().join(ATTENDANCE_ALARM_FILE)
    }

    pub fn student_alarm_output(&self) -> PathBuf {
        self.output_dir().join(STUDENT_ALARM_FILE)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".")
    }
}
