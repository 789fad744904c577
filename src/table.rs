//! CSV table reader with a column-presence check.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AlarmError;

/// Reads every row of the CSV file at `path` into `T`.
///
/// # Errors
///
/// - [`AlarmError::NotFound`] if `path` does not exist.
/// - [`AlarmError::Schema`] if the header lacks any of `required`; every
///   missing name is reported, in `required` order.
/// - [`AlarmError::Unknown`] for unreadable files and rows that fail to
///   deserialize.
pub fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, AlarmError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AlarmError::not_found(path),
        _ => AlarmError::from(e),
    })?;

    // Short rows are tolerated; absent cells deserialize as missing values.
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = rdr.headers()?.clone();

    let missing = missing_columns(&headers, required);
    if !missing.is_empty() {
        return Err(AlarmError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "Table loaded");
    Ok(rows)
}

/// Returns the entries of `required` that are not present in `headers`.
pub fn missing_columns(headers: &StringRecord, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{GradeRecord, StudentRef};
    use std::fs;

    const GRADE_COLUMNS: &[&str] = &["student_id", "course_id", "assignment_title", "score"];

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        let err = read_table::<GradeRecord>(&path, GRADE_COLUMNS).unwrap_err();
        match err {
            AlarmError::NotFound { path: reported } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "grades.csv", "student_id,course_id\nS1,C1\n");
        let err = read_table::<GradeRecord>(&path, GRADE_COLUMNS).unwrap_err();
        match err {
            AlarmError::Schema { missing, .. } => {
                assert_eq!(missing, vec!["assignment_title", "score"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extra_columns_and_order_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "grades.csv",
            "score,term,assignment_title,course_id,student_id\n40,T1,A1,C1,S1\n",
        );
        let rows = read_table::<GradeRecord>(&path, GRADE_COLUMNS).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, "S1");
        assert_eq!(rows[0].score, Some(40.0));
    }

    #[test]
    fn test_header_only_file_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "alarm.csv", "student_id,course_id,date\n");
        let rows = read_table::<StudentRef>(&path, StudentRef::REQUIRED_COLUMNS).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_bad_row_is_unknown_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "grades.csv",
            "student_id,course_id,assignment_title,score\nS1,C1,A1,forty\n",
        );
        let err = read_table::<GradeRecord>(&path, GRADE_COLUMNS).unwrap_err();
        assert_eq!(err.kind(), "UnknownError");
        assert!(err.to_string().contains("forty"));
    }
}
