//! rollcall-store — student identities and attendance events over SQLite.
//!
//! The handle holds only the database path: every operation opens its
//! own connection (with foreign keys enabled), acts, commits, and
//! disconnects. No multi-call transactions exist, so the handle can be
//! cloned and shared across threads freely.
//!
//! Attendance dedup is a caller-visible check-then-insert: the select
//! yields the `AlreadyLogged` outcome, and a unique index on
//! (roll_no, attendance_date) backstops the invariant at the storage
//! layer — a constraint trip on the insert is reported as
//! `AlreadyLogged`, not as an error.

use chrono::{Local, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("roll number {0} is already enrolled")]
    DuplicateRoll(i64),
    #[error("no student with roll number {0}")]
    UnknownRoll(i64),
    #[error("student name must not be empty")]
    EmptyName,
    #[error("corrupt embedding blob: {0}")]
    CorruptEmbedding(String),
}

/// One enrolled student with their stored identity embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub roll_no: i64,
    pub name: String,
    pub embedding: Vec<f32>,
}

/// Outcome of an attendance logging attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// A new event was written for (roll_no, today).
    Created,
    /// An event for (roll_no, today) already existed; nothing written.
    AlreadyLogged,
}

/// One row of the attendance report, joined with the student name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub roll_no: i64,
    pub name: String,
    pub date: String,
    pub time: String,
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS students (
    roll_no INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    face_encoding BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance_records (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    roll_no INTEGER NOT NULL REFERENCES students(roll_no) ON DELETE CASCADE,
    attendance_date TEXT NOT NULL,
    attendance_time TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_once_per_day
    ON attendance_records (roll_no, attendance_date);
";

/// Handle to the attendance database.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database at the given path and
    /// apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        // Cascade deletes depend on this; SQLite defaults it off per
        // connection.
        conn.pragma_update(None, "foreign_keys", 1)?;
        Ok(conn)
    }

    /// Insert a new student. Fails with [`StoreError::DuplicateRoll`]
    /// when the roll number is already enrolled.
    pub fn create_student(&self, roll_no: i64, name: &str, embedding: &[f32]) -> Result<()> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let conn = self.connect()?;
        let blob = encode_embedding(embedding);
        match conn.execute(
            "INSERT INTO students (roll_no, name, face_encoding) VALUES (?1, ?2, ?3)",
            params![roll_no, name, blob],
        ) {
            Ok(_) => {
                tracing::info!(roll_no, name, "student enrolled");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateRoll(roll_no)),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored embedding for an existing student, leaving
    /// name and attendance history untouched.
    pub fn update_student_embedding(&self, roll_no: i64, embedding: &[f32]) -> Result<()> {
        let conn = self.connect()?;
        let blob = encode_embedding(embedding);
        let updated = conn.execute(
            "UPDATE students SET face_encoding = ?2 WHERE roll_no = ?1",
            params![roll_no, blob],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownRoll(roll_no));
        }
        tracing::info!(roll_no, "student embedding retrained");
        Ok(())
    }

    /// Delete a student; their attendance events go with them (cascade).
    pub fn delete_student(&self, roll_no: i64) -> Result<()> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM students WHERE roll_no = ?1", params![roll_no])?;
        if deleted == 0 {
            return Err(StoreError::UnknownRoll(roll_no));
        }
        tracing::info!(roll_no, "student deleted");
        Ok(())
    }

    /// All enrolled students with their embeddings, ordered by roll
    /// number.
    pub fn list_students(&self) -> Result<Vec<StudentRecord>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT roll_no, name, face_encoding FROM students ORDER BY roll_no")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })?;

        let mut students = Vec::new();
        for row in rows {
            let (roll_no, name, blob) = row?;
            students.push(StudentRecord {
                roll_no,
                name,
                embedding: decode_embedding(&blob)?,
            });
        }
        Ok(students)
    }

    /// Record attendance for today, at most once per student per day.
    pub fn log_attendance(&self, roll_no: i64) -> Result<LogOutcome> {
        let now = Local::now();
        self.log_attendance_at(roll_no, now.date_naive(), now.time())
    }

    fn log_attendance_at(&self, roll_no: i64, date: NaiveDate, time: NaiveTime) -> Result<LogOutcome> {
        let conn = self.connect()?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let time_str = time.format("%H:%M:%S").to_string();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT record_id FROM attendance_records
                 WHERE roll_no = ?1 AND attendance_date = ?2",
                params![roll_no, date_str],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(LogOutcome::AlreadyLogged);
        }

        match conn.execute(
            "INSERT INTO attendance_records (roll_no, attendance_date, attendance_time)
             VALUES (?1, ?2, ?3)",
            params![roll_no, date_str, time_str],
        ) {
            Ok(_) => {
                tracing::info!(roll_no, date = %date_str, time = %time_str, "attendance recorded");
                Ok(LogOutcome::Created)
            }
            // Another writer got between the check and the insert; the
            // unique index preserved the invariant.
            Err(e) if is_unique_violation(&e) => Ok(LogOutcome::AlreadyLogged),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::UnknownRoll(roll_no)),
            Err(e) => Err(e.into()),
        }
    }

    /// Full attendance report joined with student names, most recent
    /// event first.
    pub fn attendance_report(&self) -> Result<Vec<ReportRow>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT ar.roll_no, s.name, ar.attendance_date, ar.attendance_time
             FROM attendance_records ar
             JOIN students s ON ar.roll_no = s.roll_no
             ORDER BY ar.record_id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ReportRow {
                roll_no: row.get(0)?,
                name: row.get(1)?,
                date: row.get(2)?,
                time: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

/// Serialize an embedding as little-endian f32 bytes.
fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserialize an embedding blob; the dimension is implied by length.
fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::CorruptEmbedding(format!(
            "blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Store) {
        let dir = TempDir::new().expect("tempdir");
        let store = Store::open(dir.path().join("attendance.db")).expect("open store");
        (dir, store)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").expect("valid time")
    }

    #[test]
    fn create_and_list_roundtrip() {
        let (_dir, store) = open_store();
        store
            .create_student(12, "Alice", &[0.25, -1.5, 3.0])
            .expect("create");

        let students = store.list_students().expect("list");
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].roll_no, 12);
        assert_eq!(students[0].name, "Alice");
        assert_eq!(students[0].embedding, vec![0.25, -1.5, 3.0]);
    }

    #[test]
    fn duplicate_roll_is_a_distinct_error() {
        let (_dir, store) = open_store();
        store.create_student(1, "Alice", &[0.0]).expect("create");
        let err = store.create_student(1, "Bob", &[1.0]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRoll(1)));
        // Original record untouched.
        assert_eq!(store.list_students().unwrap()[0].name, "Alice");
    }

    #[test]
    fn empty_name_is_rejected() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.create_student(1, "  ", &[0.0]),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn retrain_replaces_embedding_only() {
        let (_dir, store) = open_store();
        store.create_student(5, "Carol", &[1.0, 1.0]).expect("create");
        store
            .update_student_embedding(5, &[2.0, 2.0])
            .expect("update");

        let students = store.list_students().expect("list");
        assert_eq!(students[0].name, "Carol");
        assert_eq!(students[0].embedding, vec![2.0, 2.0]);
    }

    #[test]
    fn retrain_unknown_roll_fails() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.update_student_embedding(99, &[0.0]),
            Err(StoreError::UnknownRoll(99))
        ));
    }

    #[test]
    fn delete_unknown_roll_fails() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.delete_student(99),
            Err(StoreError::UnknownRoll(99))
        ));
    }

    #[test]
    fn same_day_attendance_is_logged_once() {
        let (_dir, store) = open_store();
        store.create_student(7, "Dan", &[0.0]).expect("create");

        let d = date("2026-03-02");
        let first = store
            .log_attendance_at(7, d, time("09:00:00"))
            .expect("log");
        assert_eq!(first, LogOutcome::Created);

        for _ in 0..3 {
            let again = store
                .log_attendance_at(7, d, time("10:30:00"))
                .expect("log");
            assert_eq!(again, LogOutcome::AlreadyLogged);
        }

        let report = store.attendance_report().expect("report");
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].time, "09:00:00");
    }

    #[test]
    fn different_days_log_separately() {
        let (_dir, store) = open_store();
        store.create_student(7, "Dan", &[0.0]).expect("create");

        let t = time("09:00:00");
        assert_eq!(
            store.log_attendance_at(7, date("2026-03-02"), t).unwrap(),
            LogOutcome::Created
        );
        assert_eq!(
            store.log_attendance_at(7, date("2026-03-03"), t).unwrap(),
            LogOutcome::Created
        );
        assert_eq!(store.attendance_report().unwrap().len(), 2);
    }

    #[test]
    fn attendance_for_unknown_roll_fails() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.log_attendance(42),
            Err(StoreError::UnknownRoll(42))
        ));
    }

    #[test]
    fn deleting_a_student_cascades_their_events_only() {
        let (_dir, store) = open_store();
        store.create_student(1, "Alice", &[0.0]).expect("create");
        store.create_student(2, "Bob", &[1.0]).expect("create");

        let t = time("08:15:00");
        store.log_attendance_at(1, date("2026-03-02"), t).unwrap();
        store.log_attendance_at(2, date("2026-03-02"), t).unwrap();
        store.log_attendance_at(1, date("2026-03-03"), t).unwrap();

        store.delete_student(1).expect("delete");

        let report = store.attendance_report().expect("report");
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].roll_no, 2);
        assert_eq!(store.list_students().unwrap().len(), 1);
    }

    #[test]
    fn report_is_most_recent_first() {
        let (_dir, store) = open_store();
        store.create_student(1, "Alice", &[0.0]).expect("create");
        store.create_student(2, "Bob", &[1.0]).expect("create");

        let t = time("09:00:00");
        store.log_attendance_at(1, date("2026-03-02"), t).unwrap();
        store.log_attendance_at(2, date("2026-03-02"), t).unwrap();
        store.log_attendance_at(1, date("2026-03-03"), t).unwrap();

        let report = store.attendance_report().expect("report");
        let order: Vec<(i64, &str)> = report
            .iter()
            .map(|r| (r.roll_no, r.date.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(1, "2026-03-03"), (2, "2026-03-02"), (1, "2026-03-02")]
        );
    }

    #[test]
    fn corrupt_embedding_blob_is_rejected() {
        assert!(decode_embedding(&[1, 2, 3]).is_err());
        assert_eq!(decode_embedding(&[]).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn handle_is_shareable_across_connections() {
        let (_dir, store) = open_store();
        store.create_student(1, "Alice", &[0.0]).expect("create");

        // A cloned handle sees the same data through its own connections.
        let clone = store.clone();
        assert_eq!(clone.list_students().unwrap().len(), 1);
    }
}
