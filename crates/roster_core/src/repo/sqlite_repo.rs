//! SQLite-backed student repository.
//!
//! # Responsibility
//! - Provide the student repository contract over the `students` table.
//! - Keep SQL details and driver errors inside the persistence boundary.
//!
//! # Invariants
//! - Every operation opens its own connection and drops it on every exit
//!   path; no connection is shared between calls.
//! - Uniqueness is pre-checked with a read before each write; the schema's
//!   `UNIQUE` constraint backs it up and is reported as `DuplicateEmail`,
//!   never as a raw driver error.
//! - Read paths re-validate rows and reject invalid persisted state.

use crate::db::{open_db, open_db_shared_memory, DbResult};
use crate::model::student::{Student, StudentId, StudentValidationError};
use crate::repo::student_repo::{email_key, major_key, RepoError, RepoResult, StudentRepository};
use chrono::NaiveDate;
use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    major,
    enrollment_date,
    active
FROM students";

const NAME_ORDER_SQL: &str = "ORDER BY last_name ASC, first_name ASC, id ASC";

enum Location {
    File(PathBuf),
    SharedMemory {
        name: String,
        // Keeps the shared-cache database alive between per-call connections.
        _anchor: Mutex<Connection>,
    },
}

/// Where the relational store lives and how to reach it.
pub struct StudentDatabase {
    location: Location,
}

impl StudentDatabase {
    /// Uses a database file, creating it and applying migrations up front.
    pub fn file(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        drop(open_db(&path)?);
        Ok(Self {
            location: Location::File(path),
        })
    }

    /// Uses a private in-memory database that lives as long as this value.
    pub fn in_memory() -> DbResult<Self> {
        let name = format!("roster-{}", Uuid::new_v4().simple());
        let anchor = open_db_shared_memory(&name)?;
        Ok(Self {
            location: Location::SharedMemory {
                name,
                _anchor: Mutex::new(anchor),
            },
        })
    }

    /// Opens a fresh, migrated connection for one unit of work.
    pub fn connect(&self) -> DbResult<Connection> {
        match &self.location {
            Location::File(path) => open_db(path),
            Location::SharedMemory { name, .. } => open_db_shared_memory(name),
        }
    }
}

/// Student repository over a SQLite `students` table.
pub struct SqliteStudentRepository {
    db: StudentDatabase,
}

impl SqliteStudentRepository {
    pub fn new(db: StudentDatabase) -> Self {
        Self { db }
    }

    /// Shorthand for a repository over a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(StudentDatabase::file(path)?))
    }

    /// Shorthand for a repository over a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(StudentDatabase::in_memory()?))
    }

    fn query_students(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Student>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Option<Student>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }
        Ok(None)
    }
}

impl StudentRepository for SqliteStudentRepository {
    fn create(&self, student: &Student) -> RepoResult<Student> {
        student.validate()?;

        let conn = self.db.connect()?;
        if email_taken(&conn, student.email(), None)? {
            warn!(
                "event=student_create module=repo.sqlite status=error error_code=EMAIL_DUPLICADO"
            );
            return Err(RepoError::DuplicateEmail(student.email().to_string()));
        }

        conn.execute(
            "INSERT INTO students (
                first_name,
                last_name,
                email,
                major,
                enrollment_date,
                active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                student.first_name(),
                student.last_name(),
                student.email(),
                student.major(),
                student.enrollment_date(),
                student.is_active(),
            ],
        )
        .map_err(|err| map_write_error(err, student.email()))?;

        let id = conn.last_insert_rowid();
        let mut stored = student.clone();
        stored.assign_id(id);

        info!("event=student_create module=repo.sqlite status=ok id={id}");
        Ok(stored)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        self.query_one(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"), [id])
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        let key = email_key(email)?;
        self.query_one(
            &format!("{STUDENT_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
            [key],
        )
    }

    fn list_all(&self) -> RepoResult<Vec<Student>> {
        self.query_students(
            &format!("{STUDENT_SELECT_SQL} WHERE active = 1 {NAME_ORDER_SQL};"),
            [],
        )
    }

    fn list_by_major(&self, major: &str) -> RepoResult<Vec<Student>> {
        let major = major_key(major)?;
        self.query_students(
            &format!(
                "{STUDENT_SELECT_SQL}
                 WHERE active = 1
                   AND major = ?1 COLLATE NOCASE
                 {NAME_ORDER_SQL};"
            ),
            [major],
        )
    }

    fn update(&self, student: &Student) -> RepoResult<Student> {
        let id = student.id().ok_or(RepoError::MissingId)?;
        student.validate()?;

        let conn = self.db.connect()?;
        if !row_exists(&conn, id)? {
            warn!(
                "event=student_update module=repo.sqlite status=error id={id} error_code=ESTUDIANTE_NO_ENCONTRADO"
            );
            return Err(RepoError::NotFound(id));
        }
        if email_taken(&conn, student.email(), Some(id))? {
            warn!(
                "event=student_update module=repo.sqlite status=error id={id} error_code=EMAIL_DUPLICADO"
            );
            return Err(RepoError::DuplicateEmail(student.email().to_string()));
        }

        let changed = conn
            .execute(
                "UPDATE students
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    email = ?3,
                    major = ?4,
                    enrollment_date = ?5,
                    active = ?6
                 WHERE id = ?7;",
                params![
                    student.first_name(),
                    student.last_name(),
                    student.email(),
                    student.major(),
                    student.enrollment_date(),
                    student.is_active(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, student.email()))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=student_update module=repo.sqlite status=ok id={id}");
        Ok(student.clone())
    }

    fn delete(&self, id: StudentId) -> RepoResult<bool> {
        let conn = self.db.connect()?;
        let changed = conn.execute("UPDATE students SET active = 0 WHERE id = ?1;", [id])?;

        if changed == 0 {
            warn!(
                "event=student_delete module=repo.sqlite status=error id={id} error_code=ESTUDIANTE_NO_ENCONTRADO"
            );
            return Err(RepoError::NotFound(id));
        }

        info!("event=student_delete module=repo.sqlite status=ok id={id}");
        Ok(true)
    }

    fn exists(&self, id: StudentId) -> RepoResult<bool> {
        let conn = self.db.connect()?;
        row_exists(&conn, id)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let key = email_key(email)?;
        let conn = self.db.connect()?;
        email_taken(&conn, &key, None)
    }

    fn count(&self) -> RepoResult<u64> {
        let conn = self.db.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM students WHERE active = 1;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
    }
}

fn row_exists(conn: &Connection, id: StudentId) -> RepoResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM students WHERE id = ?1;", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn email_taken(conn: &Connection, email: &str, exclude: Option<StudentId>) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1
             FROM students
             WHERE email = ?1 COLLATE NOCASE
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            params![email, exclude],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn map_write_error(err: rusqlite::Error, email: &str) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::DuplicateEmail(email.to_string())
        }
        other => other.into(),
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let id: StudentId = row.get("id")?;
    let enrollment_date: NaiveDate = row.get("enrollment_date")?;

    let active = match row.get::<_, i64>("active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid active value `{other}` in students.active for id {id}"
            )));
        }
    };

    let invalid = |err: StudentValidationError| RepoError::InvalidData(format!("student {id}: {err}"));
    let mut student = Student::with_id(
        id,
        &row.get::<_, String>("first_name")?,
        &row.get::<_, String>("last_name")?,
        &row.get::<_, String>("email")?,
        &row.get::<_, String>("major")?,
    )
    .map_err(invalid)?;
    student.set_enrollment_date(enrollment_date).map_err(invalid)?;
    student.set_active(active);
    Ok(student)
}
