//! Student repository contract shared by every storage backend.
//!
//! # Responsibility
//! - Define the CRUD + uniqueness + soft-delete operations a backend must
//!   provide to be swappable behind the service.
//! - Define the repository error taxonomy and its stable codes.
//!
//! # Invariants
//! - Write paths call `Student::validate()` before touching storage.
//! - Email uniqueness is case-insensitive, spans active and inactive rows,
//!   and excludes the row being updated.
//! - `list_all`, `list_by_major` and `count` only see active rows;
//!   `find_by_id` and `find_by_email` see every row.
//! - List results are ordered by `(last_name, first_name)` ascending,
//!   byte-wise.

use crate::db::DbError;
use crate::model::student::{Student, StudentId, StudentValidationError};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error carrying a stable machine-readable code.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid student: {0}")]
    Validation(#[from] StudentValidationError),
    #[error("student id is required")]
    MissingId,
    #[error("email must not be blank")]
    BlankEmail,
    #[error("major must not be blank")]
    BlankMajor,
    #[error("a student with email `{0}` already exists")]
    DuplicateEmail(String),
    #[error("student not found: {0}")]
    NotFound(StudentId),
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("invalid persisted student data: {0}")]
    InvalidData(String),
}

impl RepoError {
    /// Stable code callers can branch on without parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::MissingId => "ID_NULO",
            Self::BlankEmail => "EMAIL_NULO",
            Self::BlankMajor => "CARRERA_NULA",
            Self::DuplicateEmail(_) => "EMAIL_DUPLICADO",
            Self::NotFound(_) => "ESTUDIANTE_NO_ENCONTRADO",
            Self::Db(_) => "SQL_ERROR",
            Self::InvalidData(_) => "DATOS_CORRUPTOS",
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for student persistence.
///
/// Implementations must be safe to share between threads; the service owns
/// one instance and may be called concurrently.
pub trait StudentRepository: Send + Sync {
    /// Persists a new student and returns the stored copy with its id.
    ///
    /// Any id on the input is ignored; the repository assigns a fresh one.
    fn create(&self, student: &Student) -> RepoResult<Student>;
    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Case-insensitive lookup; returns inactive students too.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>>;
    fn list_all(&self) -> RepoResult<Vec<Student>>;
    /// Case-insensitive (ASCII) major match over active students.
    fn list_by_major(&self, major: &str) -> RepoResult<Vec<Student>>;
    /// Replaces every field except `id`.
    fn update(&self, student: &Student) -> RepoResult<Student>;
    /// Soft-deletes the student. Returns `true` once the row is inactive.
    fn delete(&self, id: StudentId) -> RepoResult<bool>;
    fn exists(&self, id: StudentId) -> RepoResult<bool>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    /// Number of active students.
    fn count(&self) -> RepoResult<u64>;
}

impl<R: StudentRepository + ?Sized> StudentRepository for Box<R> {
    fn create(&self, student: &Student) -> RepoResult<Student> {
        (**self).create(student)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        (**self).find_by_email(email)
    }

    fn list_all(&self) -> RepoResult<Vec<Student>> {
        (**self).list_all()
    }

    fn list_by_major(&self, major: &str) -> RepoResult<Vec<Student>> {
        (**self).list_by_major(major)
    }

    fn update(&self, student: &Student) -> RepoResult<Student> {
        (**self).update(student)
    }

    fn delete(&self, id: StudentId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn exists(&self, id: StudentId) -> RepoResult<bool> {
        (**self).exists(id)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        (**self).exists_by_email(email)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }
}

/// Normalizes an email lookup key, rejecting blank input.
pub(crate) fn email_key(email: &str) -> RepoResult<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(RepoError::BlankEmail);
    }
    Ok(trimmed.to_lowercase())
}

/// Trims a major filter, rejecting blank input.
pub(crate) fn major_key(major: &str) -> RepoResult<&str> {
    let trimmed = major.trim();
    if trimmed.is_empty() {
        return Err(RepoError::BlankMajor);
    }
    Ok(trimmed)
}

/// Sorts students by `(last_name, first_name)`, then id for stability.
pub(crate) fn sort_by_name(students: &mut [Student]) {
    students.sort_by(|a, b| {
        a.last_name()
            .cmp(b.last_name())
            .then_with(|| a.first_name().cmp(b.first_name()))
            .then_with(|| a.id().cmp(&b.id()))
    });
}
