//! Student domain model.
//!
//! # Responsibility
//! - Define the canonical student record persisted by every backend.
//! - Enforce per-field invariants at the point of assignment.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `id` is `None` until a repository assigns it, and is never reassigned.
//! - Names and major are stored trimmed and are never blank.
//! - `email` is stored trimmed and lower-cased and passes [`is_valid_email`].
//! - `enrollment_date` is never after the local calendar date at validation.
//! - `active` is the source of truth for soft-delete state.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Repository-assigned identity of a student.
pub type StudentId = i64;

// One `@`, non-empty local part, dotted domain that neither starts nor ends
// with `.`, and no leading/trailing `@` or `.` on the whole address.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@.][^@]*@[^@.][^@]*\.[^@]*[^@.]$").expect("valid email regex"));

/// Field-level validation failure raised by [`Student`] setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentValidationError {
    #[error("first name must not be blank")]
    BlankFirstName,
    #[error("last name must not be blank")]
    BlankLastName,
    #[error("email `{0}` is not a valid address")]
    InvalidEmail(String),
    #[error("major must not be blank")]
    BlankMajor,
    #[error("enrollment date {date} is after today ({today})")]
    FutureEnrollmentDate { date: NaiveDate, today: NaiveDate },
}

impl StudentValidationError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankFirstName => "NOMBRE_REQUERIDO",
            Self::BlankLastName => "APELLIDO_REQUERIDO",
            Self::InvalidEmail(_) => "EMAIL_INVALIDO",
            Self::BlankMajor => "CARRERA_REQUERIDA",
            Self::FutureEnrollmentDate { .. } => "FECHA_FUTURA",
        }
    }
}

pub type ValidationResult<T> = Result<T, StudentValidationError>;

/// Returns the local calendar date used for enrollment checks.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Checks the structural email rule on the trimmed input.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Trims and lower-cases `email` when it is structurally valid.
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    if !is_valid_email(email) {
        return Err(StudentValidationError::InvalidEmail(email.trim().to_string()));
    }
    Ok(email.trim().to_lowercase())
}

fn non_blank(value: &str, err: StudentValidationError) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

fn not_in_future(date: NaiveDate) -> ValidationResult<NaiveDate> {
    let today = today();
    if date > today {
        return Err(StudentValidationError::FutureEnrollmentDate { date, today });
    }
    Ok(date)
}

/// Canonical student record.
///
/// Fields are private so every mutation goes through a validating setter.
/// Values handed out by repositories are owned clones; mutating one has no
/// effect on stored state until it is passed back to `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StudentRecord")]
pub struct Student {
    id: Option<StudentId>,
    first_name: String,
    last_name: String,
    email: String,
    major: String,
    enrollment_date: NaiveDate,
    active: bool,
}

impl Student {
    /// Creates an unsaved student enrolled today.
    ///
    /// # Invariants
    /// - `id` starts as `None`.
    /// - `active` starts as `true`.
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        major: &str,
    ) -> ValidationResult<Self> {
        Ok(Self {
            id: None,
            first_name: non_blank(first_name, StudentValidationError::BlankFirstName)?,
            last_name: non_blank(last_name, StudentValidationError::BlankLastName)?,
            email: normalize_email(email)?,
            major: non_blank(major, StudentValidationError::BlankMajor)?,
            enrollment_date: today(),
            active: true,
        })
    }

    /// Creates a student with a known identity.
    ///
    /// Used when rebuilding persisted rows and when mapping transfer objects
    /// that already carry an id.
    pub fn with_id(
        id: StudentId,
        first_name: &str,
        last_name: &str,
        email: &str,
        major: &str,
    ) -> ValidationResult<Self> {
        let mut student = Self::new(first_name, last_name, email, major)?;
        student.id = Some(id);
        Ok(student)
    }

    pub fn id(&self) -> Option<StudentId> {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    pub fn enrollment_date(&self) -> NaiveDate {
        self.enrollment_date
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `first_name + " " + last_name`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn set_first_name(&mut self, value: &str) -> ValidationResult<()> {
        self.first_name = non_blank(value, StudentValidationError::BlankFirstName)?;
        Ok(())
    }

    pub fn set_last_name(&mut self, value: &str) -> ValidationResult<()> {
        self.last_name = non_blank(value, StudentValidationError::BlankLastName)?;
        Ok(())
    }

    pub fn set_email(&mut self, value: &str) -> ValidationResult<()> {
        self.email = normalize_email(value)?;
        Ok(())
    }

    pub fn set_major(&mut self, value: &str) -> ValidationResult<()> {
        self.major = non_blank(value, StudentValidationError::BlankMajor)?;
        Ok(())
    }

    pub fn set_enrollment_date(&mut self, value: NaiveDate) -> ValidationResult<()> {
        self.enrollment_date = not_in_future(value)?;
        Ok(())
    }

    /// Builder form of [`Student::set_enrollment_date`].
    pub fn enrolled_on(mut self, value: NaiveDate) -> ValidationResult<Self> {
        self.set_enrollment_date(value)?;
        Ok(self)
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Clears the soft-delete state.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Marks this student as softly deleted.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Re-checks every field invariant.
    ///
    /// Setters already enforce these rules; repositories call this on every
    /// write and read path so a stale date or a hand-built row cannot slip
    /// through.
    pub fn validate(&self) -> ValidationResult<()> {
        non_blank(&self.first_name, StudentValidationError::BlankFirstName)?;
        non_blank(&self.last_name, StudentValidationError::BlankLastName)?;
        normalize_email(&self.email)?;
        non_blank(&self.major, StudentValidationError::BlankMajor)?;
        not_in_future(self.enrollment_date)?;
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: StudentId) {
        self.id = Some(id);
    }
}

/// Unvalidated wire shape; converted through the same setters as callers use.
#[derive(Deserialize)]
struct StudentRecord {
    #[serde(default)]
    id: Option<StudentId>,
    first_name: String,
    last_name: String,
    email: String,
    major: String,
    enrollment_date: NaiveDate,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl TryFrom<StudentRecord> for Student {
    type Error = StudentValidationError;

    fn try_from(record: StudentRecord) -> Result<Self, Self::Error> {
        let mut student = Student::new(
            &record.first_name,
            &record.last_name,
            &record.email,
            &record.major,
        )?;
        student.id = record.id;
        student.set_enrollment_date(record.enrollment_date)?;
        student.set_active(record.active);
        Ok(student)
    }
}
