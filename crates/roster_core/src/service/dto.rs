//! Service-facing transfer shape for students.
//!
//! # Responsibility
//! - Decouple the service contract from the persisted entity.
//! - Keep the derived `full_name` in sync with the name fields.
//!
//! # Invariants
//! - `full_name == first_name + " " + last_name` after every mutation and
//!   after deserialization.

use crate::model::student::{
    is_valid_email, today, Student, StudentId, StudentValidationError, ValidationResult,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transfer object exchanged with presentation callers.
///
/// Unlike [`Student`], a DTO may hold invalid data; [`StudentDto::validate`]
/// applies the entity rules before the service acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StudentDtoRecord")]
pub struct StudentDto {
    pub id: Option<StudentId>,
    first_name: String,
    last_name: String,
    full_name: String,
    pub email: String,
    pub major: String,
    pub enrollment_date: NaiveDate,
    pub active: bool,
}

impl StudentDto {
    /// Creates an unsaved, active DTO enrolled today.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        major: impl Into<String>,
    ) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        Self {
            id: None,
            full_name: join_names(&first_name, &last_name),
            first_name,
            last_name,
            email: email.into(),
            major: major.into(),
            enrollment_date: today(),
            active: true,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
        self.full_name = join_names(&self.first_name, &self.last_name);
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.last_name = value.into();
        self.full_name = join_names(&self.first_name, &self.last_name);
    }

    /// Applies the entity field rules without building an entity.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(StudentValidationError::BlankFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(StudentValidationError::BlankLastName);
        }
        if !is_valid_email(&self.email) {
            return Err(StudentValidationError::InvalidEmail(self.email.trim().to_string()));
        }
        if self.major.trim().is_empty() {
            return Err(StudentValidationError::BlankMajor);
        }
        let today = today();
        if self.enrollment_date > today {
            return Err(StudentValidationError::FutureEnrollmentDate {
                date: self.enrollment_date,
                today,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Builds the entity, running every setter's validation.
    pub fn to_student(&self) -> ValidationResult<Student> {
        let student = match self.id {
            Some(id) => Student::with_id(
                id,
                &self.first_name,
                &self.last_name,
                &self.email,
                &self.major,
            )?,
            None => Student::new(&self.first_name, &self.last_name, &self.email, &self.major)?,
        };
        let mut student = student.enrolled_on(self.enrollment_date)?;
        student.set_active(self.active);
        Ok(student)
    }
}

impl From<&Student> for StudentDto {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id(),
            first_name: student.first_name().to_string(),
            last_name: student.last_name().to_string(),
            full_name: student.full_name(),
            email: student.email().to_string(),
            major: student.major().to_string(),
            enrollment_date: student.enrollment_date(),
            active: student.is_active(),
        }
    }
}

impl From<Student> for StudentDto {
    fn from(student: Student) -> Self {
        Self::from(&student)
    }
}

fn join_names(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

// `full_name` is accepted on input but always recomputed.
#[derive(Deserialize)]
struct StudentDtoRecord {
    #[serde(default)]
    id: Option<StudentId>,
    first_name: String,
    last_name: String,
    email: String,
    major: String,
    #[serde(default = "today")]
    enrollment_date: NaiveDate,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl From<StudentDtoRecord> for StudentDto {
    fn from(record: StudentDtoRecord) -> Self {
        let mut dto = StudentDto::new(
            record.first_name,
            record.last_name,
            record.email,
            record.major,
        );
        dto.id = record.id;
        dto.enrollment_date = record.enrollment_date;
        dto.active = record.active;
        dto
    }
}
