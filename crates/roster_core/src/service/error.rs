//! Service error taxonomy.
//!
//! # Responsibility
//! - Classify every service failure into one of four categories with a
//!   stable code and a human message.
//! - Map repository errors deterministically into that taxonomy.
//!
//! # Invariants
//! - Duplicate-email and not-found conditions are `Business`, whether the
//!   service detected them itself or the repository reported them.
//! - Malformed input is `Validation`; storage failures are `Data`;
//!   internal inconsistencies are `System`.

use crate::repo::student_repo::RepoError;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const CODE_DUPLICATE_EMAIL: &str = "EMAIL_DUPLICADO";
pub const CODE_NOT_FOUND: &str = "ESTUDIANTE_NO_ENCONTRADO";
pub const CODE_INVALID_DATA: &str = "DATOS_INVALIDOS";
pub const CODE_MISSING_ID: &str = "ID_NULO";
pub const CODE_BLANK_EMAIL: &str = "EMAIL_VACIO";
pub const CODE_BLANK_MAJOR: &str = "CARRERA_VACIA";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure category surfaced to presentation callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Business rule violation (duplicate email, missing student).
    Business,
    /// Storage failure.
    Data,
    /// Unexpected internal failure.
    System,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Business => "business",
            Self::Data => "data",
            Self::System => "system",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every `StudentService` operation.
#[derive(Debug, Error)]
#[error("{kind} error [{code}]: {message}")]
pub struct ServiceError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
    #[source]
    source: Option<RepoError>,
}

impl ServiceError {
    fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Business, code, message)
    }

    pub fn system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::System, code, message)
    }

    /// Maps a repository failure raised while running operation `op_code`.
    ///
    /// `op_code` is used only for storage failures, where the repository code
    /// (`SQL_ERROR`, `DATOS_CORRUPTOS`) says nothing about what was attempted.
    pub fn from_repo(op_code: &'static str, context: &str, err: RepoError) -> Self {
        let (kind, code) = match &err {
            RepoError::DuplicateEmail(_) => (ErrorKind::Business, CODE_DUPLICATE_EMAIL),
            RepoError::NotFound(_) => (ErrorKind::Business, CODE_NOT_FOUND),
            RepoError::Validation(_)
            | RepoError::MissingId
            | RepoError::BlankEmail
            | RepoError::BlankMajor => (ErrorKind::Validation, err.code()),
            RepoError::Db(_) | RepoError::InvalidData(_) => (ErrorKind::Data, op_code),
        };
        Self {
            kind,
            code,
            message: format!("{context}: {err}"),
            source: Some(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped repository error, when one caused this failure.
    pub fn repo_error(&self) -> Option<&RepoError> {
        self.source.as_ref()
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_business(&self) -> bool {
        self.kind == ErrorKind::Business
    }

    pub fn is_data(&self) -> bool {
        self.kind == ErrorKind::Data
    }

    pub fn is_system(&self) -> bool {
        self.kind == ErrorKind::System
    }
}
