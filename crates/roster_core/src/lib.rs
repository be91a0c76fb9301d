//! Core domain logic for the student roster.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use crate::config::{DynStudentService, RosterConfig, SetupError, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::student::{Student, StudentId, StudentValidationError};
pub use repo::memory_repo::{MemoryStoreSnapshot, MemoryStudentRepository};
pub use repo::sqlite_repo::{SqliteStudentRepository, StudentDatabase};
pub use repo::student_repo::{RepoError, RepoResult, StudentRepository};
pub use service::dto::StudentDto;
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::student_service::{StudentService, StudentStatistics};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
