//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the student data access contract.
//! - Isolate storage details (concurrent map, SQLite) from service
//!   orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Student::validate()` before persistence.
//! - Both backends report the same semantic errors (`NotFound`,
//!   `DuplicateEmail`) with the same stable codes.

pub mod memory_repo;
pub mod sqlite_repo;
pub mod student_repo;
