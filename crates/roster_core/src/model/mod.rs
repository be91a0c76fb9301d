//! Student domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by every storage backend.
//!
//! # Invariants
//! - Every persisted student is identified by a repository-assigned `StudentId`.
//! - Deletion is represented by the `active` flag, not by removal.

pub mod student;
