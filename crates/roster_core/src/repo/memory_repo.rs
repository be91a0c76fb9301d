//! In-process student repository.
//!
//! # Responsibility
//! - Keep students in a concurrent identity-keyed map.
//! - Assign ids from a monotonically increasing atomic counter.
//!
//! # Invariants
//! - Callers only ever receive clones; nothing outside this module holds a
//!   reference into the map.
//! - Uniqueness-checked writes (`create`, `update`) run under `write_lock`,
//!   so the email check and the insert are one atomic step.
//! - Ids start at 1 and are never reused, except after an explicit `clear`.

use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::{
    email_key, major_key, sort_by_name, RepoError, RepoResult, StudentRepository,
};
use dashmap::DashMap;
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

const FIRST_ID: StudentId = 1;

/// Point-in-time counters over the whole in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreSnapshot {
    /// Every stored student, active or not.
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    /// Active students grouped by major as stored.
    pub by_major: BTreeMap<String, u64>,
    /// Id the next `create` will assign.
    pub next_id: StudentId,
}

/// Thread-safe in-memory student repository.
pub struct MemoryStudentRepository {
    students: DashMap<StudentId, Student>,
    next_id: AtomicI64,
    write_lock: Mutex<()>,
}

impl Default for MemoryStudentRepository {
    fn default() -> Self {
        Self {
            students: DashMap::new(),
            next_id: AtomicI64::new(FIRST_ID),
            write_lock: Mutex::new(()),
        }
    }
}

impl MemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every student and restarts id assignment at 1.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.students.clear();
        self.next_id.store(FIRST_ID, Ordering::SeqCst);
        info!("event=store_clear module=repo.memory status=ok");
    }

    /// Returns store-wide counters, including inactive students.
    pub fn snapshot(&self) -> MemoryStoreSnapshot {
        let mut active = 0;
        let mut total = 0;
        let mut by_major = BTreeMap::new();
        for entry in self.students.iter() {
            total += 1;
            if entry.is_active() {
                active += 1;
                *by_major.entry(entry.major().to_string()).or_insert(0) += 1;
            }
        }

        MemoryStoreSnapshot {
            total,
            active,
            inactive: total - active,
            by_major,
            next_id: self.next_id.load(Ordering::SeqCst),
        }
    }

    // Callers must hold `write_lock`.
    fn ensure_email_free(&self, email: &str, exclude: Option<StudentId>) -> RepoResult<()> {
        let taken = self
            .students
            .iter()
            .any(|entry| entry.email() == email && Some(*entry.key()) != exclude);
        if taken {
            return Err(RepoError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }

    fn collect_active(&self, filter: impl Fn(&Student) -> bool) -> Vec<Student> {
        let mut students: Vec<Student> = self
            .students
            .iter()
            .filter(|entry| entry.is_active() && filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        sort_by_name(&mut students);
        students
    }
}

impl StudentRepository for MemoryStudentRepository {
    fn create(&self, student: &Student) -> RepoResult<Student> {
        student.validate()?;

        let _guard = self.write_lock.lock();
        if let Err(err) = self.ensure_email_free(student.email(), None) {
            warn!(
                "event=student_create module=repo.memory status=error error_code={}",
                err.code()
            );
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = student.clone();
        stored.assign_id(id);
        self.students.insert(id, stored.clone());

        info!("event=student_create module=repo.memory status=ok id={id}");
        Ok(stored)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        Ok(self.students.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        let key = email_key(email)?;
        Ok(self
            .students
            .iter()
            .find(|entry| entry.email() == key)
            .map(|entry| entry.value().clone()))
    }

    fn list_all(&self) -> RepoResult<Vec<Student>> {
        Ok(self.collect_active(|_| true))
    }

    fn list_by_major(&self, major: &str) -> RepoResult<Vec<Student>> {
        let major = major_key(major)?;
        Ok(self.collect_active(|student| student.major().eq_ignore_ascii_case(major)))
    }

    fn update(&self, student: &Student) -> RepoResult<Student> {
        let id = student.id().ok_or(RepoError::MissingId)?;
        student.validate()?;

        let _guard = self.write_lock.lock();
        if !self.students.contains_key(&id) {
            warn!(
                "event=student_update module=repo.memory status=error id={id} error_code=ESTUDIANTE_NO_ENCONTRADO"
            );
            return Err(RepoError::NotFound(id));
        }
        if let Err(err) = self.ensure_email_free(student.email(), Some(id)) {
            warn!(
                "event=student_update module=repo.memory status=error id={id} error_code={}",
                err.code()
            );
            return Err(err);
        }

        self.students.insert(id, student.clone());
        info!("event=student_update module=repo.memory status=ok id={id}");
        Ok(student.clone())
    }

    fn delete(&self, id: StudentId) -> RepoResult<bool> {
        match self.students.get_mut(&id) {
            Some(mut entry) => {
                entry.deactivate();
                info!("event=student_delete module=repo.memory status=ok id={id}");
                Ok(true)
            }
            None => {
                warn!(
                    "event=student_delete module=repo.memory status=error id={id} error_code=ESTUDIANTE_NO_ENCONTRADO"
                );
                Err(RepoError::NotFound(id))
            }
        }
    }

    fn exists(&self, id: StudentId) -> RepoResult<bool> {
        Ok(self.students.contains_key(&id))
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let key = email_key(email)?;
        Ok(self.students.iter().any(|entry| entry.email() == key))
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.students.iter().filter(|entry| entry.is_active()).count() as u64)
    }
}
