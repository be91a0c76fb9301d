//! Student use-case service.
//!
//! # Responsibility
//! - Translate between `StudentDto` and the `Student` entity.
//! - Enforce business rules that span more than one repository call.
//! - Aggregate statistics over active students.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic; it holds exactly one repository
//!   and never branches on which backend it is.
//! - Every failure is returned as a categorized `ServiceError`; nothing is
//!   retried or swallowed.

use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::StudentRepository;
use crate::service::dto::StudentDto;
use crate::service::error::{
    ServiceError, ServiceResult, CODE_BLANK_EMAIL, CODE_BLANK_MAJOR, CODE_DUPLICATE_EMAIL,
    CODE_INVALID_DATA, CODE_MISSING_ID, CODE_NOT_FOUND,
};
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregated view over active students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStatistics {
    /// Number of active students.
    pub total_active: u64,
    /// Active students per major; values sum to `total_active`.
    pub by_major: BTreeMap<String, u64>,
    pub generated_at: DateTime<Local>,
}

/// Business-rule facade over a student repository.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrows the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Registers a new student.
    ///
    /// # Contract
    /// - Invalid DTO data fails with `Validation/DATOS_INVALIDOS`.
    /// - An email already owned by any student (active or not) fails with
    ///   `Business/EMAIL_DUPLICADO`.
    /// - Any id on the DTO is ignored; the repository assigns one.
    pub fn register(&self, dto: &StudentDto) -> ServiceResult<StudentDto> {
        let result = self.register_inner(dto);
        log_outcome("service_register", &result, |created| created.id);
        result
    }

    fn register_inner(&self, dto: &StudentDto) -> ServiceResult<StudentDto> {
        dto.validate().map_err(|err| {
            ServiceError::validation(CODE_INVALID_DATA, format!("invalid student data: {err}"))
        })?;

        let taken = self
            .repo
            .exists_by_email(&dto.email)
            .map_err(|err| ServiceError::from_repo("REGISTRO_ERROR", "register failed", err))?;
        if taken {
            return Err(ServiceError::business(
                CODE_DUPLICATE_EMAIL,
                "a student with this email already exists",
            ));
        }

        let mut student = dto.to_student().map_err(|err| {
            ServiceError::validation(CODE_INVALID_DATA, format!("invalid student data: {err}"))
        })?;
        student.activate();

        let created = self
            .repo
            .create(&student)
            .map_err(|err| ServiceError::from_repo("REGISTRO_ERROR", "register failed", err))?;
        if created.id().is_none() {
            return Err(ServiceError::system(
                "ID_NO_GENERADO",
                "repository returned a student without an id",
            ));
        }

        Ok(StudentDto::from(created))
    }

    /// Looks up a student by id, including inactive ones.
    pub fn find_by_id(&self, id: StudentId) -> ServiceResult<Option<StudentDto>> {
        self.repo
            .find_by_id(id)
            .map(|found| found.map(StudentDto::from))
            .map_err(|err| ServiceError::from_repo("BUSQUEDA_ERROR", "lookup by id failed", err))
    }

    /// Case-insensitive lookup by email, including inactive students.
    pub fn find_by_email(&self, email: &str) -> ServiceResult<Option<StudentDto>> {
        require_email(email)?;
        self.repo
            .find_by_email(email)
            .map(|found| found.map(StudentDto::from))
            .map_err(|err| {
                ServiceError::from_repo("BUSQUEDA_EMAIL_ERROR", "lookup by email failed", err)
            })
    }

    /// Lists active students ordered by last name, then first name.
    pub fn list_active(&self) -> ServiceResult<Vec<StudentDto>> {
        self.repo
            .list_all()
            .map(to_dtos)
            .map_err(|err| ServiceError::from_repo("LISTADO_ERROR", "listing failed", err))
    }

    /// Lists active students in `major` (case-insensitive), same ordering.
    pub fn list_by_major(&self, major: &str) -> ServiceResult<Vec<StudentDto>> {
        if major.trim().is_empty() {
            return Err(ServiceError::validation(CODE_BLANK_MAJOR, "major is required"));
        }
        self.repo.list_by_major(major).map(to_dtos).map_err(|err| {
            ServiceError::from_repo("LISTADO_CARRERA_ERROR", "listing by major failed", err)
        })
    }

    /// Replaces every field of an existing student except its id.
    ///
    /// # Contract
    /// - Missing id fails with `Validation/ID_NULO`.
    /// - Unknown id fails with `Business/ESTUDIANTE_NO_ENCONTRADO`.
    /// - An email owned by a different student fails with
    ///   `Business/EMAIL_DUPLICADO` before storage is touched.
    pub fn update(&self, dto: &StudentDto) -> ServiceResult<StudentDto> {
        let result = self.update_inner(dto);
        log_outcome("service_update", &result, |updated| updated.id);
        result
    }

    fn update_inner(&self, dto: &StudentDto) -> ServiceResult<StudentDto> {
        let id = dto
            .id
            .ok_or_else(|| ServiceError::validation(CODE_MISSING_ID, "student id is required"))?;
        dto.validate().map_err(|err| {
            ServiceError::validation(CODE_INVALID_DATA, format!("invalid student data: {err}"))
        })?;

        self.require_existing(id, "ACTUALIZACION_ERROR")?;
        if !self.validate_email_unique(&dto.email, Some(id))? {
            return Err(ServiceError::business(
                CODE_DUPLICATE_EMAIL,
                "another student already uses this email",
            ));
        }

        let student = dto.to_student().map_err(|err| {
            ServiceError::validation(CODE_INVALID_DATA, format!("invalid student data: {err}"))
        })?;
        self.repo
            .update(&student)
            .map(StudentDto::from)
            .map_err(|err| ServiceError::from_repo("ACTUALIZACION_ERROR", "update failed", err))
    }

    /// Soft-deletes a student; the record stays retrievable by id.
    pub fn delete(&self, id: StudentId) -> ServiceResult<bool> {
        let result = self.require_existing(id, "ELIMINACION_ERROR").and_then(|()| {
            self.repo
                .delete(id)
                .map_err(|err| ServiceError::from_repo("ELIMINACION_ERROR", "delete failed", err))
        });
        log_outcome("service_delete", &result, |_| Some(id));
        result
    }

    /// Clears the soft-delete flag of an existing (possibly inactive) student.
    pub fn reactivate(&self, id: StudentId) -> ServiceResult<StudentDto> {
        let result = self.reactivate_inner(id);
        log_outcome("service_reactivate", &result, |_| Some(id));
        result
    }

    fn reactivate_inner(&self, id: StudentId) -> ServiceResult<StudentDto> {
        let map_err =
            |err| ServiceError::from_repo("REACTIVACION_ERROR", "reactivation failed", err);

        let mut student = self
            .repo
            .find_by_id(id)
            .map_err(map_err)?
            .ok_or_else(|| not_found(id))?;
        student.activate();
        self.repo.update(&student).map(StudentDto::from).map_err(map_err)
    }

    /// Recomputes active-student statistics from a fresh read.
    ///
    /// `total_active` and `by_major` come from the same listing, so their
    /// values always agree with each other.
    pub fn statistics(&self) -> ServiceResult<StudentStatistics> {
        let students = self.repo.list_all().map_err(|err| {
            ServiceError::from_repo("ESTADISTICAS_ERROR", "statistics failed", err)
        })?;

        let mut by_major = BTreeMap::new();
        for student in &students {
            *by_major.entry(student.major().to_string()).or_insert(0) += 1;
        }

        Ok(StudentStatistics {
            total_active: students.len() as u64,
            by_major,
            generated_at: Local::now(),
        })
    }

    /// Returns `true` when no student owns `email`, or its only owner is
    /// `exclude_id`.
    pub fn validate_email_unique(
        &self,
        email: &str,
        exclude_id: Option<StudentId>,
    ) -> ServiceResult<bool> {
        require_email(email)?;
        let owner = self.repo.find_by_email(email).map_err(|err| {
            ServiceError::from_repo("VALIDACION_EMAIL_ERROR", "email check failed", err)
        })?;
        Ok(match owner {
            None => true,
            Some(owner) => owner.id().is_some() && owner.id() == exclude_id,
        })
    }

    /// Number of active students.
    pub fn count_active(&self) -> ServiceResult<u64> {
        self.repo
            .count()
            .map_err(|err| ServiceError::from_repo("CONTEO_ERROR", "count failed", err))
    }

    fn require_existing(&self, id: StudentId, op_code: &'static str) -> ServiceResult<()> {
        match self.repo.exists(id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(not_found(id)),
            Err(err) => Err(ServiceError::from_repo(op_code, "existence check failed", err)),
        }
    }
}

fn to_dtos(students: Vec<Student>) -> Vec<StudentDto> {
    students.into_iter().map(StudentDto::from).collect()
}

fn not_found(id: StudentId) -> ServiceError {
    ServiceError::business(CODE_NOT_FOUND, format!("student {id} does not exist"))
}

fn require_email(email: &str) -> ServiceResult<()> {
    if email.trim().is_empty() {
        return Err(ServiceError::validation(CODE_BLANK_EMAIL, "email is required"));
    }
    Ok(())
}

fn log_outcome<T>(
    event: &str,
    result: &ServiceResult<T>,
    id_of: impl FnOnce(&T) -> Option<StudentId>,
) {
    match result {
        Ok(value) => match id_of(value) {
            Some(id) => info!("event={event} module=service status=ok id={id}"),
            None => info!("event={event} module=service status=ok"),
        },
        Err(err) => warn!(
            "event={event} module=service status=error kind={} code={}",
            err.kind(),
            err.code()
        ),
    }
}
