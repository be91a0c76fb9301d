use chrono::NaiveDate;
use roster_core::{
    MemoryStudentRepository, RepoError, SqliteStudentRepository, Student, StudentRepository,
};

fn student(first: &str, last: &str, email: &str, major: &str) -> Student {
    Student::new(first, last, email, major).unwrap()
}

fn names(students: &[Student]) -> Vec<String> {
    students.iter().map(Student::full_name).collect()
}

fn create_assigns_id_and_round_trips(repo: &dyn StudentRepository) {
    let input = student("Ana", "Lee", "Ana@X.com", "CS")
        .enrolled_on(NaiveDate::from_ymd_opt(2021, 9, 1).unwrap())
        .unwrap();

    let created = repo.create(&input).unwrap();
    let id = created.id().expect("created student should carry an id");
    assert!(created.is_active());

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.email(), "ana@x.com");
    assert_eq!(
        loaded.enrollment_date(),
        NaiveDate::from_ymd_opt(2021, 9, 1).unwrap()
    );
    assert!(repo.exists(id).unwrap());
    assert!(!repo.exists(id + 1000).unwrap());
    assert!(repo.find_by_id(id + 1000).unwrap().is_none());
}

fn ids_are_distinct_and_increasing(repo: &dyn StudentRepository) {
    let first = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    let second = repo.create(&student("Bo", "Kim", "bo@x.com", "EE")).unwrap();

    assert!(second.id().unwrap() > first.id().unwrap());
}

fn input_id_is_ignored_on_create(repo: &dyn StudentRepository) {
    let input = Student::with_id(42, "Ana", "Lee", "ana@x.com", "CS").unwrap();

    let created = repo.create(&input).unwrap();
    assert_ne!(created.id(), Some(42));
    assert!(!repo.exists(42).unwrap());
}

fn duplicate_email_is_rejected_case_insensitively(repo: &dyn StudentRepository) {
    repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();

    let err = repo
        .create(&student("Bo", "Kim", "ANA@X.COM", "EE"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail(_)));
    assert_eq!(err.code(), "EMAIL_DUPLICADO");
    assert_eq!(repo.count().unwrap(), 1);
    assert_eq!(names(&repo.list_all().unwrap()), ["Ana Lee"]);
}

fn inactive_students_still_own_their_email(repo: &dyn StudentRepository) {
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    repo.delete(ana.id().unwrap()).unwrap();

    let err = repo
        .create(&student("Ann", "Lee", "ana@x.com", "CS"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail(_)));
    assert!(repo.exists_by_email("Ana@x.com").unwrap());
}

fn find_by_email_ignores_case_and_whitespace(repo: &dyn StudentRepository) {
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();

    let found = repo.find_by_email("  ANA@X.COM ").unwrap().unwrap();
    assert_eq!(found.id(), ana.id());
    assert!(repo.find_by_email("bo@x.com").unwrap().is_none());
    assert!(!repo.exists_by_email("bo@x.com").unwrap());
}

fn blank_lookup_keys_are_rejected(repo: &dyn StudentRepository) {
    assert!(matches!(
        repo.find_by_email("  ").unwrap_err(),
        RepoError::BlankEmail
    ));
    assert_eq!(repo.exists_by_email("").unwrap_err().code(), "EMAIL_NULO");
    assert_eq!(repo.list_by_major(" ").unwrap_err().code(), "CARRERA_NULA");
}

fn soft_delete_hides_from_lists_but_keeps_record(repo: &dyn StudentRepository) {
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    repo.create(&student("Bo", "Kim", "bo@x.com", "CS")).unwrap();
    let id = ana.id().unwrap();

    assert!(repo.delete(id).unwrap());

    assert!(repo.exists(id).unwrap());
    let stored = repo.find_by_id(id).unwrap().unwrap();
    assert!(!stored.is_active());
    assert_eq!(names(&repo.list_all().unwrap()), ["Bo Kim"]);
    assert_eq!(names(&repo.list_by_major("CS").unwrap()), ["Bo Kim"]);
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.find_by_email("ana@x.com").unwrap().is_some());
}

fn delete_unknown_id_is_not_found(repo: &dyn StudentRepository) {
    let err = repo.delete(999).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(999)));
    assert_eq!(err.code(), "ESTUDIANTE_NO_ENCONTRADO");
}

fn list_all_orders_by_last_then_first_name(repo: &dyn StudentRepository) {
    repo.create(&student("Zoe", "Kim", "zoe@x.com", "CS")).unwrap();
    repo.create(&student("Ana", "Lee", "ana@x.com", "EE")).unwrap();
    repo.create(&student("Bo", "Kim", "bo@x.com", "CS")).unwrap();
    repo.create(&student("Cy", "Adams", "cy@x.com", "ME")).unwrap();

    assert_eq!(
        names(&repo.list_all().unwrap()),
        ["Cy Adams", "Bo Kim", "Zoe Kim", "Ana Lee"]
    );
}

fn list_by_major_matches_case_insensitively(repo: &dyn StudentRepository) {
    repo.create(&student("Zoe", "Kim", "zoe@x.com", "Computer Science")).unwrap();
    repo.create(&student("Ana", "Lee", "ana@x.com", "Physics")).unwrap();
    repo.create(&student("Bo", "Kim", "bo@x.com", "computer science")).unwrap();

    assert_eq!(
        names(&repo.list_by_major(" COMPUTER SCIENCE ").unwrap()),
        ["Bo Kim", "Zoe Kim"]
    );
    assert!(repo.list_by_major("Biology").unwrap().is_empty());
}

fn update_replaces_fields_but_not_id(repo: &dyn StudentRepository) {
    let created = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    let id = created.id().unwrap();

    let mut changed = created.clone();
    changed.set_last_name("Li").unwrap();
    changed.set_email("ana.li@x.com").unwrap();
    changed.set_major("Physics").unwrap();
    let updated = repo.update(&changed).unwrap();

    assert_eq!(updated.id(), Some(id));
    let stored = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(stored.full_name(), "Ana Li");
    assert_eq!(stored.email(), "ana.li@x.com");
    assert_eq!(stored.major(), "Physics");
    assert!(repo.find_by_email("ana@x.com").unwrap().is_none());
}

fn update_keeping_own_email_is_allowed(repo: &dyn StudentRepository) {
    let mut created = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    created.set_email("ANA@X.COM").unwrap();
    created.set_major("EE").unwrap();

    let updated = repo.update(&created).unwrap();
    assert_eq!(updated.major(), "EE");
}

fn update_rejects_unknown_missing_or_colliding(repo: &dyn StudentRepository) {
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    let mut bo = repo.create(&student("Bo", "Kim", "bo@x.com", "EE")).unwrap();

    let ghost = Student::with_id(999, "Gus", "Ho", "gus@x.com", "CS").unwrap();
    assert!(matches!(
        repo.update(&ghost).unwrap_err(),
        RepoError::NotFound(999)
    ));

    let unsaved = student("Dee", "Ng", "dee@x.com", "CS");
    assert!(matches!(
        repo.update(&unsaved).unwrap_err(),
        RepoError::MissingId
    ));

    bo.set_email("Ana@X.com").unwrap();
    let err = repo.update(&bo).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail(_)));

    let stored_bo = repo.find_by_id(bo.id().unwrap()).unwrap().unwrap();
    assert_eq!(stored_bo.email(), "bo@x.com");
    assert_eq!(repo.find_by_id(ana.id().unwrap()).unwrap().unwrap(), ana);
    assert_eq!(repo.count().unwrap(), 2);
}

fn update_can_reactivate(repo: &dyn StudentRepository) {
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    let id = ana.id().unwrap();
    repo.delete(id).unwrap();

    let mut stored = repo.find_by_id(id).unwrap().unwrap();
    stored.activate();
    repo.update(&stored).unwrap();

    assert!(repo.find_by_id(id).unwrap().unwrap().is_active());
    assert_eq!(repo.count().unwrap(), 1);
}

fn returned_values_are_detached_copies(repo: &dyn StudentRepository) {
    let created = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
    let id = created.id().unwrap();

    let mut loaded = repo.find_by_id(id).unwrap().unwrap();
    loaded.set_major("Physics").unwrap();
    loaded.deactivate();

    let again = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(again.major(), "CS");
    assert!(again.is_active());
}

macro_rules! contract_tests {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            contract_tests!(@cases $make;
                create_assigns_id_and_round_trips,
                ids_are_distinct_and_increasing,
                input_id_is_ignored_on_create,
                duplicate_email_is_rejected_case_insensitively,
                inactive_students_still_own_their_email,
                find_by_email_ignores_case_and_whitespace,
                blank_lookup_keys_are_rejected,
                soft_delete_hides_from_lists_but_keeps_record,
                delete_unknown_id_is_not_found,
                list_all_orders_by_last_then_first_name,
                list_by_major_matches_case_insensitively,
                update_replaces_fields_but_not_id,
                update_keeping_own_email_is_allowed,
                update_rejects_unknown_missing_or_colliding,
                update_can_reactivate,
                returned_values_are_detached_copies,
            );
        }
    };
    (@cases $make:expr; $($case:ident),+ $(,)?) => {
        $(
            #[test]
            fn $case() {
                let repo = $make;
                super::$case(&repo);
            }
        )+
    };
}

contract_tests!(memory, MemoryStudentRepository::new());
contract_tests!(sqlite, SqliteStudentRepository::open_in_memory().unwrap());

#[test]
fn sqlite_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    let id = {
        let repo = SqliteStudentRepository::open(&path).unwrap();
        let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
        repo.delete(ana.id().unwrap()).unwrap();
        ana.id().unwrap()
    };

    let reopened = SqliteStudentRepository::open(&path).unwrap();
    let stored = reopened.find_by_id(id).unwrap().unwrap();
    assert_eq!(stored.full_name(), "Ana Lee");
    assert!(!stored.is_active());
    assert_eq!(reopened.count().unwrap(), 0);
}

#[test]
fn sqlite_in_memory_stores_are_isolated() {
    let first = SqliteStudentRepository::open_in_memory().unwrap();
    let second = SqliteStudentRepository::open_in_memory().unwrap();

    first.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();

    assert_eq!(first.count().unwrap(), 1);
    assert_eq!(second.count().unwrap(), 0);
    second.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();
}

#[test]
fn sqlite_rejects_corrupted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");
    let repo = SqliteStudentRepository::open(&path).unwrap();
    let ana = repo.create(&student("Ana", "Lee", "ana@x.com", "CS")).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE students SET first_name = '   ' WHERE id = ?1;", [ana.id().unwrap()])
        .unwrap();
    drop(conn);

    let err = repo.find_by_id(ana.id().unwrap()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(err.code(), "DATOS_CORRUPTOS");
}
