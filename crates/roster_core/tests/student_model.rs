use chrono::{Days, Local};
use roster_core::{Student, StudentValidationError};

#[test]
fn new_student_is_normalized_active_and_unsaved() {
    let student = Student::new(" Ana ", " Lee", " Ana.Lee@X.COM ", " CS ").unwrap();

    assert_eq!(student.id(), None);
    assert_eq!(student.first_name(), "Ana");
    assert_eq!(student.last_name(), "Lee");
    assert_eq!(student.email(), "ana.lee@x.com");
    assert_eq!(student.major(), "CS");
    assert_eq!(student.full_name(), "Ana Lee");
    assert_eq!(student.enrollment_date(), Local::now().date_naive());
    assert!(student.is_active());
}

#[test]
fn blank_fields_are_rejected_with_stable_codes() {
    let cases = [
        (Student::new("  ", "Lee", "ana@x.com", "CS"), "NOMBRE_REQUERIDO"),
        (Student::new("Ana", "", "ana@x.com", "CS"), "APELLIDO_REQUERIDO"),
        (Student::new("Ana", "Lee", "ana@x", "CS"), "EMAIL_INVALIDO"),
        (Student::new("Ana", "Lee", "ana@x.com", "\t"), "CARRERA_REQUERIDA"),
    ];

    for (result, code) in cases {
        let err = result.unwrap_err();
        assert_eq!(err.code(), code);
    }
}

#[test]
fn setters_reject_invalid_values_and_keep_previous_state() {
    let mut student = Student::new("Ana", "Lee", "ana@x.com", "CS").unwrap();

    assert_eq!(
        student.set_email("not-an-email").unwrap_err().code(),
        "EMAIL_INVALIDO"
    );
    assert_eq!(student.email(), "ana@x.com");

    assert_eq!(
        student.set_major(" ").unwrap_err(),
        StudentValidationError::BlankMajor
    );
    assert_eq!(student.major(), "CS");

    student.set_email("ANA.LEE@UNI.EDU").unwrap();
    assert_eq!(student.email(), "ana.lee@uni.edu");
}

#[test]
fn future_enrollment_date_is_rejected() {
    let today = Local::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

    let err = Student::new("Ana", "Lee", "ana@x.com", "CS")
        .unwrap()
        .enrolled_on(tomorrow)
        .unwrap_err();
    assert_eq!(err.code(), "FECHA_FUTURA");
    assert!(matches!(
        err,
        StudentValidationError::FutureEnrollmentDate { date, .. } if date == tomorrow
    ));

    let student = Student::new("Ana", "Lee", "ana@x.com", "CS")
        .unwrap()
        .enrolled_on(today)
        .unwrap();
    assert_eq!(student.enrollment_date(), today);
}

#[test]
fn activate_and_deactivate_toggle_soft_delete_flag() {
    let mut student = Student::new("Ana", "Lee", "ana@x.com", "CS").unwrap();

    student.deactivate();
    assert!(!student.is_active());
    assert!(student.validate().is_ok());

    student.activate();
    assert!(student.is_active());
}

#[test]
fn deserialization_runs_field_validation() {
    let ok: Student = serde_json::from_str(
        r#"{
            "id": 4,
            "first_name": "Ana",
            "last_name": "Lee",
            "email": "ANA@X.COM",
            "major": "CS",
            "enrollment_date": "2020-09-01",
            "active": false
        }"#,
    )
    .unwrap();
    assert_eq!(ok.id(), Some(4));
    assert_eq!(ok.email(), "ana@x.com");
    assert!(!ok.is_active());

    let bad = serde_json::from_str::<Student>(
        r#"{
            "first_name": "Ana",
            "last_name": "Lee",
            "email": "ana@@x.com",
            "major": "CS",
            "enrollment_date": "2020-09-01"
        }"#,
    );
    assert!(bad.is_err());
}

#[test]
fn serialization_exposes_plain_fields() {
    let student = Student::with_id(7, "Ana", "Lee", "ana@x.com", "CS").unwrap();
    let value = serde_json::to_value(&student).unwrap();

    assert_eq!(value["id"], 7);
    assert_eq!(value["email"], "ana@x.com");
    assert_eq!(value["active"], true);
}
