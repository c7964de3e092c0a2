use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use trainhub_core::{
    Attendance, AttendanceStatus, Entity, Formation, Invoice, InvoiceStatus, Record, RecordId,
    Session, Student,
};

#[test]
fn record_serializes_flat_with_generated_fields() {
    let created = Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap();
    let record = Record::new(
        RecordId::new("inv1"),
        created,
        Invoice {
            invoice_number: Some("FAC-001".to_string()),
            enrollment_id: Some(RecordId::new("en1")),
            amount: Some(150000.0),
            status: Some(InvoiceStatus::Paid),
            due_date: NaiveDate::from_ymd_opt(2025, 11, 15),
        },
    );

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], "inv1");
    assert_eq!(value["created_date"], "2025-09-01T10:00:00Z");
    assert!(value.get("updated_date").is_none());
    assert_eq!(value["invoice_number"], "FAC-001");
    assert_eq!(value["enrollment_id"], "en1");
    assert_eq!(value["status"], "payée");
    assert_eq!(value["due_date"], "2025-11-15");

    let decoded: Record<Invoice> = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn status_enums_use_french_wire_values() {
    assert_eq!(
        serde_json::to_value(InvoiceStatus::Partial).unwrap(),
        json!("partielle")
    );
    assert_eq!(
        serde_json::to_value(InvoiceStatus::Unpaid).unwrap(),
        json!("impayée")
    );
    assert_eq!(
        serde_json::to_value(AttendanceStatus::Present).unwrap(),
        json!("présent")
    );
    assert_eq!(
        serde_json::from_value::<AttendanceStatus>(json!("retard")).unwrap(),
        AttendanceStatus::Late
    );
    assert!(serde_json::from_value::<AttendanceStatus>(json!("late")).is_err());
}

#[test]
fn kind_fields_are_serialized_as_type() {
    let formation = Formation {
        kind: Some("certifiante".to_string()),
        ..Formation::default()
    };
    let value = serde_json::to_value(&formation).unwrap();
    assert_eq!(value["type"], "certifiante");
    assert!(value.get("kind").is_none());
}

#[test]
fn partial_payloads_fill_defaults() {
    let attendance: Attendance =
        serde_json::from_value(json!({"enrollment_id": "en1", "status": "absent"})).unwrap();
    assert_eq!(attendance.enrollment_id, Some(RecordId::new("en1")));
    assert_eq!(attendance.status, Some(AttendanceStatus::Absent));
    assert_eq!(attendance.date, None);
}

#[test]
fn session_validation_rejects_reversed_dates() {
    let session = Session {
        start_date: NaiveDate::from_ymd_opt(2025, 11, 30),
        end_date: NaiveDate::from_ymd_opt(2025, 11, 1),
        ..Session::default()
    };
    let err = session.validate().unwrap_err();
    assert!(err.contains("end_date"), "unexpected error: {err}");

    let open_ended = Session {
        start_date: NaiveDate::from_ymd_opt(2025, 11, 1),
        ..Session::default()
    };
    assert!(open_ended.validate().is_ok());
}

#[test]
fn student_full_name_joins_present_parts() {
    let student = Student {
        first_name: Some("Rija".to_string()),
        last_name: Some("Rakoto".to_string()),
        ..Student::default()
    };
    assert_eq!(student.full_name().as_deref(), Some("Rija Rakoto"));

    let first_only = Student {
        first_name: Some("Rija".to_string()),
        ..Student::default()
    };
    assert_eq!(first_only.full_name().as_deref(), Some("Rija"));
    assert_eq!(Student::default().full_name(), None);
}

#[test]
fn unset_fields_are_omitted_from_wire_form() {
    let student = Student {
        first_name: Some("Rija".to_string()),
        ..Student::default()
    };
    let value = serde_json::to_value(&student).unwrap();
    assert_eq!(value, json!({"first_name": "Rija"}));

    let session = serde_json::to_value(Session::default()).unwrap();
    assert_eq!(session, json!({"schedule": []}));
}

#[test]
fn blank_and_malformed_dates_decode_differently() {
    let invoice: Invoice =
        serde_json::from_value(json!({"invoice_number": "FAC-002", "due_date": ""})).unwrap();
    assert_eq!(invoice.due_date, None);

    let explicit_null: Invoice = serde_json::from_value(json!({"due_date": null})).unwrap();
    assert_eq!(explicit_null.due_date, None);

    assert!(serde_json::from_value::<Invoice>(json!({"due_date": "15/11/2025"})).is_err());
    assert!(serde_json::from_value::<Invoice>(json!({"amount": 10, "statut": "payée"})).is_err());
}
