use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::collections::HashSet;
use trainhub_core::{
    Announcement, Datastore, Enrollment, EntityStore, FieldMap, FilterCriteria, IdSequence,
    InMemoryEntityStore, ListQuery, Record, RecordId, SortOrder, StoreConfig, StoreError,
    Session, Student,
};

fn student_store() -> InMemoryEntityStore<Student> {
    InMemoryEntityStore::new(IdSequence::default(), 1000)
}

fn student(first_name: &str, status: &str) -> Student {
    Student {
        first_name: Some(first_name.to_string()),
        last_name: Some("Rakoto".to_string()),
        status: Some(status.to_string()),
        ..Student::default()
    }
}

fn patch(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn create_assigns_id_and_created_date_and_lists_one_new_record() {
    let store = student_store();
    let before = Utc::now();

    let created = store.create(student("Rija", "actif")).await.unwrap();
    assert_eq!(created.id, RecordId::new("1001"));
    assert!(created.created_date >= before);
    assert_eq!(created.updated_date, None);

    let listed = store.list(&ListQuery::default()).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], created);
    assert_eq!(listed[0].fields, student("Rija", "actif"));
}

#[tokio::test]
async fn ids_are_never_reused_after_delete() {
    let store = student_store();
    let mut seen = HashSet::new();

    for round in 0..5 {
        let created = store.create(student("A", "actif")).await.unwrap();
        assert!(seen.insert(created.id.clone()), "id reused in round {round}");
        store.delete(&created.id).await.unwrap();
    }

    let last = store.create(student("B", "actif")).await.unwrap();
    assert!(!seen.contains(&last.id));
}

#[tokio::test]
async fn update_merges_patch_and_stamps_updated_date() {
    let store = student_store();
    let created = store.create(student("Rija", "actif")).await.unwrap();
    let before_update = Utc::now();

    let updated = store
        .update(&created.id, patch(json!({"status": "x"})))
        .await
        .unwrap();

    assert_eq!(updated.fields.status.as_deref(), Some("x"));
    assert!(updated.updated_date.unwrap() >= before_update);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_date, created.created_date);
    assert_eq!(updated.fields.first_name, created.fields.first_name);
    assert_eq!(updated.fields.last_name, created.fields.last_name);
}

#[tokio::test]
async fn update_ignores_reserved_keys_in_patch() {
    let store = student_store();
    let created = store.create(student("Rija", "actif")).await.unwrap();

    let updated = store
        .update(
            &created.id,
            patch(json!({
                "id": "hijacked",
                "created_date": "2000-01-01T00:00:00Z",
                "address": "Toamasina"
            })),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_date, created.created_date);
    assert_eq!(updated.fields.address.as_deref(), Some("Toamasina"));
}

#[tokio::test]
async fn update_and_delete_on_unknown_id_fail_without_mutation() {
    let store = student_store();
    store.create(student("Rija", "actif")).await.unwrap();
    let snapshot = store.dump();
    let missing = RecordId::new("never-issued");

    let update_err = store
        .update(&missing, patch(json!({"status": "x"})))
        .await
        .unwrap_err();
    assert_eq!(
        update_err,
        StoreError::NotFound {
            entity: "student",
            id: missing.clone()
        }
    );

    let delete_err = store.delete(&missing).await.unwrap_err();
    assert!(delete_err.is_not_found());
    assert_eq!(store.dump(), snapshot);
}

#[tokio::test]
async fn invalid_patch_is_rejected_and_record_kept() {
    let store = student_store();
    let created = store.create(student("Rija", "actif")).await.unwrap();

    let err = store
        .update(&created.id, patch(json!({"date_of_birth": "not a date"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFields { entity: "student", .. }));

    let stored = store.get(&created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn delete_removes_exactly_one_record() {
    let store = student_store();
    let keep = store.create(student("Keep", "actif")).await.unwrap();
    let gone = store.create(student("Gone", "actif")).await.unwrap();

    let removed = store.delete(&gone.id).await.unwrap();
    assert_eq!(removed, gone);

    let listed = store.list(&ListQuery::default()).await;
    assert_eq!(listed, vec![keep]);
    let filtered = store
        .filter(&FilterCriteria::new().with("id", gone.id.as_str()))
        .await;
    assert!(filtered.is_empty());
    assert!(store.get(&gone.id).await.is_none());
}

#[tokio::test]
async fn filter_returns_exact_loosely_equal_subset() {
    let store = student_store();
    let a = store.create(student("A", "actif")).await.unwrap();
    store.create(student("B", "inactif")).await.unwrap();
    let c = store.create(student("C", "actif")).await.unwrap();
    store
        .create(Student {
            first_name: Some("D".to_string()),
            ..Student::default()
        })
        .await
        .unwrap();

    let active = store
        .filter(&FilterCriteria::new().with("status", "actif"))
        .await;
    assert_eq!(active, vec![a.clone(), c]);

    let combined = store
        .filter(
            &FilterCriteria::new()
                .with("status", "actif")
                .with("first_name", "A")
                .with("address", serde_json::Value::Null),
        )
        .await;
    assert_eq!(combined, vec![a]);

    let everyone = store.filter(&FilterCriteria::new()).await;
    assert_eq!(everyone.len(), 4);
}

#[tokio::test]
async fn filter_matches_numeric_fields_loosely() {
    let store: InMemoryEntityStore<Enrollment> =
        InMemoryEntityStore::new(IdSequence::default(), 1000);
    let enrollment = store
        .create(Enrollment {
            paid_amount: Some(50000.0),
            ..Enrollment::default()
        })
        .await
        .unwrap();

    let by_string = store
        .filter(&FilterCriteria::new().with("paid_amount", "50000"))
        .await;
    assert_eq!(by_string, vec![enrollment.clone()]);

    let by_generated_id = store
        .filter(&FilterCriteria::new().with("id", 1001))
        .await;
    assert_eq!(by_generated_id, vec![enrollment]);
}

#[tokio::test]
async fn returned_records_are_isolated_copies() {
    let store = student_store();
    let created = store.create(student("Rija", "actif")).await.unwrap();

    let mut listed = store.list(&ListQuery::default()).await;
    listed[0].fields.status = Some("mutated".to_string());
    listed[0].id = RecordId::new("mutated");

    let mut dumped = store.dump();
    dumped.clear();

    let again = store.list(&ListQuery::default()).await;
    assert_eq!(again, vec![created]);
}

#[tokio::test]
async fn list_sorts_by_created_date_and_applies_limit() {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    let seed = vec![
        Record::new(RecordId::new("s2"), base + Duration::minutes(2), student("Two", "actif")),
        Record::new(RecordId::new("s1"), base, student("One", "actif")),
        Record::new(RecordId::new("s3"), base + Duration::minutes(3), student("Three", "actif")),
    ];
    let store = InMemoryEntityStore::with_seed(IdSequence::default(), 1000, seed).unwrap();

    let ids = |records: Vec<Record<Student>>| -> Vec<String> {
        records.into_iter().map(|r| r.id.to_string()).collect()
    };

    assert_eq!(ids(store.list(&ListQuery::default()).await), ["s2", "s1", "s3"]);
    assert_eq!(
        ids(store.list(&ListQuery::sorted_by("created_date")).await),
        ["s1", "s2", "s3"]
    );
    assert_eq!(
        ids(store.list(&ListQuery::sorted_by("-created_date")).await),
        ["s3", "s2", "s1"]
    );
    assert_eq!(
        ids(store.list(&ListQuery::sorted_by("name")).await),
        ["s2", "s1", "s3"]
    );
    assert_eq!(
        ids(store
            .list(&ListQuery {
                sort: Some(SortOrder::CreatedDescending),
                limit: Some(2),
            })
            .await),
        ["s3", "s2"]
    );
}

#[tokio::test]
async fn list_default_cap_and_uncapped_limit() {
    let store: InMemoryEntityStore<Student> = InMemoryEntityStore::new(IdSequence::default(), 2);
    for name in ["a", "b", "c"] {
        store.create(student(name, "actif")).await.unwrap();
    }

    assert_eq!(store.list(&ListQuery::default()).await.len(), 2);
    assert_eq!(store.list(&ListQuery::default().with_limit(0)).await.len(), 3);
    assert_eq!(store.list(&ListQuery::default().with_limit(1)).await.len(), 1);
}

#[tokio::test]
async fn create_from_fields_drops_caller_supplied_generated_fields() {
    let store = student_store();
    let created = store
        .create_from_fields(patch(json!({
            "id": "s-forged",
            "created_date": "1999-01-01T00:00:00Z",
            "updated_date": "1999-01-02T00:00:00Z",
            "first_name": "Rija",
            "status": "actif"
        })))
        .await
        .unwrap();

    assert_eq!(created.id, RecordId::new("1001"));
    assert!(created.created_date.timestamp() > 946_684_800);
    assert_eq!(created.updated_date, None);
    assert_eq!(created.fields.first_name.as_deref(), Some("Rija"));
}

#[tokio::test]
async fn create_from_fields_rejects_wrong_shapes() {
    let store = student_store();
    let err = store
        .create_from_fields(patch(json!({"first_name": 42})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFields { .. }));
    assert!(store.is_empty());
}

#[test]
fn seed_with_duplicate_ids_is_rejected() {
    let now = Utc::now();
    let seed = vec![
        Record::new(RecordId::new("s1"), now, student("A", "actif")),
        Record::new(RecordId::new("s1"), now, student("B", "actif")),
    ];
    let result = InMemoryEntityStore::with_seed(IdSequence::default(), 1000, seed);
    assert!(matches!(result, Err(StoreError::InvalidFields { .. })));
}

#[tokio::test]
async fn deleting_student_leaves_dangling_enrollment() {
    let datastore = Datastore::new(&StoreConfig::default());

    let student_a = datastore
        .students
        .create(student("A", "actif"))
        .await
        .unwrap();
    let enrollment = datastore
        .enrollments
        .create(Enrollment {
            student_id: Some(student_a.id.clone()),
            session_id: Some(RecordId::new("se1")),
            status: Some("actif".to_string()),
            ..Enrollment::default()
        })
        .await
        .unwrap();

    datastore.students.delete(&student_a.id).await.unwrap();

    let enrollments = datastore.enrollments.dump();
    assert_eq!(enrollments, vec![enrollment]);
    assert_eq!(enrollments[0].fields.student_id, Some(student_a.id.clone()));
    assert!(datastore.students.get(&student_a.id).await.is_none());
}

#[tokio::test]
async fn blank_form_dates_are_stored_as_unset() {
    let datastore = Datastore::new(&StoreConfig::default());

    let announcement = datastore
        .announcements
        .create_from_fields(patch(json!({
            "title": "Rentrée",
            "content": "Ouverture des inscriptions",
            "type": "information",
            "target_audience": "tous",
            "published": true,
            "publish_date": "2025-09-01",
            "expiry_date": ""
        })))
        .await
        .unwrap();
    assert_eq!(announcement.fields.expiry_date, None);
    assert_eq!(
        announcement.fields.publish_date,
        NaiveDate::from_ymd_opt(2025, 9, 1)
    );

    let session = datastore
        .sessions
        .create_from_fields(patch(json!({
            "module_id": "m1",
            "start_date": "",
            "end_date": "  ",
            "room": "Salle B"
        })))
        .await
        .unwrap();
    assert_eq!(
        session.fields,
        Session {
            module_id: Some(RecordId::new("m1")),
            room: Some("Salle B".to_string()),
            ..Session::default()
        }
    );

    let updated = datastore
        .announcements
        .update(&announcement.id, patch(json!({"publish_date": ""})))
        .await
        .unwrap();
    assert_eq!(updated.fields.publish_date, None);
    assert!(updated.updated_date.is_some());
}

#[tokio::test]
async fn unknown_patch_keys_are_rejected_without_stamping() {
    let store = student_store();
    let created = store.create(student("Rija", "actif")).await.unwrap();

    let err = store
        .update(&created.id, patch(json!({"statut": "inactif"})))
        .await
        .unwrap_err();
    match &err {
        StoreError::InvalidFields { entity, message } => {
            assert_eq!(*entity, "student");
            assert!(message.contains("statut"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = store.get(&created.id).await.unwrap();
    assert_eq!(stored.updated_date, None);
    assert_eq!(stored.fields.status.as_deref(), Some("actif"));

    let create_err = store
        .create_from_fields(patch(json!({"first_name": "Hery", "nickname": "H"})))
        .await
        .unwrap_err();
    assert!(matches!(create_err, StoreError::InvalidFields { .. }));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn filter_does_not_match_fields_left_unset() {
    let store: InMemoryEntityStore<Announcement> =
        InMemoryEntityStore::new(IdSequence::default(), 1000);
    let with_type = store
        .create(Announcement {
            title: Some("Urgent".to_string()),
            kind: Some("urgent".to_string()),
            ..Announcement::default()
        })
        .await
        .unwrap();
    store
        .create(Announcement {
            title: Some("Sans type".to_string()),
            ..Announcement::default()
        })
        .await
        .unwrap();

    let urgent = store
        .filter(&FilterCriteria::new().with("type", "urgent"))
        .await;
    assert_eq!(urgent, vec![with_type]);

    let empty_type = store.filter(&FilterCriteria::new().with("type", "")).await;
    assert!(empty_type.is_empty());
}
