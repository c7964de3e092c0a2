//! Example data loaded into a freshly seeded datastore.
//!
//! Rows are written as JSON documents and decoded through the same field
//! validation as caller payloads, so a malformed seed fails loudly at startup.

use crate::model::record::{Entity, Record, RecordId, Timestamp};
use crate::repo::entity_store::{decode_fields, StoreError, StoreResult};
use serde_json::{json, Value};

/// Decodes seed `rows` (objects carrying an `id`) into stored records.
pub(crate) fn decode_seed<T: Entity>(
    rows: Value,
    created_date: Timestamp,
) -> StoreResult<Vec<Record<T>>> {
    let Value::Array(rows) = rows else {
        return Err(invalid_seed::<T>("seed rows must be a JSON array"));
    };

    rows.into_iter()
        .map(|row| {
            let Value::Object(mut fields) = row else {
                return Err(invalid_seed::<T>("seed row must be a JSON object"));
            };
            let id = match fields.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => RecordId::new(id),
                _ => return Err(invalid_seed::<T>("seed row is missing a string `id`")),
            };
            let fields = decode_fields::<T>(fields)?;
            Ok(Record::new(id, created_date, fields))
        })
        .collect()
}

fn invalid_seed<T: Entity>(message: &str) -> StoreError {
    StoreError::InvalidFields {
        entity: T::NAME,
        message: message.to_string(),
    }
}

pub(crate) fn categories() -> Value {
    json!([
        { "id": "c1", "name": "Langue" },
        { "id": "c2", "name": "Bureautique" },
        { "id": "c3", "name": "Entrepreneuriat" }
    ])
}

pub(crate) fn formations() -> Value {
    json!([{
        "id": "f1",
        "category_id": "c2",
        "title": "Excel Avancé",
        "description": "Maîtriser les fonctions avancées d’Excel.",
        "duration_months": 2,
        "price": 150000,
        "type": "certifiante",
        "image_url": "",
        "prerequisites": "Connaissances Excel de base"
    }])
}

pub(crate) fn modules() -> Value {
    json!([
        {
            "id": "m1",
            "formation_id": "f1",
            "title": "Fonctions avancées",
            "description": "RechercheV, Index, Match...",
            "hours": 10
        },
        {
            "id": "m2",
            "formation_id": "f1",
            "title": "Tableaux croisés dynamiques",
            "description": "Analyse de données",
            "hours": 8
        }
    ])
}

pub(crate) fn sessions() -> Value {
    json!([{
        "id": "se1",
        "formation_id": "f1",
        "module_id": "m1",
        "teacher_id": "t1",
        "start_date": "2025-11-01",
        "end_date": "2025-11-30",
        "room": "Salle A",
        "status": "en cours"
    }])
}

pub(crate) fn teachers() -> Value {
    json!([{
        "id": "t1",
        "registration_number": "T-2024-001",
        "first_name": "Jean",
        "last_name": "Rabet",
        "email": "jean.rabet@example.com",
        "phone": "+261 34 12 345 67",
        "photo_url": "",
        "specialties": ["Excel", "Comptabilité"],
        "bio": "Formateur expérimenté.",
        "status": "actif",
        "hire_date": "2021-09-01",
        "hourly_rate": 15000,
        "availability": []
    }])
}

pub(crate) fn students() -> Value {
    json!([{
        "id": "s1",
        "registration_number": "ETU-2025-001",
        "first_name": "Rija",
        "last_name": "Rakoto",
        "date_of_birth": "2005-03-12",
        "gender": "Homme",
        "email": "rija@example.com",
        "phone_parent": "+261 34 11 222 33",
        "address": "Antananarivo",
        "status": "actif",
        "enrollment_date": "2025-09-01",
        "photo_url": ""
    }])
}

pub(crate) fn enrollments() -> Value {
    json!([
        { "id": "en1", "student_id": "s1", "session_id": "se1", "status": "actif" }
    ])
}

pub(crate) fn invoices() -> Value {
    json!([{
        "id": "inv1",
        "invoice_number": "FAC-001",
        "enrollment_id": "en1",
        "amount": 150000,
        "status": "payée",
        "due_date": "2025-11-15"
    }])
}
