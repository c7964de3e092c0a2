//! Datastore bootstrap: one entity store per collection, built explicitly.
//!
//! # Responsibility
//! - Instantiate every collection once, sharing one id sequence.
//! - Load the example data on request.
//!
//! # Invariants
//! - Generated ids are unique across all collections of one datastore.
//! - Seed ids never collide with generated ids.
//! - Nothing here enforces references between collections; deleting a
//!   parent leaves dependents pointing at a missing id.

mod seed;

use crate::config::StoreConfig;
use crate::model::entities::{
    Announcement, Attendance, Category, Certificate, Enrollment, Formation, Grade, Invoice,
    Module, Payment, Session, Student, Teacher,
};
use crate::model::record::{Entity, Timestamp};
use crate::repo::entity_store::{IdSequence, InMemoryEntityStore, StoreResult};
use chrono::Utc;
use log::info;
use serde_json::Value;

/// All training-center collections of one application instance.
///
/// Construct once at startup and hand out by reference (or `Arc`).
pub struct Datastore {
    ids: IdSequence,
    pub categories: InMemoryEntityStore<Category>,
    pub formations: InMemoryEntityStore<Formation>,
    pub modules: InMemoryEntityStore<Module>,
    pub sessions: InMemoryEntityStore<Session>,
    pub teachers: InMemoryEntityStore<Teacher>,
    pub students: InMemoryEntityStore<Student>,
    pub enrollments: InMemoryEntityStore<Enrollment>,
    pub invoices: InMemoryEntityStore<Invoice>,
    pub payments: InMemoryEntityStore<Payment>,
    pub attendances: InMemoryEntityStore<Attendance>,
    pub grades: InMemoryEntityStore<Grade>,
    pub certificates: InMemoryEntityStore<Certificate>,
    pub announcements: InMemoryEntityStore<Announcement>,
}

impl Datastore {
    /// Empty datastore.
    pub fn new(config: &StoreConfig) -> Self {
        let ids = IdSequence::starting_after(config.id_seed);
        let limit = config.list_limit;
        Self {
            categories: InMemoryEntityStore::new(ids.clone(), limit),
            formations: InMemoryEntityStore::new(ids.clone(), limit),
            modules: InMemoryEntityStore::new(ids.clone(), limit),
            sessions: InMemoryEntityStore::new(ids.clone(), limit),
            teachers: InMemoryEntityStore::new(ids.clone(), limit),
            students: InMemoryEntityStore::new(ids.clone(), limit),
            enrollments: InMemoryEntityStore::new(ids.clone(), limit),
            invoices: InMemoryEntityStore::new(ids.clone(), limit),
            payments: InMemoryEntityStore::new(ids.clone(), limit),
            attendances: InMemoryEntityStore::new(ids.clone(), limit),
            grades: InMemoryEntityStore::new(ids.clone(), limit),
            certificates: InMemoryEntityStore::new(ids.clone(), limit),
            announcements: InMemoryEntityStore::new(ids.clone(), limit),
            ids,
        }
    }

    /// Datastore pre-filled with the example catalog, one student and one
    /// paid enrollment.
    ///
    /// # Errors
    /// - `InvalidFields` if a seed row does not decode (programming error).
    pub fn seeded(config: &StoreConfig) -> StoreResult<Self> {
        let now = Utc::now();
        let ids = IdSequence::starting_after(config.id_seed);
        let limit = config.list_limit;

        let datastore = Self {
            categories: seeded_store(&ids, limit, seed::categories(), now)?,
            formations: seeded_store(&ids, limit, seed::formations(), now)?,
            modules: seeded_store(&ids, limit, seed::modules(), now)?,
            sessions: seeded_store(&ids, limit, seed::sessions(), now)?,
            teachers: seeded_store(&ids, limit, seed::teachers(), now)?,
            students: seeded_store(&ids, limit, seed::students(), now)?,
            enrollments: seeded_store(&ids, limit, seed::enrollments(), now)?,
            invoices: seeded_store(&ids, limit, seed::invoices(), now)?,
            payments: InMemoryEntityStore::new(ids.clone(), limit),
            attendances: InMemoryEntityStore::new(ids.clone(), limit),
            grades: InMemoryEntityStore::new(ids.clone(), limit),
            certificates: InMemoryEntityStore::new(ids.clone(), limit),
            announcements: InMemoryEntityStore::new(ids.clone(), limit),
            ids,
        };

        info!(
            "event=datastore_seeded module=datastore status=ok records={} next_id={}",
            datastore.counts().iter().map(|(_, n)| n).sum::<usize>(),
            datastore.ids.last_issued() + 1
        );
        Ok(datastore)
    }

    /// Shared id sequence (exposed for diagnostics).
    pub fn ids(&self) -> &IdSequence {
        &self.ids
    }

    /// `(collection, record count)` for every collection.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (Category::NAME, self.categories.len()),
            (Formation::NAME, self.formations.len()),
            (Module::NAME, self.modules.len()),
            (Session::NAME, self.sessions.len()),
            (Teacher::NAME, self.teachers.len()),
            (Student::NAME, self.students.len()),
            (Enrollment::NAME, self.enrollments.len()),
            (Invoice::NAME, self.invoices.len()),
            (Payment::NAME, self.payments.len()),
            (Attendance::NAME, self.attendances.len()),
            (Grade::NAME, self.grades.len()),
            (Certificate::NAME, self.certificates.len()),
            (Announcement::NAME, self.announcements.len()),
        ]
    }
}

fn seeded_store<T: Entity>(
    ids: &IdSequence,
    limit: usize,
    rows: Value,
    created_date: Timestamp,
) -> StoreResult<InMemoryEntityStore<T>> {
    let records = seed::decode_seed::<T>(rows, created_date)?;
    InMemoryEntityStore::with_seed(ids.clone(), limit, records)
}
