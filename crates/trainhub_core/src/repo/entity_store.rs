//! Entity store contract and in-memory implementation.
//!
//! # Responsibility
//! - Provide one uniform async CRUD API per collection.
//! - Own the backing collection; hand out copies only.
//! - Validate caller payloads into typed records at the boundary.
//!
//! # Invariants
//! - `id` is unique within the datastore and never reused after deletion.
//! - `created_date` is set once; `updated_date` is stamped on every update.
//! - `update`/`delete` on an unknown id fail with `NotFound` and leave the
//!   collection untouched.
//! - Deletion never cascades to records in other collections.

use crate::model::record::{strip_reserved, Entity, FieldMap, Record, RecordId};
use crate::repo::filter::FilterCriteria;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default `list` cap applied when the caller passes no limit.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Last id issued before any record is created.
pub const DEFAULT_ID_SEED: u64 = 1000;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No record with this id exists in the collection.
    NotFound { entity: &'static str, id: RecordId },
    /// Payload does not deserialize into the collection's field shape, or
    /// fails its cross-field checks.
    InvalidFields {
        entity: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidFields { entity, message } => {
                write!(f, "invalid {entity} fields: {message}")
            }
        }
    }
}

impl Error for StoreError {}

/// `list` ordering. Anything else keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `created_date`
    CreatedAscending,
    /// `-created_date`
    CreatedDescending,
}

impl SortOrder {
    /// Parses a sort key; unsupported keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "created_date" => Some(Self::CreatedAscending),
            "-created_date" => Some(Self::CreatedDescending),
            _ => None,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::CreatedAscending => "created_date",
            Self::CreatedDescending => "-created_date",
        }
    }
}

/// Options for `EntityStore::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: Option<SortOrder>,
    /// `None` applies the store default cap; `Some(0)` disables the cap.
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Query sorted by a raw key such as `"-created_date"`.
    pub fn sorted_by(key: &str) -> Self {
        Self {
            sort: SortOrder::from_key(key),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Resolves the effective cap for one `list` call.
pub fn normalize_list_limit(limit: Option<usize>, default_limit: usize) -> Option<usize> {
    match limit {
        Some(0) => None,
        Some(value) => Some(value),
        None if default_limit == 0 => None,
        None => Some(default_limit),
    }
}

/// Monotonic id source shared by every store of one datastore.
#[derive(Debug, Clone)]
pub struct IdSequence {
    last_issued: Arc<AtomicU64>,
}

impl IdSequence {
    /// Sequence whose first generated id is `last_issued + 1`.
    pub fn starting_after(last_issued: u64) -> Self {
        Self {
            last_issued: Arc::new(AtomicU64::new(last_issued)),
        }
    }

    pub fn next_id(&self) -> RecordId {
        let value = self.last_issued.fetch_add(1, Ordering::SeqCst) + 1;
        RecordId::new(value.to_string())
    }

    /// Bumps the counter past an externally supplied numeric id so it is
    /// never generated again.
    pub fn observe(&self, id: &RecordId) {
        if let Some(value) = id.numeric() {
            self.last_issued.fetch_max(value, Ordering::SeqCst);
        }
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued.load(Ordering::SeqCst)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::starting_after(DEFAULT_ID_SEED)
    }
}

/// Async CRUD contract for one collection.
///
/// Every accessor returns owned copies. Async signatures let a remote
/// implementation replace the in-memory one without touching call sites.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Vec<Record<T>>;

    async fn filter(&self, criteria: &FilterCriteria) -> Vec<Record<T>>;

    async fn get(&self, id: &RecordId) -> Option<Record<T>>;

    /// Appends a new record with generated `id` and `created_date`.
    async fn create(&self, fields: T) -> StoreResult<Record<T>>;

    /// Shallow-merges `patch` over the stored fields and stamps
    /// `updated_date`.
    async fn update(&self, id: &RecordId, patch: FieldMap) -> StoreResult<Record<T>>;

    /// Removes the record and returns its last state.
    async fn delete(&self, id: &RecordId) -> StoreResult<Record<T>>;

    /// Synchronous copy of the whole collection.
    fn dump(&self) -> Vec<Record<T>>;

    /// Creates a record from an untyped payload.
    ///
    /// Store-owned keys in `fields` are dropped, so generated values always
    /// win.
    async fn create_from_fields(&self, fields: FieldMap) -> StoreResult<Record<T>> {
        let fields = decode_fields::<T>(strip_reserved(fields))?;
        self.create(fields).await
    }
}

/// Decodes a field map into `T` and runs its cross-field checks.
pub fn decode_fields<T: Entity>(fields: FieldMap) -> StoreResult<T> {
    let decoded: T = serde_json::from_value(serde_json::Value::Object(fields)).map_err(|err| {
        StoreError::InvalidFields {
            entity: T::NAME,
            message: err.to_string(),
        }
    })?;
    validate_fields(&decoded)?;
    Ok(decoded)
}

fn validate_fields<T: Entity>(fields: &T) -> StoreResult<()> {
    fields.validate().map_err(|message| StoreError::InvalidFields {
        entity: T::NAME,
        message,
    })
}

fn encode_fields<T: Entity>(fields: &T) -> StoreResult<FieldMap> {
    match serde_json::to_value(fields) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidFields {
            entity: T::NAME,
            message: format!("expected an object, got `{other}`"),
        }),
        Err(err) => Err(StoreError::InvalidFields {
            entity: T::NAME,
            message: err.to_string(),
        }),
    }
}

/// Process-local collection backed by a `Vec` in insertion order.
pub struct InMemoryEntityStore<T> {
    records: RwLock<Vec<Record<T>>>,
    ids: IdSequence,
    default_limit: usize,
}

impl<T: Entity> InMemoryEntityStore<T> {
    pub fn new(ids: IdSequence, default_limit: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            ids,
            default_limit,
        }
    }

    /// Builds a store pre-filled with `seed`, keeping seed ids and dates.
    ///
    /// # Errors
    /// - `InvalidFields` when two seed records share an id or a seed record
    ///   fails its field checks.
    pub fn with_seed(
        ids: IdSequence,
        default_limit: usize,
        seed: Vec<Record<T>>,
    ) -> StoreResult<Self> {
        let mut seen = HashSet::new();
        for record in &seed {
            if !seen.insert(record.id.clone()) {
                return Err(StoreError::InvalidFields {
                    entity: T::NAME,
                    message: format!("duplicate seed id `{}`", record.id),
                });
            }
            validate_fields(&record.fields)?;
            ids.observe(&record.id);
        }

        Ok(Self {
            records: RwLock::new(seed),
            ids,
            default_limit,
        })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Record<T>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record<T>>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(id: &RecordId, operation: &str) -> StoreError {
        warn!(
            "event=record_{operation} module=store status=not_found entity={} id={}",
            T::NAME,
            id
        );
        StoreError::NotFound {
            entity: T::NAME,
            id: id.clone(),
        }
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryEntityStore<T> {
    async fn list(&self, query: &ListQuery) -> Vec<Record<T>> {
        let mut records = self.read().clone();

        match query.sort {
            Some(SortOrder::CreatedAscending) => {
                records.sort_by(|a, b| a.created_date.cmp(&b.created_date));
            }
            Some(SortOrder::CreatedDescending) => {
                records.sort_by(|a, b| b.created_date.cmp(&a.created_date));
            }
            None => {}
        }

        if let Some(limit) = normalize_list_limit(query.limit, self.default_limit) {
            records.truncate(limit);
        }

        records
    }

    async fn filter(&self, criteria: &FilterCriteria) -> Vec<Record<T>> {
        self.read()
            .iter()
            .filter(|record| criteria.matches(&record.to_field_map()))
            .cloned()
            .collect()
    }

    async fn get(&self, id: &RecordId) -> Option<Record<T>> {
        self.read().iter().find(|record| &record.id == id).cloned()
    }

    async fn create(&self, fields: T) -> StoreResult<Record<T>> {
        validate_fields(&fields)?;

        let record = Record::new(self.ids.next_id(), Utc::now(), fields);
        self.write().push(record.clone());

        debug!(
            "event=record_create module=store status=ok entity={} id={}",
            T::NAME,
            record.id
        );
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: FieldMap) -> StoreResult<Record<T>> {
        let mut records = self.write();
        let Some(slot) = records.iter_mut().find(|record| &record.id == id) else {
            return Err(Self::not_found(id, "update"));
        };

        let mut merged = encode_fields(&slot.fields)?;
        merged.extend(strip_reserved(patch));
        let fields = decode_fields::<T>(merged)?;

        slot.fields = fields;
        slot.updated_date = Some(Utc::now());

        debug!(
            "event=record_update module=store status=ok entity={} id={}",
            T::NAME,
            id
        );
        Ok(slot.clone())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<Record<T>> {
        let mut records = self.write();
        let Some(index) = records.iter().position(|record| &record.id == id) else {
            return Err(Self::not_found(id, "delete"));
        };

        let removed = records.remove(index);
        debug!(
            "event=record_delete module=store status=ok entity={} id={}",
            T::NAME,
            id
        );
        Ok(removed)
    }

    fn dump(&self) -> Vec<Record<T>> {
        self.read().clone()
    }
}
