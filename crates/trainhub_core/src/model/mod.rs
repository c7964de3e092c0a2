//! Domain model for the training-center datastore.
//!
//! # Responsibility
//! - Define the record envelope every collection stores.
//! - Define one explicit payload type per collection.
//!
//! # Invariants
//! - Every stored object is identified by a `RecordId` unique within its
//!   datastore.
//! - Cross-entity references are never enforced here.

pub mod entities;
pub mod record;
