//! Store layer: the per-collection CRUD contract and its in-memory backing.
//!
//! # Responsibility
//! - Define the async data access contract consumed by services and callers.
//! - Keep collection mutation details behind that contract.
//!
//! # Invariants
//! - Writes validate payloads into typed records before touching a collection.
//! - Store APIs return semantic errors (`NotFound`, `InvalidFields`), never
//!   silent no-ops.

pub mod entity_store;
pub mod filter;
