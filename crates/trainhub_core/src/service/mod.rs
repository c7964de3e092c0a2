//! Use-case services over entity stores.
//!
//! # Responsibility
//! - Orchestrate multi-collection workflows (payments, attendance sheets,
//!   certificates) behind small APIs.
//! - Keep callers decoupled from store details.
//!
//! # Invariants
//! - Services never bypass store validation.
//! - Domain rejections are reported before any collection is mutated.

pub mod attendance_service;
pub mod certificate_service;
pub mod enrollment_service;
pub mod grade_service;
pub mod payment_service;

use crate::model::record::RecordId;
use crate::repo::entity_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for use-case workflows.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Store-layer failure.
    Store(StoreError),
    /// Payment amount is zero, negative or not a finite number.
    InvalidAmount(f64),
    /// A single payment may not exceed the invoice total.
    AmountExceedsInvoice { amount: f64, invoice_amount: f64 },
    /// Amount paid at enrollment may not exceed the formation price.
    AmountExceedsTuition { amount: f64, total_amount: f64 },
    InvoiceNotFound(RecordId),
    EnrollmentNotFound(RecordId),
    SessionNotFound(RecordId),
    /// A required request field is empty.
    MissingField(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidAmount(amount) => write!(f, "invalid amount: {amount}"),
            Self::AmountExceedsInvoice {
                amount,
                invoice_amount,
            } => write!(
                f,
                "payment amount {amount} exceeds invoice total {invoice_amount}"
            ),
            Self::AmountExceedsTuition {
                amount,
                total_amount,
            } => write!(
                f,
                "paid amount {amount} exceeds tuition total {total_amount}"
            ),
            Self::InvoiceNotFound(id) => write!(f, "invoice not found: {id}"),
            Self::EnrollmentNotFound(id) => write!(f, "enrollment not found: {id}"),
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Single-key patch helper for status-style updates.
pub(crate) fn patch_one(
    field: &str,
    value: impl serde::Serialize,
) -> Result<crate::model::record::FieldMap, StoreError> {
    let value = serde_json::to_value(value).map_err(|err| StoreError::InvalidFields {
        entity: "patch",
        message: err.to_string(),
    })?;
    let mut patch = crate::model::record::FieldMap::new();
    patch.insert(field.to_string(), value);
    Ok(patch)
}
