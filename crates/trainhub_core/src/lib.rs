//! Core datastore for the training-center application.
//! This crate owns entity shapes, the store contract and the use-case rules.

pub mod config;
pub mod datastore;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use datastore::Datastore;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entities::{
    Announcement, Attendance, AttendanceStatus, Category, Certificate, Enrollment, Formation,
    Grade, Invoice, InvoiceStatus, Module, Payment, Session, Student, Teacher, TimeSlot,
};
pub use model::record::{Entity, FieldMap, Record, RecordId, Timestamp};
pub use repo::entity_store::{
    EntityStore, IdSequence, InMemoryEntityStore, ListQuery, SortOrder, StoreError, StoreResult,
};
pub use repo::filter::FilterCriteria;
pub use service::attendance_service::{attendance_stats, AttendanceService, AttendanceStats};
pub use service::certificate_service::{
    CertificateService, IssueCertificateRequest, VerifiedCertificate,
};
pub use service::enrollment_service::{tuition_progress, EnrollmentService, TuitionProgress};
pub use service::grade_service::{weighted_average, GradeBand, GradeService, ModuleGradeRow};
pub use service::payment_service::{
    settlement_status, InvoiceBalance, PaymentReceipt, PaymentRequest, PaymentService,
};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
