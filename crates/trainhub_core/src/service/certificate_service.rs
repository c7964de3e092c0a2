//! Certificate issuance and public verification.
//!
//! # Responsibility
//! - Issue a certificate for an existing enrollment with generated numbers.
//! - Resolve a verification code back to its certificate and student.
//!
//! # Invariants
//! - Certificate numbers follow `CERT-<epoch ms>-<6 uppercase chars>`.
//! - Verification codes are 10 uppercase alphanumeric characters; lookups are
//!   case-insensitive.

use crate::datastore::Datastore;
use crate::model::entities::{Certificate, Enrollment, Student};
use crate::model::record::{Record, RecordId};
use crate::repo::entity_store::EntityStore;
use crate::repo::filter::FilterCriteria;
use crate::service::{ServiceError, ServiceResult};
use chrono::{NaiveDate, Utc};
use log::info;
use uuid::Uuid;

const CERTIFICATE_SUFFIX_LEN: usize = 6;
const VERIFICATION_CODE_LEN: usize = 10;
const ACTIVE_STATUS: &str = "actif";

#[derive(Debug, Clone, PartialEq)]
pub struct IssueCertificateRequest {
    pub enrollment_id: RecordId,
    pub formation_title: String,
    pub grade: Option<f64>,
    pub attendance_rate: Option<f64>,
    pub completion_date: Option<NaiveDate>,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCertificate {
    pub certificate: Record<Certificate>,
    /// `None` when the student record has since been deleted.
    pub student: Option<Record<Student>>,
}

pub struct CertificateService<'a> {
    certificates: &'a dyn EntityStore<Certificate>,
    enrollments: &'a dyn EntityStore<Enrollment>,
    students: &'a dyn EntityStore<Student>,
}

impl<'a> CertificateService<'a> {
    pub fn new(
        certificates: &'a dyn EntityStore<Certificate>,
        enrollments: &'a dyn EntityStore<Enrollment>,
        students: &'a dyn EntityStore<Student>,
    ) -> Self {
        Self {
            certificates,
            enrollments,
            students,
        }
    }

    pub fn from_datastore(datastore: &'a Datastore) -> Self {
        Self::new(
            &datastore.certificates,
            &datastore.enrollments,
            &datastore.students,
        )
    }

    /// Issues a certificate for `request.enrollment_id`.
    ///
    /// # Errors
    /// - `MissingField("formation_title")` for a blank title.
    /// - `EnrollmentNotFound` when the enrollment does not exist.
    pub async fn issue(&self, request: IssueCertificateRequest) -> ServiceResult<Record<Certificate>> {
        let formation_title = request.formation_title.trim();
        if formation_title.is_empty() {
            return Err(ServiceError::MissingField("formation_title"));
        }

        let enrollment = self
            .enrollments
            .get(&request.enrollment_id)
            .await
            .ok_or_else(|| ServiceError::EnrollmentNotFound(request.enrollment_id.clone()))?;

        let now = Utc::now();
        let certificate = self
            .certificates
            .create(Certificate {
                student_id: enrollment.fields.student_id.clone(),
                enrollment_id: Some(enrollment.id.clone()),
                formation_title: Some(formation_title.to_string()),
                certificate_number: Some(format!(
                    "CERT-{}-{}",
                    now.timestamp_millis(),
                    random_code(CERTIFICATE_SUFFIX_LEN)
                )),
                verification_code: Some(random_code(VERIFICATION_CODE_LEN)),
                issue_date: Some(now.date_naive()),
                completion_date: request.completion_date,
                grade: request.grade,
                attendance_rate: request.attendance_rate,
                status: Some(ACTIVE_STATUS.to_string()),
            })
            .await?;

        info!(
            "event=certificate_issued module=certificate status=ok certificate_id={} enrollment_id={}",
            certificate.id, enrollment.id
        );
        Ok(certificate)
    }

    /// Looks up a certificate by verification code, ignoring case and
    /// surrounding whitespace.
    pub async fn verify(&self, code: &str) -> Option<VerifiedCertificate> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return None;
        }

        let certificate = self
            .certificates
            .filter(&FilterCriteria::new().with("verification_code", code))
            .await
            .into_iter()
            .next()?;

        let student = match certificate.fields.student_id.as_ref() {
            Some(student_id) => self.students.get(student_id).await,
            None => None,
        };
        Some(VerifiedCertificate {
            certificate,
            student,
        })
    }
}

/// Uppercase alphanumeric code of `len` characters (max 32).
fn random_code(len: usize) -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(len)
        .collect()
}
