//! Enrollment pricing and tuition progress.
//!
//! Tuition is resolved by walking session -> module -> formation; any missing
//! hop prices the session at 0.

use crate::datastore::Datastore;
use crate::model::entities::{Enrollment, Formation, Module, Session};
use crate::model::record::{Record, RecordId};
use crate::repo::entity_store::EntityStore;
use crate::service::{ServiceError, ServiceResult};
use log::info;

const ACTIVE_STATUS: &str = "actif";

/// Tuition settled so far for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuitionProgress {
    /// Percent of `total_amount` paid, 0 when the total is unknown or 0.
    pub percentage_paid: f64,
    pub remaining: f64,
}

pub struct EnrollmentService<'a> {
    enrollments: &'a dyn EntityStore<Enrollment>,
    sessions: &'a dyn EntityStore<Session>,
    modules: &'a dyn EntityStore<Module>,
    formations: &'a dyn EntityStore<Formation>,
}

impl<'a> EnrollmentService<'a> {
    pub fn new(
        enrollments: &'a dyn EntityStore<Enrollment>,
        sessions: &'a dyn EntityStore<Session>,
        modules: &'a dyn EntityStore<Module>,
        formations: &'a dyn EntityStore<Formation>,
    ) -> Self {
        Self {
            enrollments,
            sessions,
            modules,
            formations,
        }
    }

    pub fn from_datastore(datastore: &'a Datastore) -> Self {
        Self::new(
            &datastore.enrollments,
            &datastore.sessions,
            &datastore.modules,
            &datastore.formations,
        )
    }

    /// Formation price for a session, 0 when any link is missing.
    pub async fn formation_price_for_session(&self, session_id: &RecordId) -> f64 {
        let Some(session) = self.sessions.get(session_id).await else {
            return 0.0;
        };
        let Some(module_id) = session.fields.module_id.as_ref() else {
            return 0.0;
        };
        let Some(module) = self.modules.get(module_id).await else {
            return 0.0;
        };
        let Some(formation_id) = module.fields.formation_id.as_ref() else {
            return 0.0;
        };
        self.formations
            .get(formation_id)
            .await
            .and_then(|formation| formation.fields.price)
            .unwrap_or(0.0)
    }

    /// Enrolls a student in a session, pricing the enrollment from the
    /// session's formation.
    ///
    /// The student id is stored as given; only the session must exist.
    ///
    /// # Errors
    /// - `SessionNotFound` for an unknown session.
    /// - `InvalidAmount` for a negative or non-finite `paid_amount`.
    /// - `AmountExceedsTuition` when a priced session is overpaid.
    pub async fn enroll(
        &self,
        student_id: &RecordId,
        session_id: &RecordId,
        paid_amount: f64,
    ) -> ServiceResult<Record<Enrollment>> {
        if self.sessions.get(session_id).await.is_none() {
            return Err(ServiceError::SessionNotFound(session_id.clone()));
        }
        if !paid_amount.is_finite() || paid_amount < 0.0 {
            return Err(ServiceError::InvalidAmount(paid_amount));
        }

        let total_amount = self.formation_price_for_session(session_id).await;
        if total_amount > 0.0 && paid_amount > total_amount {
            return Err(ServiceError::AmountExceedsTuition {
                amount: paid_amount,
                total_amount,
            });
        }
        let enrollment = self
            .enrollments
            .create(Enrollment {
                student_id: Some(student_id.clone()),
                session_id: Some(session_id.clone()),
                status: Some(ACTIVE_STATUS.to_string()),
                paid_amount: Some(paid_amount),
                total_amount: Some(total_amount),
                notes: None,
            })
            .await?;

        info!(
            "event=student_enrolled module=enrollment status=ok enrollment_id={} session_id={}",
            enrollment.id, session_id
        );
        Ok(enrollment)
    }
}

pub fn tuition_progress(enrollment: &Enrollment) -> TuitionProgress {
    let total = enrollment.total_amount.unwrap_or(0.0);
    let paid = enrollment.paid_amount.unwrap_or(0.0);
    let percentage_paid = if total > 0.0 { paid / total * 100.0 } else { 0.0 };
    TuitionProgress {
        percentage_paid,
        remaining: total - paid,
    }
}

#[cfg(test)]
mod tests {
    use super::tuition_progress;
    use crate::model::entities::Enrollment;

    #[test]
    fn progress_handles_missing_total() {
        let progress = tuition_progress(&Enrollment::default());
        assert_eq!(progress.percentage_paid, 0.0);
        assert_eq!(progress.remaining, 0.0);
    }

    #[test]
    fn progress_reports_percentage_and_remaining() {
        let enrollment = Enrollment {
            paid_amount: Some(50_000.0),
            total_amount: Some(200_000.0),
            ..Enrollment::default()
        };
        let progress = tuition_progress(&enrollment);
        assert_eq!(progress.percentage_paid, 25.0);
        assert_eq!(progress.remaining, 150_000.0);
    }
}
