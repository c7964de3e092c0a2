//! Attendance sheet use-cases.
//!
//! # Responsibility
//! - Save a day's attendance sheet, one mark per enrollment.
//! - Summarize marks into presence statistics.
//!
//! # Invariants
//! - At most one attendance record exists per (enrollment, date) pair written
//!   through `save_sheet`; re-saving updates the existing mark.

use crate::datastore::Datastore;
use crate::model::entities::{Attendance, AttendanceStatus};
use crate::model::record::{Record, RecordId};
use crate::repo::entity_store::EntityStore;
use crate::repo::filter::FilterCriteria;
use crate::service::{patch_one, ServiceResult};
use chrono::NaiveDate;
use log::info;

/// Counts per mark plus the presence rate in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    /// `present / total * 100`, `0.0` when there are no marks.
    pub presence_rate: f64,
}

impl AttendanceStats {
    pub fn total(&self) -> usize {
        self.present + self.absent + self.late
    }
}

pub struct AttendanceService<'a> {
    attendances: &'a dyn EntityStore<Attendance>,
}

impl<'a> AttendanceService<'a> {
    pub fn new(attendances: &'a dyn EntityStore<Attendance>) -> Self {
        Self { attendances }
    }

    pub fn from_datastore(datastore: &'a Datastore) -> Self {
        Self::new(&datastore.attendances)
    }

    /// Marks recorded on `date`.
    pub async fn sheet_for(&self, date: NaiveDate) -> Vec<Record<Attendance>> {
        self.attendances
            .filter(&FilterCriteria::new().with("date", date.to_string()))
            .await
    }

    /// Upserts one mark per `(enrollment_id, status)` entry for `date`.
    pub async fn save_sheet(
        &self,
        date: NaiveDate,
        entries: &[(RecordId, AttendanceStatus)],
    ) -> ServiceResult<Vec<Record<Attendance>>> {
        let mut saved = Vec::with_capacity(entries.len());
        for (enrollment_id, status) in entries {
            let criteria = FilterCriteria::new()
                .with("enrollment_id", enrollment_id.as_str())
                .with("date", date.to_string());
            let existing = self.attendances.filter(&criteria).await.into_iter().next();

            let record = match existing {
                Some(record) => {
                    self.attendances
                        .update(&record.id, patch_one("status", status)?)
                        .await?
                }
                None => {
                    self.attendances
                        .create(Attendance {
                            enrollment_id: Some(enrollment_id.clone()),
                            date: Some(date),
                            status: Some(*status),
                            justification: None,
                        })
                        .await?
                }
            };
            saved.push(record);
        }

        info!(
            "event=attendance_sheet_saved module=attendance status=ok date={} marks={}",
            date,
            saved.len()
        );
        Ok(saved)
    }
}

/// Presence statistics over a set of marks. Unmarked records are ignored.
pub fn attendance_stats(records: &[Record<Attendance>]) -> AttendanceStats {
    let mut stats = AttendanceStats::default();
    for record in records {
        match record.fields.status {
            Some(AttendanceStatus::Present) => stats.present += 1,
            Some(AttendanceStatus::Absent) => stats.absent += 1,
            Some(AttendanceStatus::Late) => stats.late += 1,
            None => {}
        }
    }
    let total = stats.total();
    if total > 0 {
        stats.presence_rate = stats.present as f64 / total as f64 * 100.0;
    }
    stats
}
