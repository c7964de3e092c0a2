//! Grade aggregation.
//!
//! Averages are expressed on a /20 scale regardless of each evaluation's
//! `max_value`. The module view walks module -> sessions -> enrollments ->
//! grades.

use crate::datastore::Datastore;
use crate::model::entities::{Enrollment, Grade, Session, Student};
use crate::model::record::RecordId;
use crate::repo::entity_store::{EntityStore, ListQuery};
use crate::repo::filter::FilterCriteria;
use std::collections::HashSet;

const GRADE_SCALE: f64 = 20.0;

/// Bucket of a /20 average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    /// >= 16
    Excellent,
    /// >= 14
    VeryGood,
    /// >= 12
    Good,
    /// >= 10
    Pass,
    Insufficient,
}

impl GradeBand {
    pub fn for_average(average: f64) -> Self {
        if average >= 16.0 {
            Self::Excellent
        } else if average >= 14.0 {
            Self::VeryGood
        } else if average >= 12.0 {
            Self::Good
        } else if average >= 10.0 {
            Self::Pass
        } else {
            Self::Insufficient
        }
    }

    /// Label shown on grade sheets.
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Très Bien",
            Self::Good => "Bien",
            Self::Pass => "Passable",
            Self::Insufficient => "Insuffisant",
        }
    }
}

/// One enrollment's line in the per-module grade view.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleGradeRow {
    pub enrollment_id: RecordId,
    pub student_id: Option<RecordId>,
    /// `None` when the student is unknown or has no name.
    pub student_name: Option<String>,
    pub grades: Vec<Grade>,
    /// `None` without usable grades.
    pub average: Option<f64>,
    pub band: Option<GradeBand>,
}

pub struct GradeService<'a> {
    grades: &'a dyn EntityStore<Grade>,
    sessions: &'a dyn EntityStore<Session>,
    enrollments: &'a dyn EntityStore<Enrollment>,
    students: &'a dyn EntityStore<Student>,
}

impl<'a> GradeService<'a> {
    pub fn new(
        grades: &'a dyn EntityStore<Grade>,
        sessions: &'a dyn EntityStore<Session>,
        enrollments: &'a dyn EntityStore<Enrollment>,
        students: &'a dyn EntityStore<Student>,
    ) -> Self {
        Self {
            grades,
            sessions,
            enrollments,
            students,
        }
    }

    pub fn from_datastore(datastore: &'a Datastore) -> Self {
        Self::new(
            &datastore.grades,
            &datastore.sessions,
            &datastore.enrollments,
            &datastore.students,
        )
    }

    pub async fn grades_for_enrollment(&self, enrollment_id: &RecordId) -> Vec<Grade> {
        self.grades
            .filter(&FilterCriteria::new().with("enrollment_id", enrollment_id.as_str()))
            .await
            .into_iter()
            .map(|record| record.fields)
            .collect()
    }

    /// Weighted /20 average for one enrollment, `None` without usable grades.
    pub async fn average_for_enrollment(&self, enrollment_id: &RecordId) -> Option<f64> {
        weighted_average(&self.grades_for_enrollment(enrollment_id).await)
    }

    /// Average and band for every enrollment in a session of `module_id`,
    /// in enrollment insertion order. Enrollments without grades are listed
    /// with no average.
    pub async fn averages_for_module(&self, module_id: &RecordId) -> Vec<ModuleGradeRow> {
        let session_ids: HashSet<RecordId> = self
            .sessions
            .filter(&FilterCriteria::new().with("module_id", module_id.as_str()))
            .await
            .into_iter()
            .map(|session| session.id)
            .collect();
        if session_ids.is_empty() {
            return Vec::new();
        }

        let enrollments = self
            .enrollments
            .list(&ListQuery::default().with_limit(0))
            .await
            .into_iter()
            .filter(|enrollment| {
                enrollment
                    .fields
                    .session_id
                    .as_ref()
                    .is_some_and(|id| session_ids.contains(id))
            });

        let mut rows = Vec::new();
        for enrollment in enrollments {
            let student_name = match enrollment.fields.student_id.as_ref() {
                Some(student_id) => self
                    .students
                    .get(student_id)
                    .await
                    .and_then(|student| student.fields.full_name()),
                None => None,
            };
            let grades = self.grades_for_enrollment(&enrollment.id).await;
            let average = weighted_average(&grades);
            rows.push(ModuleGradeRow {
                enrollment_id: enrollment.id,
                student_id: enrollment.fields.student_id,
                student_name,
                grades,
                average,
                band: average.map(GradeBand::for_average),
            });
        }
        rows
    }
}

/// `Σ(value / max_value · 20 · weight) / Σweight`, weight defaulting to 1.
///
/// Grades without a value or a positive `max_value` are skipped.
pub fn weighted_average(grades: &[Grade]) -> Option<f64> {
    let (total, total_weight) = grades
        .iter()
        .filter_map(|grade| match (grade.value, grade.max_value) {
            (Some(value), Some(max)) if max > 0.0 => {
                let weight = grade.weight.unwrap_or(1.0);
                Some((value / max * GRADE_SCALE * weight, weight))
            }
            _ => None,
        })
        .fold((0.0, 0.0), |(sum, weights), (weighted, weight)| {
            (sum + weighted, weights + weight)
        });

    if total_weight > 0.0 {
        Some(total / total_weight)
    } else {
        None
    }
}
